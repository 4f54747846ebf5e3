//! Human-readable dump of the component/port tree. The generic hook the
//! out-of-scope trace/log sink collaborator attaches to; no sink is
//! implemented here.

use crate::ids::ComponentId;
use crate::world::World;
use std::fmt::Write as _;

impl World {
    /// Recursively dumps the component tree rooted at `root`, one line per
    /// component plus its master/slave port names.
    pub fn dump_component_tree(&self, root: ComponentId) -> String {
        let mut out = String::new();
        self.dump_component(root, 0, &mut out);
        out
    }

    fn dump_component(&self, id: ComponentId, depth: usize, out: &mut String) {
        let node = self.component(id);
        let indent = "  ".repeat(depth);
        let _ = writeln!(out, "{indent}{} ({})", node.name, node.path);

        let mut masters: Vec<&str> = node.master_ports.keys().map(String::as_str).collect();
        masters.sort_unstable();
        for name in masters {
            let _ = writeln!(out, "{indent}  master {name}");
        }

        let mut slaves: Vec<&str> = node.slave_ports.keys().map(String::as_str).collect();
        slaves.sort_unstable();
        for name in slaves {
            let _ = writeln!(out, "{indent}  slave {name}");
        }

        for &child in &node.children {
            self.dump_component(child, depth + 1, out);
        }
    }
}
