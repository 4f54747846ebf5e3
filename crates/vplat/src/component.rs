//! The component hierarchy: one node per simulated block, built by a loaded
//! model implementation.

use crate::config::ConfigNode;
use crate::error::{VpError, VpResult};
use crate::ids::ComponentId;
use crate::world::{ComponentNode, World};
use std::sync::Arc;

/// Lifecycle phase a component is in. Transitions only ever move forward;
/// see [`World::build_component`] and [`World::start_component`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Configured,
    Built,
    Bound,
    Started,
    Stopped,
}

/// Implemented by every model. Only `build` is required; the rest default
/// to no-ops so leaf peripherals that have nothing to do at a phase can
/// ignore it.
pub trait Component: Send {
    fn build(&mut self, world: &mut World, id: ComponentId) -> VpResult<()>;

    fn pre_start(&mut self, _world: &mut World, _id: ComponentId) -> VpResult<()> {
        Ok(())
    }

    fn start(&mut self, _world: &mut World, _id: ComponentId) -> VpResult<()> {
        Ok(())
    }

    /// Called on both the ambient top-down reset and on a reset driven
    /// through a [`crate::interface::ResetInterface`] (see
    /// [`World::reset_all`] for the arbitration rule between the two).
    fn reset(&mut self, _world: &mut World, _id: ComponentId, _active: bool) {}

    fn stop(&mut self, _world: &mut World, _id: ComponentId) {}

    fn flush(&mut self, _world: &mut World, _id: ComponentId) {}

    /// Extension point for the out-of-scope power-tracing subsystem; a
    /// model has nothing to report by default.
    fn power_hint(&mut self, _world: &World, _id: ComponentId) {}
}

impl World {
    /// Configures and constructs a child of `parent`. One-shot per name:
    /// calling this twice for the same `(parent, name)` pair is rejected as
    /// a duplicate child, mirroring the idempotence of `conf()` in the
    /// system this tree is modeled on.
    pub fn new_component(
        &mut self,
        parent: Option<ComponentId>,
        name: &str,
        config: ConfigNode,
        module: &str,
    ) -> VpResult<ComponentId> {
        let path = match parent {
            Some(p) => format!("{}/{name}", self.component(p).path),
            None => name.to_string(),
        };

        if let Some(p) = parent {
            if self.component(p).children_by_name.contains_key(name) {
                return Err(VpError::Assertion {
                    path: path.clone(),
                    message: format!("duplicate child '{name}'"),
                });
            }
        }

        let id = self.alloc_component(ComponentNode {
            name: name.to_string(),
            path: path.clone(),
            parent,
            children: Vec::new(),
            children_by_name: Default::default(),
            master_ports: Default::default(),
            slave_ports: Default::default(),
            virtual_ports: Default::default(),
            config: config.clone(),
            phase: Phase::Configured,
            reset_done_from_itf: false,
            registers: Vec::new(),
            clocks: Vec::new(),
        });

        if let Some(p) = parent {
            self.component_mut(p).children.push(id);
            self.component_mut(p)
                .children_by_name
                .insert(name.to_string(), id);
        }

        let model = self.loader.instantiate(module, id, &path, &config)?;
        self.models[id.index()] = Some(model);
        // Mirrors the recursive construction this tree is modeled on: a
        // component's own `build` runs as soon as it exists, and a
        // composite's `build` is what creates its children in turn.
        self.build_component(id)?;
        Ok(id)
    }

    /// Runs `build` on this component via the model stored for it, handing
    /// out a temporarily-exclusive `&mut World` by taking the model out of
    /// its slot for the duration of the call.
    pub fn build_component(&mut self, id: ComponentId) -> VpResult<()> {
        self.with_model(id, |model, world, id| model.build(world, id))?;
        self.component_mut(id).phase = Phase::Built;
        Ok(())
    }

    pub fn pre_start_component(&mut self, id: ComponentId) -> VpResult<()> {
        self.with_model(id, |model, world, id| model.pre_start(world, id))
    }

    pub fn start_component(&mut self, id: ComponentId) -> VpResult<()> {
        let result = self.with_model(id, |model, world, id| model.start(world, id));
        if result.is_ok() {
            self.component_mut(id).phase = Phase::Started;
        }
        result
    }

    pub fn stop_component(&mut self, id: ComponentId) {
        self.with_model(id, |model, world, id| {
            model.stop(world, id);
            Ok(())
        })
        .expect("stop is infallible");
        self.component_mut(id).phase = Phase::Stopped;
    }

    pub fn flush_component(&mut self, id: ComponentId) {
        self.with_model(id, |model, world, id| {
            model.flush(world, id);
            Ok(())
        })
        .expect("flush is infallible");
    }

    fn with_model<R>(
        &mut self,
        id: ComponentId,
        f: impl FnOnce(&mut dyn Component, &mut World, ComponentId) -> R,
    ) -> R {
        let mut model = self.models[id.index()]
            .take()
            .expect("component has no model attached");
        let result = f(model.as_mut(), self, id);
        self.models[id.index()] = Some(model);
        result
    }

    /// Installs a named service on the root's registry.
    pub fn add_service(&mut self, name: impl Into<String>, value: Arc<dyn std::any::Any + Send + Sync>) {
        self.services.insert(name, value);
    }

    pub fn get_service(&self, name: &str) -> Option<&Arc<dyn std::any::Any + Send + Sync>> {
        self.services.get(name)
    }

    /// Path-segment lookup with the same `*`/`**` wildcard semantics as
    /// [`ConfigNode::get`], descending from `root` (or the world root if
    /// `root` is `None`).
    pub fn get_component(&self, root: Option<ComponentId>, path: &str) -> Option<ComponentId> {
        let start = root.unwrap_or_else(|| self.root());
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.get_component_segments(start, &segments)
    }

    fn get_component_segments(&self, current: ComponentId, segments: &[&str]) -> Option<ComponentId> {
        match segments.first() {
            None => Some(current),
            Some(&"**") => {
                if let Some(found) = self.get_component_segments(current, &segments[1..]) {
                    return Some(found);
                }
                for &child in &self.component(current).children {
                    if let Some(found) = self.get_component_segments(child, segments) {
                        return Some(found);
                    }
                }
                None
            }
            Some(&"*") => {
                for &child in &self.component(current).children {
                    if let Some(found) = self.get_component_segments(child, &segments[1..]) {
                        return Some(found);
                    }
                }
                None
            }
            Some(name) => {
                let next = *self.component(current).children_by_name.get(*name)?;
                self.get_component_segments(next, &segments[1..])
            }
        }
    }

    /// Reset arbitration: `from_itf = false` is the ambient top-down reset
    /// and is suppressed on a node that already had its reset driven
    /// through an interface, but still recurses into children. `from_itf =
    /// true` always resets this node (and marks the latch) before
    /// recursing.
    pub fn reset_all(&mut self, id: ComponentId, active: bool, from_itf: bool) {
        let suppressed = !from_itf && self.component(id).reset_done_from_itf;
        if from_itf {
            self.component_mut(id).reset_done_from_itf = true;
        }
        if !suppressed {
            let registers = self.component(id).registers.clone();
            for reg_id in registers {
                self.register_mut(reg_id).reset(active);
            }
            let clocks = self.component(id).clocks.clone();
            for clock_id in clocks {
                self.time_engine.clock_mut(clock_id).cancel_all_pending();
            }
            self.with_model(id, |model, world, id| {
                model.reset(world, id, active);
                Ok::<(), VpError>(())
            })
            .expect("reset is infallible");
        }
        let children = self.component(id).children.clone();
        for child in children {
            self.reset_all(child, active, from_itf);
        }
    }

    pub fn throw_error(&self, id: ComponentId, message: impl Into<String>) -> VpError {
        VpError::Assertion {
            path: self.component(id).path.clone(),
            message: message.into(),
        }
    }

    /// Instantiates every child named in `vp_comps`/`components`, reading
    /// each child's own config subtree under its own name.
    pub fn create_children_from_config(&mut self, id: ComponentId) -> VpResult<()> {
        let config = self.component(id).config.clone();
        let Some(list) = config.child("vp_comps").or_else(|| config.child("components")) else {
            return Ok(());
        };
        for name_node in list.elements()? {
            let name = name_node.as_str()?;
            let child_config = config
                .child(name)
                .cloned()
                .unwrap_or_else(|| ConfigNode::Object(Default::default()));
            let module = child_config
                .child("vp_component")
                .and_then(|n| n.as_str().ok())
                .unwrap_or("utils.composite_impl")
                .to_string();
            self.new_component(Some(id), name, child_config, &module)?;
        }
        Ok(())
    }

    /// Synthesizes the virtual ports named in `vp_ports`/`ports`: renaming
    /// aliases later targeted by this composite's own bindings.
    pub fn create_virtual_ports_from_config(&mut self, id: ComponentId) -> VpResult<()> {
        let config = self.component(id).config.clone();
        let Some(list) = config.child("vp_ports").or_else(|| config.child("ports")) else {
            return Ok(());
        };
        for name_node in list.elements()? {
            let name = name_node.as_str()?.to_string();
            let port_id = self.new_virtual_port(id, name.clone());
            self.component_mut(id).virtual_ports.insert(name, port_id);
        }
        Ok(())
    }

    /// Applies the declarative `vp_bindings`/`bindings` list: each entry is
    /// a `[master_ref, slave_ref]` pair of `"comp->port"` strings, where
    /// `"self"` refers to this composite itself. Splits on the literal
    /// `"->"` substring, not on the individual characters.
    pub fn create_bindings_from_config(&mut self, id: ComponentId) -> VpResult<()> {
        let config = self.component(id).config.clone();
        let Some(list) = config.child("vp_bindings").or_else(|| config.child("bindings")) else {
            return Ok(());
        };
        for entry in list.elements()? {
            let pair = entry.elements()?;
            if pair.len() != 2 {
                return Err(self.throw_error(id, "binding entry must have exactly two endpoints"));
            }
            let master_ref = pair[0].as_str()?;
            let slave_ref = pair[1].as_str()?;
            let master_port = self.resolve_port_ref(id, master_ref)?;
            let slave_port = self.resolve_port_ref(id, slave_ref)?;
            self.bind(master_port, slave_port)?;
        }
        Ok(())
    }

    /// Recursive no-op-by-default hook the out-of-scope external
    /// debug-protocol proxy would bind an external handle through; kept so
    /// that collaborator has a real place to attach without the kernel
    /// depending on it.
    pub fn external_bind(
        &mut self,
        comp_path: &str,
        itf_name: &str,
        _handle: Arc<dyn std::any::Any + Send + Sync>,
    ) -> Option<()> {
        let root = self.root();
        let _id = self.get_component(Some(root), comp_path)?;
        tracing::debug!(path = comp_path, interface = itf_name, "external bind requested");
        Some(())
    }

    fn resolve_port_ref(&self, composite: ComponentId, reference: &str) -> VpResult<crate::ids::PortId> {
        let (comp_name, port_name) = reference
            .split_once("->")
            .ok_or_else(|| self.throw_error(composite, format!("malformed binding reference '{reference}'")))?;

        let owner = if comp_name == "self" {
            composite
        } else {
            *self
                .component(composite)
                .children_by_name
                .get(comp_name)
                .ok_or_else(|| self.throw_error(composite, format!("unknown component '{comp_name}' in binding")))?
        };

        let node = self.component(owner);
        node.master_ports
            .get(port_name)
            .or_else(|| node.virtual_ports.get(port_name))
            .or_else(|| node.slave_ports.get(port_name))
            .copied()
            .ok_or_else(|| {
                self.throw_error(
                    composite,
                    format!("unknown port '{port_name}' on '{comp_name}' in binding"),
                )
            })
    }
}

/// The default passthrough module (`"utils.composite_impl"`): declares no
/// ports or registers of its own, only the children/ports/bindings present
/// in its own config subtree. Used for any component whose config omits
/// `vp_component`.
#[derive(Default)]
pub struct CompositeModel;

impl Component for CompositeModel {
    fn build(&mut self, world: &mut World, id: ComponentId) -> VpResult<()> {
        world.create_children_from_config(id)?;
        world.create_virtual_ports_from_config(id)?;
        world.create_bindings_from_config(id)?;
        Ok(())
    }
}
