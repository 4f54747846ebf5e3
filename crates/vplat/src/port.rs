//! Master/slave/virtual ports and the two-phase binding resolution that
//! flattens virtuals into concrete master/slave edges.

use crate::error::{VpError, VpResult};
use crate::ids::{ComponentId, PortId};
use crate::interface::{ClockInterface, IoInterface, IoRequest, IoResult, NullSink, ResetInterface, WireInterface};
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortRole {
    Master,
    Slave,
    Virtual,
}

/// The concrete interface a slave port answers to. A slave port implements
/// exactly one channel kind.
pub enum SlaveEndpoint {
    Io(Box<dyn IoInterface>),
    Wire(Box<dyn WireInterface>),
    Clock(Box<dyn ClockInterface>),
    Reset(Box<dyn ResetInterface>),
}

pub struct PortNode {
    pub owner: ComponentId,
    pub name: String,
    pub role: PortRole,
    /// Symbolic edges declared by `bindings`/`vp_bindings`: for Master/Virtual
    /// ports, the ports this one was bound to (may include further virtuals).
    pub symbolic_outgoing: Vec<PortId>,
    /// Concrete slave ports this master/virtual resolves to after
    /// [`World::final_bind`]. Empty until then. May contain duplicates when
    /// two distinct paths reach the same slave (intentional fan-out, not
    /// deduplicated).
    pub resolved_outgoing: Vec<PortId>,
    /// Masters that ultimately resolve to this port (Slave ports only,
    /// populated by [`World::final_bind`]).
    pub incoming: Vec<PortId>,
    pub endpoint: Option<SlaveEndpoint>,
    pub bound: bool,
}

impl World {
    /// Registers a new master port on `owner`. Rejects a duplicate name
    /// behind an assertion; use [`World::replace_master_port`] for the rare
    /// legitimate overwrite.
    pub fn new_master_port(&mut self, owner: ComponentId, name: impl Into<String>) -> VpResult<PortId> {
        let name = name.into();
        if self.component(owner).master_ports.contains_key(&name) {
            let path = self.component(owner).path.clone();
            debug_assert!(false, "duplicate master port '{name}' on '{path}'");
            return Err(VpError::Assertion {
                path,
                message: format!("duplicate master port '{name}'"),
            });
        }
        let id = self.alloc_port(PortNode {
            owner,
            name: name.clone(),
            role: PortRole::Master,
            symbolic_outgoing: Vec::new(),
            resolved_outgoing: Vec::new(),
            incoming: Vec::new(),
            endpoint: None,
            bound: false,
        });
        self.component_mut(owner).master_ports.insert(name, id);
        Ok(id)
    }

    /// Registers a new slave port with its concrete interface implementation.
    pub fn new_slave_port(
        &mut self,
        owner: ComponentId,
        name: impl Into<String>,
        endpoint: SlaveEndpoint,
    ) -> VpResult<PortId> {
        let name = name.into();
        if self.component(owner).slave_ports.contains_key(&name) {
            let path = self.component(owner).path.clone();
            debug_assert!(false, "duplicate slave port '{name}' on '{path}'");
            return Err(VpError::Assertion {
                path,
                message: format!("duplicate slave port '{name}'"),
            });
        }
        let id = self.alloc_port(PortNode {
            owner,
            name: name.clone(),
            role: PortRole::Slave,
            symbolic_outgoing: Vec::new(),
            resolved_outgoing: Vec::new(),
            incoming: Vec::new(),
            endpoint: Some(endpoint),
            bound: false,
        });
        self.component_mut(owner).slave_ports.insert(name, id);
        Ok(id)
    }

    /// Explicit overwrite path for the rare legitimate re-registration case.
    pub fn replace_master_port(&mut self, owner: ComponentId, name: impl Into<String>) -> PortId {
        let name = name.into();
        if let Some(&existing) = self.component(owner).master_ports.get(&name) {
            return existing;
        }
        self.new_master_port(owner, name).expect("no duplicate after check")
    }

    /// Registers a virtual (renaming) port: an alias that forwards toward a
    /// further virtual or a concrete port of a descendant.
    pub fn new_virtual_port(&mut self, owner: ComponentId, name: impl Into<String>) -> PortId {
        self.alloc_port(PortNode {
            owner,
            name: name.into(),
            role: PortRole::Virtual,
            symbolic_outgoing: Vec::new(),
            resolved_outgoing: Vec::new(),
            incoming: Vec::new(),
            endpoint: None,
            bound: false,
        })
    }

    /// Symbolic binding step: records that `from` forwards to `to`. Legal
    /// between master→slave, master→virtual, virtual→slave, virtual→virtual.
    pub fn bind(&mut self, from: PortId, to: PortId) -> VpResult<()> {
        if self.port(from).role == PortRole::Slave {
            return Err(VpError::Binding(format!(
                "cannot bind from slave port '{}'",
                self.port(from).name
            )));
        }
        self.port_mut(from).symbolic_outgoing.push(to);
        Ok(())
    }

    /// DFS through virtual intermediaries collecting concrete slave ports.
    /// Base case is a slave port itself. Deliberately **not** deduplicated:
    /// a slave reachable through two distinct virtuals receives two
    /// deliveries.
    pub fn get_final_ports(&self, port: PortId) -> Vec<PortId> {
        match self.port(port).role {
            PortRole::Slave => vec![port],
            PortRole::Master | PortRole::Virtual => {
                let mut out = Vec::new();
                for &next in &self.port(port).symbolic_outgoing {
                    out.extend(self.get_final_ports(next));
                }
                out
            }
        }
    }

    /// Resolves every master port's symbolic edges into concrete slave
    /// edges. Must run after all components are constructed and all
    /// symbolic bindings applied, before the first event fires.
    pub fn final_bind(&mut self) -> VpResult<()> {
        let master_ids: Vec<PortId> = (0..self.ports.len())
            .map(PortId::from_index)
            .filter(|&id| self.port(id).role == PortRole::Master)
            .collect();

        for master_id in master_ids {
            let resolved = self.get_final_ports(master_id);
            if resolved.is_empty() && self.port(master_id).symbolic_outgoing.is_empty() {
                tracing::debug!(
                    port = %self.port(master_id).name,
                    "master port bound to zero slaves"
                );
            }
            for &slave_id in &resolved {
                if self.port(slave_id).role != PortRole::Slave {
                    let path = self.component(self.port(master_id).owner).path.clone();
                    return Err(VpError::Binding(format!(
                        "'{path}' port '{}' resolved to a non-slave endpoint",
                        self.port(master_id).name
                    )));
                }
                self.port_mut(slave_id).incoming.push(master_id);
                self.port_mut(slave_id).bound = true;
            }
            let node = self.port_mut(master_id);
            node.resolved_outgoing = resolved;
            node.bound = true;
        }
        Ok(())
    }

    /// Performs an IO access through `master`, delivering to every resolved
    /// slave in resolution order. A master bound to zero slaves is a no-op
    /// that reports success with no latency.
    pub fn io_access(&mut self, master: PortId, req: &mut IoRequest) -> VpResult<IoResult> {
        debug_assert_eq!(self.port(master).role, PortRole::Master);
        let targets = self.port(master).resolved_outgoing.clone();
        if targets.is_empty() {
            let reason = VpError::InterfaceCallOnUnboundPort {
                port: self.port(master).name.clone(),
            };
            tracing::debug!(%reason, "io_access on unbound master port, returning Ok with no latency");
            return Ok(NullSink.access(req));
        }
        let mut last = IoResult::Ok;
        for slave in targets {
            last = match &mut self.port_mut(slave).endpoint {
                Some(SlaveEndpoint::Io(itf)) => itf.access(req),
                _ => {
                    return Err(VpError::Binding(format!(
                        "port '{}' is not an IO slave",
                        self.port(slave).name
                    )));
                }
            };
        }
        Ok(last)
    }

    /// Performs a wire update through `master`. A master bound to zero
    /// slaves silently discards the update.
    pub fn wire_update(&mut self, master: PortId, value: u64) -> VpResult<()> {
        debug_assert_eq!(self.port(master).role, PortRole::Master);
        let targets = self.port(master).resolved_outgoing.clone();
        if targets.is_empty() {
            let reason = VpError::InterfaceCallOnUnboundPort {
                port: self.port(master).name.clone(),
            };
            tracing::debug!(%reason, "wire_update on unbound master port, discarded");
            return Ok(());
        }
        for slave in targets {
            match &mut self.port_mut(slave).endpoint {
                Some(SlaveEndpoint::Wire(itf)) => itf.update(value),
                _ => {
                    return Err(VpError::Binding(format!(
                        "port '{}' is not a wire slave",
                        self.port(slave).name
                    )));
                }
            }
        }
        Ok(())
    }
}
