//! Arena ownership for the component/port graph.
//!
//! Rather than the parent/child-pointer graph of a traditional C++ kernel,
//! every component and port lives in a flat, index-addressed arena owned by
//! a single [`World`]; parent, child and binding links are handles
//! ([`ComponentId`], [`PortId`]), never borrowed references or raw pointers.

use crate::component::{Component, Phase};
use crate::config::ConfigNode;
use crate::ids::{ClockId, ComponentId, PortId, RegisterId};
use crate::loader::ModuleLoader;
use crate::port::PortNode;
use crate::register::AnyRegister;
use crate::sched::time_engine::TimeEngine;
use crate::service::Services;
use fxhash::FxHashMap;

pub struct ComponentNode {
    pub name: String,
    pub path: String,
    pub parent: Option<ComponentId>,
    pub children: Vec<ComponentId>,
    pub children_by_name: FxHashMap<String, ComponentId>,
    pub master_ports: FxHashMap<String, PortId>,
    pub slave_ports: FxHashMap<String, PortId>,
    pub virtual_ports: FxHashMap<String, PortId>,
    pub config: ConfigNode,
    pub phase: Phase,
    /// Set once a reset has been driven through a reset interface, so the
    /// ambient top-down reset does not double-reset this node (see
    /// [`crate::component`]).
    pub reset_done_from_itf: bool,
    /// Register cells this component owns, in allocation order (see
    /// [`crate::register::World::new_register`]).
    pub registers: Vec<RegisterId>,
    /// Clock domains this component owns; their pending events are
    /// cancelled whenever this component's ambient reset fires.
    pub clocks: Vec<ClockId>,
}

/// Owns every component and port in the simulated hierarchy.
pub struct World {
    pub(crate) components: Vec<ComponentNode>,
    pub(crate) ports: Vec<PortNode>,
    pub(crate) models: Vec<Option<Box<dyn Component>>>,
    pub(crate) registers: Vec<Box<dyn AnyRegister>>,
    pub loader: ModuleLoader,
    pub services: Services,
    pub time_engine: TimeEngine,
}

impl World {
    pub fn new(loader: ModuleLoader) -> Self {
        World {
            components: Vec::new(),
            ports: Vec::new(),
            models: Vec::new(),
            registers: Vec::new(),
            loader,
            services: Services::new(),
            time_engine: TimeEngine::new(),
        }
    }

    pub fn component(&self, id: ComponentId) -> &ComponentNode {
        &self.components[id.index()]
    }

    pub fn component_mut(&mut self, id: ComponentId) -> &mut ComponentNode {
        &mut self.components[id.index()]
    }

    pub fn root(&self) -> ComponentId {
        ComponentId::from_index(0)
    }

    pub(crate) fn alloc_component(&mut self, node: ComponentNode) -> ComponentId {
        let id = ComponentId::from_index(self.components.len());
        self.components.push(node);
        self.models.push(None);
        id
    }

    pub(crate) fn alloc_port(&mut self, node: PortNode) -> PortId {
        let id = PortId::from_index(self.ports.len());
        self.ports.push(node);
        id
    }

    pub fn port(&self, id: PortId) -> &PortNode {
        &self.ports[id.index()]
    }

    pub fn port_mut(&mut self, id: PortId) -> &mut PortNode {
        &mut self.ports[id.index()]
    }

    /// All components in arena allocation order, i.e. construction order
    /// (parents always precede their children).
    pub fn all_components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        (0..self.components.len()).map(ComponentId::from_index)
    }
}

