//! Discrete-event virtual-platform simulation kernel: a hierarchical
//! component tree with dynamically loaded models, a port-binding graph
//! resolved through virtual intermediaries, and a time-ordered event
//! scheduler merging per-component clock engines.
//!
//! Individual peripheral models, the instruction-set simulator, the
//! external debug-protocol proxy, trace/log sinks and the power-tracing
//! subsystem are collaborators that plug into this kernel; none of them
//! live here.

pub mod component;
pub mod config;
pub mod debug;
pub mod error;
pub mod ids;
pub mod interface;
pub mod lifecycle;
pub mod loader;
pub mod port;
pub mod register;
pub mod sched;
pub mod service;
pub mod world;

pub mod prelude {
    pub use crate::component::{Component, CompositeModel, Phase};
    pub use crate::config::ConfigNode;
    pub use crate::error::{VpError, VpResult};
    pub use crate::ids::{ClockId, ComponentId, EventId, PortId, RegisterId};
    pub use crate::interface::{ClockInterface, IoInterface, IoRequest, IoResult, ResetInterface, WireInterface};
    pub use crate::lifecycle::LifecycleDriver;
    pub use crate::loader::{BuildMode, ModuleLoader};
    pub use crate::port::{PortRole, SlaveEndpoint};
    pub use crate::register::{Reg1, Reg8, Reg16, Reg32, Reg64};
    pub use crate::world::World;
}
