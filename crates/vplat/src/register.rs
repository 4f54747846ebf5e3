//! Reset-aware storage cells of widths 1/8/16/32/64.

use crate::ids::{ComponentId, RegisterId};
use crate::world::World;
use std::any::Any;

/// Sealed trait mapping a register width to its backing storage type.
pub trait RegWidth: private::Sealed {
    type Storage: Copy + Default + std::fmt::LowerHex;
    const BITS: u8;
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::W1 {}
    impl Sealed for super::W8 {}
    impl Sealed for super::W16 {}
    impl Sealed for super::W32 {}
    impl Sealed for super::W64 {}
}

macro_rules! width_marker {
    ($marker:ident, $storage:ty, $bits:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $marker;
        impl RegWidth for $marker {
            type Storage = $storage;
            const BITS: u8 = $bits;
        }
    };
}

width_marker!(W1, u8, 1);
width_marker!(W8, u8, 8);
width_marker!(W16, u16, 16);
width_marker!(W32, u32, 32);
width_marker!(W64, u64, 64);

pub type Reg1 = RegisterCell<W1>;
pub type Reg8 = RegisterCell<W8>;
pub type Reg16 = RegisterCell<W16>;
pub type Reg32 = RegisterCell<W32>;
pub type Reg64 = RegisterCell<W64>;

/// A single register cell owned by a component.
///
/// `reset_value == None` means the cell is reset-inert: it keeps its content
/// across a reset pulse instead of being restored.
#[derive(Debug, Clone)]
pub struct RegisterCell<W: RegWidth> {
    owner: ComponentId,
    name: String,
    reset_value: Option<W::Storage>,
    current: W::Storage,
}

impl<W: RegWidth> RegisterCell<W> {
    pub fn new(owner: ComponentId, name: impl Into<String>, reset_value: Option<W::Storage>) -> Self {
        let current = reset_value.unwrap_or_default();
        RegisterCell {
            owner,
            name: name.into(),
            reset_value,
            current,
        }
    }

    pub fn reset(&mut self, active: bool) {
        if active {
            if let Some(reset_value) = self.reset_value {
                self.current = reset_value;
            }
        }
    }

    pub fn read(&self) -> W::Storage {
        self.current
    }

    pub fn write(&mut self, value: W::Storage) {
        tracing::trace!(
            component = %self.owner.index(),
            register = %self.name,
            value = format!("{:#x}", value),
            width = W::BITS,
            "register write"
        );
        self.current = value;
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Type-erased register handle stored in [`World`]'s arena, so a component
/// with registers of mixed widths can be reset without the caller knowing
/// each one's width (see [`World::reset_all`][crate::component]).
pub trait AnyRegister: Send {
    fn reset(&mut self, active: bool);
    fn name(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<W: RegWidth + 'static> AnyRegister for RegisterCell<W> {
    fn reset(&mut self, active: bool) {
        RegisterCell::reset(self, active);
    }

    fn name(&self) -> &str {
        RegisterCell::name(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl World {
    /// Allocates a new register cell owned by `owner`. The returned handle
    /// is also appended to `owner`'s own register list, which is what
    /// `reset_all` walks to reset every register a component owns.
    pub fn new_register<W: RegWidth + 'static>(
        &mut self,
        owner: ComponentId,
        name: impl Into<String>,
        reset_value: Option<W::Storage>,
    ) -> RegisterId {
        let cell = RegisterCell::<W>::new(owner, name, reset_value);
        let id = RegisterId::from_index(self.registers.len());
        self.registers.push(Box::new(cell));
        self.component_mut(owner).registers.push(id);
        id
    }

    pub fn register(&self, id: RegisterId) -> &dyn AnyRegister {
        self.registers[id.index()].as_ref()
    }

    pub fn register_mut(&mut self, id: RegisterId) -> &mut dyn AnyRegister {
        self.registers[id.index()].as_mut()
    }

    /// Typed accessor; panics if `W` does not match the width `id` was
    /// allocated with.
    pub fn register_as<W: RegWidth + 'static>(&self, id: RegisterId) -> &RegisterCell<W> {
        self.registers[id.index()]
            .as_any()
            .downcast_ref()
            .expect("register width mismatch")
    }

    pub fn register_as_mut<W: RegWidth + 'static>(&mut self, id: RegisterId) -> &mut RegisterCell<W> {
        self.registers[id.index()]
            .as_any_mut()
            .downcast_mut()
            .expect("register width mismatch")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{BuildMode, ModuleLoader};

    fn test_world_with_root() -> (World, ComponentId) {
        let mut world = World::new(ModuleLoader::new(vec![], BuildMode::Release));
        let root = world.alloc_component(crate::world::ComponentNode {
            name: "root".into(),
            path: "root".into(),
            parent: None,
            children: vec![],
            children_by_name: Default::default(),
            master_ports: Default::default(),
            slave_ports: Default::default(),
            virtual_ports: Default::default(),
            config: crate::config::ConfigNode::Null,
            phase: crate::component::Phase::Built,
            reset_done_from_itf: false,
            registers: Vec::new(),
            clocks: Vec::new(),
        });
        (world, root)
    }

    #[test]
    fn world_register_allocation_tracks_owner_and_supports_typed_access() {
        let (mut world, root) = test_world_with_root();
        let reg_id = world.new_register::<W32>(root, "ctrl", Some(0xDEAD_BEEF));
        assert_eq!(world.component(root).registers, vec![reg_id]);

        world.register_as_mut::<W32>(reg_id).write(0x1234);
        assert_eq!(world.register_as::<W32>(reg_id).read(), 0x1234);

        world.register_mut(reg_id).reset(true);
        assert_eq!(world.register_as::<W32>(reg_id).read(), 0xDEAD_BEEF);
    }

    #[test]
    fn reset_restores_reset_value() {
        let owner = ComponentId::from_index(0);
        let mut reg = Reg32::new(owner, "ctrl", Some(0xDEAD_BEEF));
        reg.write(0x1234);
        assert_eq!(reg.read(), 0x1234);
        reg.reset(true);
        assert_eq!(reg.read(), 0xDEAD_BEEF);
    }

    #[test]
    fn reset_inert_register_keeps_value() {
        let owner = ComponentId::from_index(0);
        let mut reg = Reg8::new(owner, "scratch", None);
        reg.write(0x42);
        reg.reset(true);
        assert_eq!(reg.read(), 0x42);
    }
}
