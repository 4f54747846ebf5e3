use std::num::NonZeroU32;

macro_rules! arena_handle {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Builds a handle from a zero-based arena index.
            pub(crate) fn from_index(index: usize) -> Self {
                $name(NonZeroU32::new((index as u32) + 1).expect("arena index overflow"))
            }

            pub(crate) fn index(self) -> usize {
                (self.0.get() - 1) as usize
            }
        }
    };
}

arena_handle!(ComponentId);
arena_handle!(PortId);
arena_handle!(ClockId);
arena_handle!(RegisterId);

/// Monotonic per-event identity, used only to break scheduler ties and to
/// implement cancellation without scanning the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub(crate) u64);

impl EventId {
    pub fn new(raw: u64) -> Self {
        EventId(raw)
    }
}
