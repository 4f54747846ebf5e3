//! Per-clock event queue. Ordering mechanics only; callback storage and
//! firing live on [`crate::world::World`] (see [`crate::sched::time_engine`]),
//! so this module stays cheaply unit-testable on its own.

pub mod time_engine;

use crate::ids::{ClockId, ComponentId, EventId};
use crate::world::World;
use fxhash::FxHashSet;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledEvent {
    cycle: u64,
    id: EventId,
}

impl Ord for ScheduledEvent {
    /// Reversed so [`BinaryHeap`] (a max-heap) pops the earliest cycle
    /// first; ties broken by event id, which is assigned in submission
    /// order, giving FIFO delivery within a cycle.
    fn cmp(&self, other: &Self) -> Ordering {
        other.cycle.cmp(&self.cycle).then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A single clock domain's local queue. Frequency changes take effect on
/// the next event scheduled after the change; already-queued events keep
/// their original absolute cycle.
pub struct ClockEngine {
    frequency_hz: u64,
    current_cycle: u64,
    queue: BinaryHeap<ScheduledEvent>,
    /// Events currently pending, for the "at most one enqueue at a time"
    /// invariant and O(1) cancellation (cancel just removes the id here;
    /// `pop_due` silently drops anything no longer present).
    pending: FxHashSet<EventId>,
}

impl ClockEngine {
    pub fn new(frequency_hz: u64) -> Self {
        ClockEngine {
            frequency_hz,
            current_cycle: 0,
            queue: BinaryHeap::new(),
            pending: FxHashSet::default(),
        }
    }

    pub fn frequency_hz(&self) -> u64 {
        self.frequency_hz
    }

    pub fn set_frequency(&mut self, hz: u64) {
        self.frequency_hz = hz;
    }

    pub fn current_cycle(&self) -> u64 {
        self.current_cycle
    }

    /// Enqueues `id` `delay_cycles` after the current cycle. A no-op
    /// (returns `false`) if `id` is already pending.
    pub fn enqueue(&mut self, id: EventId, delay_cycles: u64) -> bool {
        if !self.pending.insert(id) {
            return false;
        }
        self.queue.push(ScheduledEvent {
            cycle: self.current_cycle + delay_cycles,
            id,
        });
        true
    }

    /// O(1): the event is dropped the next time it would be popped, even if
    /// it is already at the head of the queue.
    pub fn cancel(&mut self, id: EventId) {
        self.pending.remove(&id);
    }

    /// Drops every currently pending event without firing any of them; used
    /// when a reset pulse cancels the clock domains a component owns.
    pub fn cancel_all_pending(&mut self) {
        self.pending.clear();
        self.queue.clear();
    }

    pub fn next_cycle(&self) -> Option<u64> {
        self.queue.peek().map(|e| e.cycle)
    }

    /// Absolute wall time (picoseconds) of the next pending event, if any.
    pub fn next_wall_time_ps(&self) -> Option<u128> {
        self.next_cycle().map(|cycle| self.cycle_to_ps(cycle))
    }

    fn cycle_to_ps(&self, cycle: u64) -> u128 {
        (cycle as u128 * 1_000_000_000_000u128) / self.frequency_hz.max(1) as u128
    }

    /// Advances to the next pending cycle and drains every event due at
    /// it, in FIFO submission order, skipping anything canceled in the
    /// meantime. Returns an empty vec if the queue is empty.
    pub fn pop_all_due(&mut self) -> Vec<EventId> {
        let Some(due_cycle) = self.next_cycle() else {
            return Vec::new();
        };
        self.current_cycle = due_cycle;
        let mut fired = Vec::new();
        while let Some(top) = self.queue.peek() {
            if top.cycle != due_cycle {
                break;
            }
            let event = self.queue.pop().expect("peeked Some");
            if self.pending.remove(&event.id) {
                fired.push(event.id);
            }
        }
        // Lowest id first within the cycle: the heap already pops FIFO
        // because ties are broken by id, but `while let` above collects in
        // pop order, which already is ascending id order.
        fired
    }
}

impl World {
    /// Allocates a new clock domain owned by `owner`. Its pending events are
    /// cancelled whenever `owner`'s ambient reset fires (see
    /// [`crate::component::World::reset_all`]); a clock registered directly
    /// on [`World::time_engine`] instead is never tied to a component and so
    /// is never cancelled this way.
    pub fn new_clock(&mut self, owner: ComponentId, frequency_hz: u64) -> ClockId {
        let id = self.time_engine.register_clock(ClockEngine::new(frequency_hz));
        self.component_mut(owner).clocks.push(id);
        id
    }
}
