//! Merges heterogeneous clock domains into one globally ordered event
//! stream. Each [`crate::sched::ClockEngine`] owns its own local queue; the
//! time engine only ever looks at each clock's next wall time.

use crate::ids::{ClockId, EventId};
use crate::sched::ClockEngine;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClockKey {
    next_wall_ps: u128,
    registration_order: u32,
    clock: ClockId,
}

impl Ord for ClockKey {
    /// Earliest wall time first; ties go to whichever clock registered
    /// first.
    fn cmp(&self, other: &Self) -> Ordering {
        Reverse(self.next_wall_ps)
            .cmp(&Reverse(other.next_wall_ps))
            .then_with(|| Reverse(self.registration_order).cmp(&Reverse(other.registration_order)))
    }
}

impl PartialOrd for ClockKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Drains clock engines in global time order. Owns no events itself; the
/// caller (typically [`crate::lifecycle::LifecycleDriver`]) supplies the
/// clocks and is handed back which clock fired and which event ids are due.
pub struct TimeEngine {
    clocks: Vec<ClockEngine>,
    registration_order: Vec<u32>,
    next_registration: u32,
    global_time_ps: u128,
}

impl TimeEngine {
    pub fn new() -> Self {
        TimeEngine {
            clocks: Vec::new(),
            registration_order: Vec::new(),
            next_registration: 0,
            global_time_ps: 0,
        }
    }

    pub fn register_clock(&mut self, engine: ClockEngine) -> ClockId {
        let id = crate::ids::ClockId::from_index(self.clocks.len());
        self.clocks.push(engine);
        self.registration_order.push(self.next_registration);
        self.next_registration += 1;
        id
    }

    pub fn clock(&self, id: ClockId) -> &ClockEngine {
        &self.clocks[id.index()]
    }

    pub fn clock_mut(&mut self, id: ClockId) -> &mut ClockEngine {
        &mut self.clocks[id.index()]
    }

    pub fn global_time_ps(&self) -> u128 {
        self.global_time_ps
    }

    fn pending_heap(&self) -> BinaryHeap<ClockKey> {
        self.clocks
            .iter()
            .enumerate()
            .filter_map(|(idx, clock)| {
                clock.next_wall_time_ps().map(|wall_ps| ClockKey {
                    next_wall_ps: wall_ps,
                    registration_order: self.registration_order[idx],
                    clock: ClockId::from_index(idx),
                })
            })
            .collect()
    }

    /// Advances to the earliest pending event across every clock, fires
    /// everything due on that clock at that instant, and returns
    /// `(clock, event_ids)`. `None` once every clock is empty.
    pub fn step(&mut self) -> Option<(ClockId, Vec<EventId>)> {
        let mut heap = self.pending_heap();
        let next = heap.pop()?;
        self.global_time_ps = next.next_wall_ps;
        let fired = self.clock_mut(next.clock).pop_all_due();
        Some((next.clock, fired))
    }
}

impl Default for TimeEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> EventId {
        EventId(n)
    }

    #[test]
    fn clock_domain_merging_orders_by_wall_time_then_registration() {
        let mut engine = TimeEngine::new();
        let clock_a = engine.register_clock(ClockEngine::new(100_000_000)); // 100 MHz
        let clock_b = engine.register_clock(ClockEngine::new(50_000_000)); // 50 MHz

        engine.clock_mut(clock_a).enqueue(id(1), 10); // fires at 100 ns
        engine.clock_mut(clock_b).enqueue(id(2), 5); // fires at 100 ns, too

        let (first_clock, first_ids) = engine.step().unwrap();
        assert_eq!(first_clock, clock_a);
        assert_eq!(first_ids, vec![id(1)]);
        assert_eq!(engine.global_time_ps(), 100_000);

        let (second_clock, second_ids) = engine.step().unwrap();
        assert_eq!(second_clock, clock_b);
        assert_eq!(second_ids, vec![id(2)]);
        assert_eq!(engine.global_time_ps(), 100_000);

        assert!(engine.step().is_none());
    }
}
