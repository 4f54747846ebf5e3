//! Typed views layered over [`crate::port`] edges: one small trait per
//! channel kind rather than a single runtime vtable struct, so the resolved
//! `(method, context)` pair final-bind caches is a plain trait object.

use crate::ids::ClockId;

#[derive(Debug)]
pub struct IoRequest {
    pub addr: u64,
    pub size: u32,
    pub is_write: bool,
    pub data: Vec<u8>,
    pub latency_acc: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoResult {
    Ok,
    Invalid,
    Pending,
}

/// Memory-mapped request/response channel.
pub trait IoInterface {
    fn access(&mut self, req: &mut IoRequest) -> IoResult;
}

/// Unidirectional level-signal channel.
pub trait WireInterface {
    fn update(&mut self, value: u64);
}

/// Clock distribution channel: a master announces a clock handle and may
/// change its frequency, slaves register interest.
pub trait ClockInterface {
    fn register(&mut self, clock: ClockId);
    fn set_frequency(&mut self, hz: u64);
}

/// Reset distribution channel; driving it active triggers the "from
/// interface" reset path on the owning component (see [`crate::component`]).
pub trait ResetInterface {
    fn update(&mut self, active: bool);
}

/// No-op sink used when a master port resolves to zero slaves: IO calls
/// return `Ok` with no accumulated latency, wire calls are discarded. This
/// is documented behavior, not an error path.
pub struct NullSink;

impl IoInterface for NullSink {
    fn access(&mut self, _req: &mut IoRequest) -> IoResult {
        IoResult::Ok
    }
}

impl WireInterface for NullSink {
    fn update(&mut self, _value: u64) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_io_is_ok_with_no_latency() {
        let mut sink = NullSink;
        let mut req = IoRequest {
            addr: 0,
            size: 4,
            is_write: false,
            data: vec![0; 4],
            latency_acc: 0,
        };
        assert_eq!(sink.access(&mut req), IoResult::Ok);
        assert_eq!(req.latency_acc, 0);
    }
}
