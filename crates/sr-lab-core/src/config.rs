/// Protocol parameters shared by the sender and receiver state machines.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolConfig {
    /// Maximum number of unacknowledged packets in flight.
    pub window_size: u32,
    /// Capacity of the seq-indexed packet rings. Must strictly exceed
    /// `window_size` so no live slot is ever aliased by a newer sequence
    /// number before it is retired.
    pub buffer_capacity: u32,
    /// Retransmission timeout in ms.
    pub timeout_ms: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            window_size: 8,
            buffer_capacity: 50,
            timeout_ms: 3000,
        }
    }
}

impl ProtocolConfig {
    /// Panics unless `buffer_capacity > window_size >= 1`. Called by the
    /// state machine constructors; a bad configuration is a programming
    /// error, not a runtime condition.
    pub(crate) fn check(&self) {
        assert!(self.window_size >= 1, "window_size must be at least 1");
        assert!(
            self.buffer_capacity > self.window_size,
            "buffer_capacity must strictly exceed window_size"
        );
    }
}
