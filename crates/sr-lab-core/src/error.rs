use thiserror::Error;

/// Everything that can go wrong inside the protocol. None of these are
/// fatal: each one degrades to "drop and let the retransmission timer
/// correct it", and none escapes into the harness as a panic.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Checksum mismatch; the packet is dropped without touching state.
    #[error("checksum mismatch, packet treated as corrupted")]
    CorruptedPacket,

    /// The send window is saturated; the submission was rejected and the
    /// caller decides whether to retry.
    #[error("send window full, message rejected")]
    WindowFull,

    /// Acknowledgment for a sequence number outside the active window.
    /// Expected under duplicate/loss scenarios; reported for logging only.
    #[error("acknowledgment outside the active send window")]
    StaleAcknowledgment,
}
