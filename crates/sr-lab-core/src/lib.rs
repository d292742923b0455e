//! Selective Repeat sender and receiver state machines.
//!
//! The protocol logic lives entirely in this crate: sliding-window
//! admission, per-packet acknowledgment tracking, single-timer
//! retransmission and receiver-side out-of-order buffering. The channel,
//! delay, loss and corruption are supplied by `sr-lab-simulator`; the state
//! machines only see the `SystemContext` capability.

pub mod checksum;
pub mod config;
pub mod error;
pub mod receiver;
pub mod sender;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ProtocolConfig;
pub use error::ProtocolError;
pub use receiver::SrReceiver;
pub use sender::{RETRANSMIT_TIMER, SrSender};
