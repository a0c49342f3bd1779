//! Errors surfaced to the caller driving the state machine.
//!
//! `step` itself never returns an error (spec.md §7: "the pure step function
//! never throws for protocol-level rejects") — only [`Command::validate`]
//! does, for the `InvalidCommand` taxonomy entry.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("send-dmx payload too large: {0} bytes (max 512)")]
    DmxPayloadTooLarge(usize),

    #[error("send-rdm requires a target")]
    RdmTargetMissing,

    #[error("send-rdm payload too short: {0} bytes (min 24)")]
    RdmPayloadTooShort(usize),

    #[error("send-rdm command class 0x{0:02x} is not in the allowed set")]
    RdmCommandClassRejected(u8),
}
