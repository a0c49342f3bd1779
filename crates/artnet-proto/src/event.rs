//! Inputs to [`crate::step`].

use std::net::SocketAddrV4;
use std::time::Duration;

use artnet_core::packet::Packet;
use bytes::Bytes;

/// A monotonic instant expressed as an offset from node start. Events carry
/// their own timestamp (spec.md §4.2: "no clocks — timestamps arrive on
/// events") so `step` stays a pure function of its inputs.
pub type Timestamp = Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RdmTarget {
    pub uid: artnet_core::field::RdmUid,
}

/// A user-issued directive (spec.md §4.2 "Commands").
#[derive(Debug, Clone)]
pub enum Command {
    SendDmx {
        port_address: artnet_core::port_address::PortAddress,
        data: Bytes,
        target: SocketAddrV4,
    },
    SendRdm {
        port_address: artnet_core::port_address::PortAddress,
        data: Bytes,
        target: SocketAddrV4,
    },
    SendSync {
        target: Option<SocketAddrV4>,
    },
    SendDiagnostic {
        priority: artnet_core::packet::DiagPriority,
        text: String,
    },
    ApplyState(Box<crate::state::StatePatch>),
}

impl Command {
    /// Validates a command before it is handed to `step` (spec.md §7
    /// `InvalidCommand`). `step` itself never rejects — invalid commands are
    /// rejected here, at the boundary, and surfaced to the caller.
    pub fn validate(&self) -> Result<(), crate::error::CommandError> {
        match self {
            Command::SendDmx { data, .. } => {
                if data.len() > 512 {
                    return Err(crate::error::CommandError::DmxPayloadTooLarge(data.len()));
                }
                Ok(())
            }
            Command::SendRdm { data, .. } => {
                if data.len() < 24 {
                    return Err(crate::error::CommandError::RdmPayloadTooShort(data.len()));
                }
                let command_class = data[20];
                if !crate::step::rdm::ALLOWED_COMMAND_CLASSES.contains(&command_class) {
                    return Err(crate::error::CommandError::RdmCommandClassRejected(command_class));
                }
                Ok(())
            }
            Command::SendSync { .. } | Command::SendDiagnostic { .. } | Command::ApplyState(_) => Ok(()),
        }
    }
}

/// A snapshot key the caller may request (SPEC_FULL.md §4.2 "Snapshot handling").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKey {
    Stats,
    Identity,
    DmxState(artnet_core::port_address::PortAddress),
    FailsafeState(artnet_core::port_address::PortAddress),
    Peers,
}

/// A value returned for a requested [`SnapshotKey`].
#[derive(Debug, Clone)]
pub enum SnapshotValue {
    Stats(crate::state::Stats),
    Identity(crate::config::NodeIdentity),
    DmxState(Option<crate::state::DmxPortState>),
    FailsafeState(Option<crate::state::FailsafePortState>),
    PeerCount(usize),
}

#[derive(Debug, Clone)]
pub enum Event {
    Rx {
        packet: Packet,
        sender: SocketAddrV4,
        timestamp: Timestamp,
    },
    Tick {
        now: Timestamp,
    },
    Command {
        command: Command,
        timestamp: Timestamp,
    },
    /// Handled inside `step` as a pure read-only branch (SPEC_FULL.md §4.2).
    Snapshot {
        keys: Vec<SnapshotKey>,
        reply: SnapshotReplyToken,
    },
}

/// An opaque correlation id for a snapshot request. The shell maps this to an
/// actual `oneshot` completion; `artnet-proto` only ever moves it around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotReplyToken(pub u64);
