//! Outputs of [`crate::step`] — the shell's only way to perform I/O
//! (spec.md §9 "Effect system instead of hidden I/O").

use std::net::SocketAddrV4;

use artnet_core::packet::Packet;
use artnet_core::port_address::PortAddress;
use bytes::Bytes;

use crate::event::{SnapshotReplyToken, SnapshotValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A callback dispatch the shell routes to the matching user-registered
/// callback (spec.md §6 "Callback payload shapes").
#[derive(Debug, Clone)]
pub struct CallbackEffect {
    pub key: CallbackKey,
    pub payload: CallbackPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKey {
    Dmx,
    Sync,
    Rdm,
    RdmSub,
    Trigger,
    /// A registered macro handler for a specific ArtTrigger key/sub-key pair
    /// (spec.md §4.2 ArtTrigger: "dispatch to a registered macro handler if
    /// present, or to the generic trigger callback").
    TriggerMacro(u8, u8),
    Command,
    TimeCode,
    IpProg,
    Address,
    Firmware,
    DataRequest,
    Default,
}

#[derive(Debug, Clone)]
pub enum CallbackPayload {
    Dmx {
        port_address: PortAddress,
        sequence: u8,
        data: Bytes,
        length: u16,
        synced: bool,
        failsafe: bool,
        failsafe_mode: Option<artnet_core::flags::FailsafeMode>,
        vlc: bool,
    },
    Sync {
        ignored: bool,
    },
    Rdm {
        data: Bytes,
    },
    RdmSub {
        phase: RdmSubPhase,
        entries: Vec<RdmSubEntry>,
    },
    Trigger {
        key: u8,
        sub_key: u8,
        data: Bytes,
    },
    Command {
        text: String,
    },
    IpProg {
        change: IpProgChange,
    },
    Address {
        bind_index: u8,
    },
    Firmware {
        event: FirmwareEvent,
    },
    DataRequest {
        request: u16,
    },
    Snapshot {
        token: SnapshotReplyToken,
        values: Vec<SnapshotValue>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdmSubPhase {
    Request,
    Response,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RdmSubEntry {
    pub index: u16,
    pub sub_device: u16,
    pub value: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpProgChange {
    pub ip: Option<std::net::Ipv4Addr>,
    pub subnet: Option<std::net::Ipv4Addr>,
    pub gateway: Option<std::net::Ipv4Addr>,
    pub port: Option<u16>,
    pub dhcp: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareEvent {
    BlockGood,
    Complete,
    Failed,
}

/// The complete set of side-effecting actions `step` may request.
#[derive(Debug, Clone)]
pub enum Effect {
    TxPacket {
        packet: Packet,
        target: SocketAddrV4,
        broadcast: bool,
    },
    /// Like `TxPacket`, but the shell must stagger delivery by a random
    /// delay in `[0, max_delay]` before sending (spec.md §4.2 ArtPoll:
    /// "reply within a random 0-1000ms unless `SUPPRESS_DELAY` is set"). The
    /// pure core has no RNG, so sampling happens in the shell.
    TxPacketJittered {
        packet: Packet,
        target: SocketAddrV4,
        max_delay: std::time::Duration,
    },
    Callback(CallbackEffect),
    Schedule {
        delay: std::time::Duration,
        event: Box<crate::event::Event>,
    },
    Log {
        level: LogLevel,
        message: String,
    },
    DmxFrame {
        port_address: PortAddress,
        sequence: u8,
        data: Bytes,
        length: u16,
    },
}

impl Effect {
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Effect::Log { level, message: message.into() }
    }
}
