//! Decoded packet variants — a tagged union over opcodes.
//!
//! Every variant carries its typed fixed fields plus, where the opcode has
//! one, a [`Payload`](crate::field::Payload) view into the receive buffer
//! for the variable-length trailer (spec.md §3 Packet).

use std::net::Ipv4Addr;

use crate::field::{Payload, RdmUid};
use crate::flags::{Status1, Status2, Status3, TalkToMe};
use crate::port_address::PortAddress;

/// ArtPoll — node/controller discovery request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll {
    pub flags: TalkToMe,
    pub priority: u8,
    pub target_port_address_top: u16,
    pub target_port_address_bottom: u16,
    pub esta_man: u16,
    pub oem: u16,
}

/// One port's direction/type/good-input/good-output-a/b/sw-in/sw-out entry
/// within an ArtPollReply page (spec.md §3: "ports are grouped in pages of
/// at most 4").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortEntry {
    pub port_type: u8,
    pub good_input: u8,
    pub good_output_a: u8,
    pub good_output_b: u8,
    pub sw_in: u8,
    pub sw_out: u8,
}

/// ArtPollReply — exactly 239 bytes on the wire (spec.md §8 invariant 3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReply {
    pub address: Ipv4Addr,
    pub port: u16,
    pub version: u16,
    pub net_switch: u8,
    pub sub_switch: u8,
    pub oem: u16,
    pub ubea_version: u8,
    pub status1: Status1,
    pub esta_man: u16,
    pub short_name: String,
    pub long_name: String,
    pub node_report: String,
    pub num_ports: u16,
    pub ports: [PortEntry; 4],
    pub sw_video: u8,
    pub sw_macro: u8,
    pub sw_remote: u8,
    pub style: u8,
    pub mac: [u8; 6],
    pub bind_ip: Ipv4Addr,
    pub bind_index: u8,
    pub status2: Status2,
    pub status3: Status3,
    pub default_responder_uid: RdmUid,
    pub user_hi: u8,
    pub user_lo: u8,
    pub refresh_rate: u8,
    pub background_queue_policy: u8,
}

/// ArtDmx — DMX512-A data for one Port-Address.
#[derive(Debug, Clone)]
pub struct Dmx {
    pub sequence: u8,
    pub physical: u8,
    pub port_address: PortAddress,
    pub length: u16,
    pub data: Payload,
}

/// ArtNzs — non-zero start code DMX data.
#[derive(Debug, Clone)]
pub struct Nzs {
    pub sequence: u8,
    pub start_code: u8,
    pub port_address: PortAddress,
    pub length: u16,
    pub data: Payload,
}

/// ArtVlc — variable lighting control (visible light communication) data.
#[derive(Debug, Clone)]
pub struct Vlc {
    pub sequence: u8,
    pub start_code: u8,
    pub port_address: PortAddress,
    pub ieee: bool,
    pub reply_requested: bool,
    pub beacon: bool,
    pub length: u16,
    pub data: Payload,
}

/// ArtSync — forces synchronous output of staged ArtDmx frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sync {
    pub aux: u8,
}

/// A single directive within ArtAddress (spec.md §4.2 ArtAddress).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressCommand {
    None,
    CancelMerge,
    ClearAllOutputPorts,
    LedNormal,
    LedMute,
    LedLocate,
    MergeLtp(u8),
    MergeHtp(u8),
    ArtNetSel(u8),
    AcnSel(u8),
    FailsafeHold,
    FailsafeZero,
    FailsafeFull,
    FailsafeScene,
    FailsafeRecord,
    InputPortDirection(u8),
    OutputPortDirection(u8),
    BackgroundQueuePolicy(u8),
    Unknown(u8),
}

impl AddressCommand {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0x00 => AddressCommand::None,
            0x01 => AddressCommand::CancelMerge,
            0x90 => AddressCommand::ClearAllOutputPorts,
            0x91 => AddressCommand::LedNormal,
            0x92 => AddressCommand::LedMute,
            0x93 => AddressCommand::LedLocate,
            0x08 => AddressCommand::FailsafeHold,
            0x09 => AddressCommand::FailsafeZero,
            0x0A => AddressCommand::FailsafeFull,
            0x0B => AddressCommand::FailsafeScene,
            0x0C => AddressCommand::FailsafeRecord,
            0xE0..=0xE4 => AddressCommand::BackgroundQueuePolicy(b - 0xE0),
            0x10..=0x13 => AddressCommand::MergeLtp(b - 0x10),
            0x50..=0x53 => AddressCommand::MergeHtp(b - 0x50),
            0x20..=0x2F => AddressCommand::InputPortDirection(b - 0x20),
            0x30..=0x3F => AddressCommand::OutputPortDirection(b - 0x30),
            0x60..=0x6F => AddressCommand::ArtNetSel(b - 0x60),
            0x70..=0x7F => AddressCommand::AcnSel(b - 0x70),
            other => AddressCommand::Unknown(other),
        }
    }
}

/// ArtAddress — remote programming of a node's identity/routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub net_switch: Option<u8>,
    pub bind_index: u8,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub sw_in: [Option<u8>; 4],
    pub sw_out: [Option<u8>; 4],
    pub sub_switch: Option<u8>,
    pub command: AddressCommand,
}

/// ArtInput — enable/disable DMX input ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Input {
    pub bind_index: u8,
    pub disable: [bool; 4],
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IpProgCommand: u8 {
        const PROGRAM_PORT   = 0b0000_0010;
        const PROGRAM_SUBNET = 0b0000_0100;
        const PROGRAM_IP     = 0b0000_1000;
        const RESET_DEFAULTS = 0b0000_1000 | 0b1000_0000; // 0x88
        const DEFAULT        = 0b0001_0000;
        const DHCP           = 0b0100_0000;
        const ENABLE         = 0b1000_0000;
    }
}

/// ArtIpProg — remote IP/mask/port (re)configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpProg {
    pub command: IpProgCommand,
    pub prog_ip: Ipv4Addr,
    pub prog_subnet: Ipv4Addr,
    pub prog_port: u16,
    pub prog_gateway: Ipv4Addr,
}

/// ArtIpProgReply — 34 bytes fixed (spec.md §4.2 ArtIpProg).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpProgReply {
    pub prog_ip: Ipv4Addr,
    pub prog_subnet: Ipv4Addr,
    pub prog_port: u16,
    pub status: u8,
    pub prog_gateway: Ipv4Addr,
    pub dhcp_enabled: bool,
}

/// ArtTodRequest — request a Table of Devices for a set of port-addresses.
#[derive(Debug, Clone)]
pub struct TodRequest {
    pub net: u8,
    pub command: u8,
    pub addresses: Vec<u8>,
}

/// ArtTodData — response carrying discovered RDM UIDs for one port-address.
#[derive(Debug, Clone)]
pub struct TodData {
    pub rdm_ver: u8,
    pub port: u8,
    pub bind_index: u8,
    pub net: u8,
    pub command_response: u8,
    pub port_address: PortAddress,
    pub uid_total: u16,
    pub block_count: u8,
    pub uids: Vec<RdmUid>,
}

/// ArtTodControl — discovery control (flush etc).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodControl {
    pub net: u8,
    pub command: u8,
    pub port_address: PortAddress,
}

/// ArtRdm — encapsulated RDM request/response.
#[derive(Debug, Clone)]
pub struct Rdm {
    pub rdm_ver: u8,
    pub net: u8,
    pub command: u8,
    pub port_address: PortAddress,
    pub data: Payload,
}

/// A single ArtRdmSub sub-device value (spec.md §4.2 ArtRdmSub).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RdmSubValue {
    pub index: u16,
    pub value: u16,
}

/// ArtRdmSub — compressed multi-sub-device RDM data.
#[derive(Debug, Clone)]
pub struct RdmSub {
    pub rdm_ver: u8,
    pub uid: RdmUid,
    pub command_class: u8,
    pub parameter_id: u16,
    pub sub_device: u16,
    pub sub_count: u16,
    pub values: Vec<RdmSubValue>,
}

/// ArtCommand — text directive channel (`Key=Value&...`).
#[derive(Debug, Clone)]
pub struct Command {
    pub esta_man: u16,
    pub text: String,
}

/// ArtTrigger — macro/show-control trigger.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub oem: u16,
    pub key: u8,
    pub sub_key: u8,
    pub data: Payload,
}

/// ArtDataRequest — requests a canned response (device info, etc).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRequest {
    pub esta_man: u16,
    pub oem: u16,
    pub request: u16,
}

/// ArtDataReply — canned response to ArtDataRequest.
#[derive(Debug, Clone)]
pub struct DataReply {
    pub esta_man: u16,
    pub oem: u16,
    pub request: u16,
    pub payload: Payload,
}

/// ArtFirmwareMaster block types (spec.md §4.2 ArtFirmwareMaster).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareBlockType {
    First,
    Continue,
    Last,
    UfFirst,
    UfContinue,
    UfLast,
}

impl FirmwareBlockType {
    pub fn from_byte(b: u8) -> Option<Self> {
        Some(match b {
            0x00 => FirmwareBlockType::First,
            0x01 => FirmwareBlockType::Continue,
            0x02 => FirmwareBlockType::Last,
            0x03 => FirmwareBlockType::UfFirst,
            0x04 => FirmwareBlockType::UfContinue,
            0x05 => FirmwareBlockType::UfLast,
            _ => return None,
        })
    }

    pub fn to_byte(self) -> u8 {
        match self {
            FirmwareBlockType::First => 0x00,
            FirmwareBlockType::Continue => 0x01,
            FirmwareBlockType::Last => 0x02,
            FirmwareBlockType::UfFirst => 0x03,
            FirmwareBlockType::UfContinue => 0x04,
            FirmwareBlockType::UfLast => 0x05,
        }
    }
}

/// ArtFirmwareMaster — chunked firmware/file upload block.
#[derive(Debug, Clone)]
pub struct FirmwareMaster {
    pub block_type: FirmwareBlockType,
    pub block_id: u8,
    pub firmware_length_words: u32,
    pub data: Payload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareReplyStatus {
    BlockGood,
    AllGood,
    Fail,
}

/// ArtFirmwareReply — acknowledgement for a firmware block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareReply {
    pub status: FirmwareReplyStatus,
}

/// Diagnostics priority levels (spec.md §4.2 ArtDiagData).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagPriority {
    Low = 0x10,
    Medium = 0x40,
    High = 0x80,
    Critical = 0xE0,
    Volatile = 0xF0,
}

impl DiagPriority {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0..=0x1F => DiagPriority::Low,
            0x20..=0x5F => DiagPriority::Medium,
            0x60..=0xDF => DiagPriority::High,
            0xE0..=0xEF => DiagPriority::Critical,
            _ => DiagPriority::Volatile,
        }
    }
}

/// ArtDiagData — diagnostic text report.
#[derive(Debug, Clone)]
pub struct DiagData {
    pub priority: DiagPriority,
    pub text: String,
}

/// The full decoded-packet union. Deprecated MAC opcodes decode to
/// [`Packet::Deprecated`] so the dispatch table still accepts the frame
/// (spec.md §6: "deprecated MAC opcodes are ignored", not rejected).
#[derive(Debug, Clone)]
pub enum Packet {
    Poll(Poll),
    PollReply(Box<PollReply>),
    Dmx(Dmx),
    Nzs(Nzs),
    Vlc(Vlc),
    Sync(Sync),
    Address(Address),
    Input(Input),
    IpProg(IpProg),
    IpProgReply(IpProgReply),
    TodRequest(TodRequest),
    TodData(TodData),
    TodControl(TodControl),
    Rdm(Rdm),
    RdmSub(RdmSub),
    Command(Command),
    Trigger(Trigger),
    DataRequest(DataRequest),
    DataReply(DataReply),
    FirmwareMaster(FirmwareMaster),
    FirmwareReply(FirmwareReply),
    DiagData(DiagData),
    Deprecated,
}

impl Packet {
    pub fn opcode(&self) -> crate::opcode::OpCode {
        use crate::opcode::OpCode;
        match self {
            Packet::Poll(_) => OpCode::Poll,
            Packet::PollReply(_) => OpCode::PollReply,
            Packet::Dmx(_) => OpCode::Dmx,
            Packet::Nzs(_) => OpCode::Nzs,
            Packet::Vlc(_) => OpCode::Vlc,
            Packet::Sync(_) => OpCode::Sync,
            Packet::Address(_) => OpCode::Address,
            Packet::Input(_) => OpCode::Input,
            Packet::IpProg(_) => OpCode::IpProg,
            Packet::IpProgReply(_) => OpCode::IpProgReply,
            Packet::TodRequest(_) => OpCode::TodRequest,
            Packet::TodData(_) => OpCode::TodData,
            Packet::TodControl(_) => OpCode::TodControl,
            Packet::Rdm(_) => OpCode::Rdm,
            Packet::RdmSub(_) => OpCode::RdmSub,
            Packet::Command(_) => OpCode::Command,
            Packet::Trigger(_) => OpCode::Trigger,
            Packet::DataRequest(_) => OpCode::DataRequest,
            Packet::DataReply(_) => OpCode::DataReply,
            Packet::FirmwareMaster(_) => OpCode::FirmwareMaster,
            Packet::FirmwareReply(_) => OpCode::FirmwareReply,
            Packet::DiagData(_) => OpCode::DiagData,
            Packet::Deprecated => OpCode::MacMaster,
        }
    }
}
