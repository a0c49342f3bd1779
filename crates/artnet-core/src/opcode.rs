//! OpCode table
//!
//! Art-Net OpCodes are little-endian 16-bit values at bytes 8-9 of every
//! frame. Values below are the ones the Artistic Licence Art-Net 4 spec
//! assigns; `ArtDataRequest`/`ArtDataReply` are not standardized outside the
//! vendor-extension range, so this node reserves a private pair inside it
//! (see SPEC_FULL.md §4.1).

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum OpCode {
    Poll = 0x2000,
    PollReply = 0x2100,
    DiagData = 0x2300,
    Command = 0x2400,
    Dmx = 0x5000,
    Nzs = 0x5100,
    Sync = 0x5200,
    Vlc = 0x5300,
    Address = 0x6000,
    Input = 0x7000,
    TodRequest = 0x8000,
    TodData = 0x8100,
    TodControl = 0x8200,
    Rdm = 0x8300,
    RdmSub = 0x8400,
    DataRequest = 0x9050,
    DataReply = 0x9051,
    TimeCode = 0x9700,
    TimeSync = 0x9800,
    Trigger = 0x9900,
    Directory = 0x9A00,
    DirectoryReply = 0x9B00,
    MacMaster = 0xF000,
    MacSlave = 0xF100,
    FirmwareMaster = 0xF200,
    FirmwareReply = 0xF300,
    IpProg = 0xF800,
    IpProgReply = 0xF900,
}

impl OpCode {
    pub fn from_u16(value: u16) -> Result<Self, Error> {
        Ok(match value {
            0x2000 => OpCode::Poll,
            0x2100 => OpCode::PollReply,
            0x2300 => OpCode::DiagData,
            0x2400 => OpCode::Command,
            0x5000 => OpCode::Dmx,
            0x5100 => OpCode::Nzs,
            0x5200 => OpCode::Sync,
            0x5300 => OpCode::Vlc,
            0x6000 => OpCode::Address,
            0x7000 => OpCode::Input,
            0x8000 => OpCode::TodRequest,
            0x8100 => OpCode::TodData,
            0x8200 => OpCode::TodControl,
            0x8300 => OpCode::Rdm,
            0x8400 => OpCode::RdmSub,
            0x9050 => OpCode::DataRequest,
            0x9051 => OpCode::DataReply,
            0x9700 => OpCode::TimeCode,
            0x9800 => OpCode::TimeSync,
            0x9900 => OpCode::Trigger,
            0x9A00 => OpCode::Directory,
            0x9B00 => OpCode::DirectoryReply,
            0xF000 => OpCode::MacMaster,
            0xF100 => OpCode::MacSlave,
            0xF200 => OpCode::FirmwareMaster,
            0xF300 => OpCode::FirmwareReply,
            0xF800 => OpCode::IpProg,
            0xF900 => OpCode::IpProgReply,
            other => return Err(Error::UnsupportedOpCode(other)),
        })
    }

    pub fn to_u16(self) -> u16 {
        self as u16
    }

    /// Opcodes the protocol machine recognizes but deliberately ignores —
    /// deprecated MAC-layer packets (spec.md §6).
    pub fn is_deprecated(self) -> bool {
        matches!(self, OpCode::MacMaster | OpCode::MacSlave)
    }

    /// Whether this opcode's frames carry a big-endian protocol-version field
    /// right after the opcode (all opcodes do in Art-Net 4 except none —
    /// kept as a hook per spec.md §4.1 "for most opcodes").
    pub fn has_protocol_version(self) -> bool {
        true
    }
}
