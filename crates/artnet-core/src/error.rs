//! Codec error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while decoding or encoding an Art-Net frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Frame did not start with "Art-Net\0"
    #[error("invalid Art-Net identifier")]
    InvalidIdentifier,

    /// Frame was shorter than the minimum size for its opcode
    #[error("truncated frame: need {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },

    /// Bytes 8-9 did not map to a supported OpCode
    #[error("unsupported opcode: 0x{0:04x}")]
    UnsupportedOpCode(u16),

    /// Protocol version field (bytes 10-11) was not a version this node understands
    #[error("unsupported protocol version: {0}")]
    UnsupportedProtocolVersion(u16),

    /// A port-address component was out of its legal range
    #[error("port-address out of range: net={net} sub_net={sub_net} universe={universe}")]
    PortAddressOutOfRange { net: u8, sub_net: u8, universe: u8 },

    /// ArtDmx/ArtNzs payload length was not in 1..=512 (after odd-length padding)
    #[error("dmx payload length out of range: {0} (must be 1..=512)")]
    DmxLengthOutOfRange(usize),

    /// ArtNzs carried a reserved start code (0 or 0xCC, which belong to ArtDmx/RDM)
    #[error("invalid Art-Nzs start code: 0x{0:02x}")]
    InvalidNzsStartCode(u8),

    /// A fixed-length ASCII field contained non-ASCII bytes
    #[error("field {0} is not valid ASCII")]
    NotAscii(&'static str),

    /// A fixed-length field's source string was longer than its wire width
    #[error("field {field} exceeds max length {max}")]
    FieldTooLong { field: &'static str, max: usize },

    /// ArtFirmwareMaster's BlockType byte was not one of the known block kinds
    #[error("invalid firmware block type: 0x{0:02x}")]
    InvalidFirmwareBlockType(u8),

    /// ArtFirmwareReply's Status byte was not one of the known status values
    #[error("invalid firmware reply status: 0x{0:02x}")]
    InvalidFirmwareStatus(u8),
}
