//! Field-level read/write primitives shared by every opcode's codec.
//!
//! These are the building blocks the declarative per-opcode specs in
//! [`crate::codec`] are written against: each one knows how to read/write a
//! single Art-Net field type (fixed-width integers in a specific
//! endianness, NUL-padded ASCII strings, IPv4/MAC addresses, RDM UIDs) and
//! nothing about any particular opcode's layout.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

pub fn need(buf_len: usize, offset: usize, n: usize, total_needed: usize) -> Result<()> {
    if offset + n > buf_len {
        return Err(Error::Truncated {
            needed: total_needed,
            have: buf_len,
        });
    }
    Ok(())
}

/// Read a `u16` little-endian (used for OpCode and several Art-Net 4 fields).
pub fn read_u16_le(buf: &[u8]) -> u16 {
    u16::from_le_bytes([buf[0], buf[1]])
}

/// Read a `u16` big-endian (protocol version, ArtDmx length, ...).
pub fn read_u16_be(buf: &[u8]) -> u16 {
    u16::from_be_bytes([buf[0], buf[1]])
}

/// Read a `u32` big-endian (ArtFirmwareMaster's 32-bit length field).
pub fn read_u32_be(buf: &[u8]) -> u32 {
    u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])
}

pub fn put_u16_le(out: &mut BytesMut, v: u16) {
    out.put_u16_le(v);
}

pub fn put_u16_be(out: &mut BytesMut, v: u16) {
    out.put_u16(v);
}

pub fn put_u32_be(out: &mut BytesMut, v: u32) {
    out.put_u32(v);
}

/// Decode a NUL-padded fixed-width ASCII string field, stopping at the first
/// NUL (or the field width, whichever comes first). Non-ASCII bytes are
/// tolerated on read (some nodes populate short-name with raw Latin-1) but
/// rejected on write.
pub fn read_fixed_string(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

/// Encode a string into a fixed-width NUL-padded field. The last byte of the
/// field is always NUL (spec.md §4.1), so the usable length is `width - 1`.
pub fn write_fixed_string(out: &mut BytesMut, field: &'static str, s: &str, width: usize) -> Result<()> {
    if !s.is_ascii() {
        return Err(Error::NotAscii(field));
    }
    if s.len() > width - 1 {
        return Err(Error::FieldTooLong {
            field,
            max: width - 1,
        });
    }
    let start = out.len();
    out.put_slice(s.as_bytes());
    out.resize(start + width, 0);
    Ok(())
}

/// Read a fixed-width byte array field as an owned copy.
pub fn read_fixed_bytes<const N: usize>(buf: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[..N]);
    out
}

pub fn read_ipv4(buf: &[u8]) -> std::net::Ipv4Addr {
    std::net::Ipv4Addr::new(buf[0], buf[1], buf[2], buf[3])
}

pub fn put_ipv4(out: &mut BytesMut, addr: std::net::Ipv4Addr) {
    out.put_slice(&addr.octets());
}

pub fn read_mac(buf: &[u8]) -> [u8; 6] {
    read_fixed_bytes::<6>(buf)
}

/// A 6-byte RDM UID (2-byte manufacturer ID + 4-byte device ID).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RdmUid(pub [u8; 6]);

impl RdmUid {
    pub fn from_bytes(buf: &[u8]) -> Self {
        RdmUid(read_fixed_bytes::<6>(buf))
    }

    pub fn write(&self, out: &mut BytesMut) {
        out.put_slice(&self.0);
    }

    pub fn manufacturer_id(&self) -> u16 {
        u16::from_be_bytes([self.0[0], self.0[1]])
    }

    pub fn device_id(&self) -> u32 {
        u32::from_be_bytes([self.0[2], self.0[3], self.0[4], self.0[5]])
    }
}

impl std::fmt::Display for RdmUid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04X}:{:08X}",
            self.manufacturer_id(),
            self.device_id()
        )
    }
}

/// A borrowed/shared view into the trailing variable-length payload of a
/// frame (DMX data, RDM PDU, diagnostic/command text). Backed by
/// [`bytes::Bytes`] so it is reference-counted and `'static` — see
/// SPEC_FULL.md §4.3 for why that replaces a literal borrow.
pub type Payload = Bytes;

/// Slice a `Payload` out of a decoded frame's source buffer without copying.
pub fn slice_payload(buf: &Bytes, offset: usize) -> Payload {
    buf.slice(offset..)
}

pub fn slice_payload_len(buf: &Bytes, offset: usize, len: usize) -> Payload {
    buf.slice(offset..offset + len)
}
