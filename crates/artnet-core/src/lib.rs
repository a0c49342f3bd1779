//! Art-Net 4 wire codec and data model.
//!
//! This crate has no knowledge of sockets, tasks, or time — it only knows
//! how to turn bytes into [`packet::Packet`] values and back. The protocol
//! state machine built on top of it lives in `artnet-proto`.

pub mod codec;
pub mod error;
pub mod field;
pub mod flags;
pub mod opcode;
pub mod packet;
pub mod port_address;

pub use codec::{decode, encode};
pub use error::{Error, Result};
pub use opcode::OpCode;
pub use packet::Packet;
pub use port_address::PortAddress;
