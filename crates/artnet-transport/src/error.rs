//! Transport error types (spec.md §7).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("bind failed: {0}")]
    BindFailed(std::io::Error),

    #[error("send failed: {0}")]
    SendFailed(std::io::Error),

    #[error("receive failed: {0}")]
    ReceiveFailed(std::io::Error),

    #[error("buffer pool closed")]
    PoolClosed,

    #[error("broadcast-forbidden opcode {opcode:?} targeted {target}")]
    PolicyViolation {
        opcode: artnet_core::opcode::OpCode,
        target: std::net::SocketAddr,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
