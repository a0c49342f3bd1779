//! Shell-level error type (spec.md §7).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NodeError>;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("bind failed: {0}")]
    BindFailure(#[from] artnet_transport::TransportError),

    #[error(transparent)]
    InvalidCommand(#[from] artnet_proto::CommandError),

    #[error("snapshot request timed out")]
    Timeout,

    #[error("node is already stopped")]
    AlreadyStopped,
}
