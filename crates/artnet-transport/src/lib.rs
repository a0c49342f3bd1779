//! UDP socket, pooled buffers, and broadcast-policy enforcement for the
//! Art-Net 4 node's I/O shell (spec.md §4.3, part one of two — the
//! receiver/logic/sender task graph itself lives in `artnet-node`).

pub mod error;
pub mod policy;
pub mod pool;
pub mod udp;

pub use error::TransportError;
pub use pool::{BufferPool, PoolConfig};
pub use udp::ArtnetSocket;
