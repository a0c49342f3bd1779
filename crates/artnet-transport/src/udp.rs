//! UDP socket wrapper (spec.md §4.3 "Receiver"/"Sender").

use std::net::{SocketAddr, SocketAddrV4};
use std::sync::Arc;

use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::error::{Result, TransportError};

/// A bound Art-Net UDP socket, shared between the receiver and sender
/// tasks (spec.md §5: "single consumer per direction in practice — one
/// receiver, one sender").
pub struct ArtnetSocket {
    socket: Arc<UdpSocket>,
}

impl ArtnetSocket {
    /// Binds to `addr` (default `0.0.0.0:6454`, spec.md §4.3 "Lifecycle")
    /// and enables broadcast sends (ArtPoll replies target individual
    /// controllers, but ArtPoll itself is commonly sent to the limited
    /// broadcast address by controllers, not by this node).
    pub async fn bind(addr: SocketAddrV4) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await.map_err(TransportError::BindFailed)?;
        socket.set_broadcast(true).map_err(TransportError::BindFailed)?;
        debug!(local = %socket.local_addr().unwrap(), "udp socket bound");
        Ok(ArtnetSocket { socket: Arc::new(socket) })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket.local_addr().map_err(TransportError::Io)
    }

    /// Blocking receive into `buf`, returning the decoded-ready slice
    /// length and sender address. Errors are logged by the caller
    /// (spec.md §4.3: "on malformed payload, release the buffer and log at
    /// warn" — this layer only surfaces the raw I/O error).
    pub async fn recv_into(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await.map_err(TransportError::ReceiveFailed)
    }

    pub async fn send_to(&self, data: &[u8], target: SocketAddr) -> Result<()> {
        self.socket.send_to(data, target).await.map_err(TransportError::SendFailed)?;
        Ok(())
    }

    /// A cheap handle clone sharing the same underlying socket — used so
    /// the receiver and sender tasks can each hold one without an `Arc`
    /// leaking into their public signatures.
    pub fn handle(&self) -> ArtnetSocket {
        ArtnetSocket { socket: self.socket.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_and_send_recv_round_trip() {
        let server = ArtnetSocket::bind(SocketAddrV4::new(std::net::Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let client = ArtnetSocket::bind(SocketAddrV4::new(std::net::Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let server_addr = server.local_addr().unwrap();

        client.send_to(b"Art-Net\0test", server_addr).await.unwrap();

        let mut buf = [0u8; 64];
        let (len, from) = server.recv_into(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"Art-Net\0test");
        assert_eq!(from.port(), client.local_addr().unwrap().port());
    }
}
