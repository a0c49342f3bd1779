//! Receiver task (spec.md §4.3 "Receiver").

use std::sync::Arc;
use std::time::Instant;

use artnet_core::codec;
use artnet_proto::event::Event;
use artnet_transport::{ArtnetSocket, BufferPool};
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::warn;

use crate::PauseGate;

pub async fn run(
    socket: Arc<ArtnetSocket>,
    pool: Arc<BufferPool>,
    events: mpsc::Sender<Event>,
    start: Instant,
    pause: PauseGate,
    running: Arc<std::sync::atomic::AtomicBool>,
) {
    while running.load(std::sync::atomic::Ordering::Acquire) {
        pause.wait_resumed().await;

        let mut buf = match pool.borrow().await {
            Ok(buf) => buf,
            Err(_) => break, // pool closed: node is stopping
        };

        let (len, from) = match socket.recv_into(&mut buf).await {
            Ok(pair) => pair,
            Err(_) => {
                // Stop closes the socket, which wakes this call with an
                // error the loop swallows (spec.md §4.3 "Stop").
                pool.release(buf);
                break;
            }
        };
        let std::net::SocketAddr::V4(sender) = from else {
            pool.release(buf);
            continue; // Art-Net 4 is IPv4-only
        };

        let mut data = Bytes::from(buf);
        data.truncate(len);
        // The pool slot's allocation just moved into `data`; release
        // replenishes it with a fresh buffer rather than reclaiming this
        // one (artnet-transport::pool, see DESIGN.md).
        pool.release(Vec::new());

        match codec::decode(data) {
            Ok(packet) => {
                let timestamp = start.elapsed();
                if events.send(Event::Rx { packet, sender, timestamp }).await.is_err() {
                    break; // logic stage gone: channel closed
                }
            }
            Err(e) => {
                warn!(%e, %sender, "malformed Art-Net frame");
            }
        }
    }
}
