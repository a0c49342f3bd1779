//! Sender task: runs the I/O half of every pure effect (spec.md §4.3
//! "Sender").

use std::net::SocketAddrV4;
use std::sync::Arc;
use std::time::Duration;

use artnet_core::packet::Packet;
use artnet_proto::effect::CallbackEffect;
use artnet_transport::{policy, ArtnetSocket};
use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::callbacks::Callbacks;

/// An I/O action derived from a pure [`artnet_proto::Effect`].
pub enum Action {
    Send { packet: Packet, target: SocketAddrV4, broadcast: bool },
    Callback(CallbackEffect),
    Delayed { delay: Duration, action: Box<Action> },
}

/// Reads actions from a bounded channel (spec.md §5: "actions 32") and
/// performs the matching I/O. Delayed actions sleep on a detached task so
/// they never block the channel; a stopped node drops them silently.
pub async fn run(
    mut actions: mpsc::Receiver<Action>,
    socket: Arc<ArtnetSocket>,
    callbacks: Arc<Callbacks>,
    running: Arc<std::sync::atomic::AtomicBool>,
) {
    while let Some(action) = actions.recv().await {
        if !running.load(std::sync::atomic::Ordering::Acquire) {
            continue; // stopping: swallow the work silently
        }
        dispatch(action, &socket, &callbacks, &running).await;
    }
}

fn dispatch<'a>(
    action: Action,
    socket: &'a Arc<ArtnetSocket>,
    callbacks: &'a Arc<Callbacks>,
    running: &'a Arc<std::sync::atomic::AtomicBool>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
    Box::pin(async move {
        match action {
            Action::Send { packet, target, broadcast } => {
                let opcode = packet.opcode();
                if let Err(e) = policy::check(opcode, std::net::SocketAddr::V4(target), broadcast) {
                    error!(%e, "dropping policy-violating send");
                    return;
                }
                let bytes = artnet_core::codec::encode(&packet);
                if let Err(e) = socket.send_to(&bytes, std::net::SocketAddr::V4(target)).await {
                    warn!(%e, %target, "udp send failed");
                }
            }
            Action::Callback(effect) => {
                // Dispatched on this I/O task; any callback failure is
                // caught by `Callbacks::dispatch` and logged, never
                // propagated (spec.md §5 "Cancellation semantics").
                callbacks.dispatch(effect).await;
            }
            Action::Delayed { delay, action } => {
                let running = running.clone();
                let socket = socket.clone();
                let callbacks = callbacks.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if !running.load(std::sync::atomic::Ordering::Acquire) {
                        return;
                    }
                    dispatch(*action, &socket, &callbacks, &running).await;
                });
            }
        }
    })
}
