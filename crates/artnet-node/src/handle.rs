//! The lifecycle handle returned by [`crate::start`] (spec.md §4.3
//! "Lifecycle": "returns a handle with `{stop!, pause!, resume!, config}`").

use std::net::SocketAddrV4;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use artnet_proto::config::NodeConfig;
use artnet_proto::effect::Effect;
use artnet_proto::event::{Command, Event, SnapshotKey, SnapshotReplyToken, SnapshotValue};
use artnet_proto::config::NodeIdentity;
use artnet_proto::state::{DmxPortState, FailsafePortState, Stats};
use artnet_transport::BufferPool;
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};

use crate::error::{NodeError, Result};
use crate::PauseGate;

/// A live Art-Net node. Cloning shares the same underlying channels and
/// running flag — any clone can stop, pause, or resume the node.
#[derive(Clone)]
pub struct NodeHandle {
    pub(crate) config: NodeConfig,
    pub(crate) start: Instant,
    pub(crate) cmd_tx: mpsc::Sender<Event>,
    pub(crate) dmx_rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Effect>>>,
    pub(crate) snapshot_waiters: Arc<DashMap<u64, oneshot::Sender<Vec<SnapshotValue>>>>,
    pub(crate) snapshot_counter: Arc<AtomicU64>,
    pub(crate) running: Arc<std::sync::atomic::AtomicBool>,
    pub(crate) pause: PauseGate,
    pub(crate) rx_pool: Arc<BufferPool>,
}

impl NodeHandle {
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Idempotent: sets the closed flag and closes the buffer pool so a
    /// second call is a harmless no-op (spec.md §4.3 "stop is idempotent").
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.rx_pool.close();
    }

    pub fn pause(&self) {
        self.pause.pause();
    }

    pub fn resume(&self) {
        self.pause.resume();
    }

    async fn send_command(&self, command: Command) -> Result<()> {
        command.validate().map_err(NodeError::InvalidCommand)?;
        let timestamp = self.start.elapsed();
        self.cmd_tx
            .send(Event::Command { command, timestamp })
            .await
            .map_err(|_| NodeError::AlreadyStopped)
    }

    pub async fn send_dmx(&self, port_address: artnet_core::port_address::PortAddress, data: bytes::Bytes, target: SocketAddrV4) -> Result<()> {
        self.send_command(Command::SendDmx { port_address, data, target }).await
    }

    pub async fn send_rdm(&self, port_address: artnet_core::port_address::PortAddress, data: bytes::Bytes, target: SocketAddrV4) -> Result<()> {
        self.send_command(Command::SendRdm { port_address, data, target }).await
    }

    pub async fn send_sync(&self, target: Option<SocketAddrV4>) -> Result<()> {
        self.send_command(Command::SendSync { target }).await
    }

    pub async fn send_diagnostic(&self, priority: artnet_core::packet::DiagPriority, text: impl Into<String>) -> Result<()> {
        self.send_command(Command::SendDiagnostic { priority, text: text.into() }).await
    }

    pub async fn apply_state(&self, patch: artnet_proto::state::StatePatch) -> Result<()> {
        self.send_command(Command::ApplyState(Box::new(patch))).await
    }

    /// Requests a consistent snapshot of the given keys. The reply is
    /// produced by the logic task, routed through the same channel as
    /// everything else (SPEC_FULL.md §4.2 "Snapshot handling" — no
    /// side-channel bypass).
    pub async fn snapshot(&self, keys: Vec<SnapshotKey>, timeout: Duration) -> Result<Vec<SnapshotValue>> {
        let id = self.snapshot_counter.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.snapshot_waiters.insert(id, tx);
        self.cmd_tx
            .send(Event::Snapshot { keys, reply: SnapshotReplyToken(id) })
            .await
            .map_err(|_| NodeError::AlreadyStopped)?;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(values)) => Ok(values),
            _ => {
                self.snapshot_waiters.remove(&id);
                Err(NodeError::Timeout)
            }
        }
    }

    pub async fn stats(&self, timeout: Duration) -> Result<Stats> {
        let values = self.snapshot(vec![SnapshotKey::Stats], timeout).await?;
        match values.into_iter().next() {
            Some(SnapshotValue::Stats(s)) => Ok(s),
            _ => Err(NodeError::Timeout),
        }
    }

    pub async fn identity(&self, timeout: Duration) -> Result<NodeIdentity> {
        let values = self.snapshot(vec![SnapshotKey::Identity], timeout).await?;
        match values.into_iter().next() {
            Some(SnapshotValue::Identity(i)) => Ok(i),
            _ => Err(NodeError::Timeout),
        }
    }

    pub async fn dmx_port_state(&self, port_address: artnet_core::port_address::PortAddress, timeout: Duration) -> Result<Option<DmxPortState>> {
        let values = self.snapshot(vec![SnapshotKey::DmxState(port_address)], timeout).await?;
        match values.into_iter().next() {
            Some(SnapshotValue::DmxState(s)) => Ok(s),
            _ => Err(NodeError::Timeout),
        }
    }

    pub async fn failsafe_port_state(&self, port_address: artnet_core::port_address::PortAddress, timeout: Duration) -> Result<Option<FailsafePortState>> {
        let values = self.snapshot(vec![SnapshotKey::FailsafeState(port_address)], timeout).await?;
        match values.into_iter().next() {
            Some(SnapshotValue::FailsafeState(s)) => Ok(s),
            _ => Err(NodeError::Timeout),
        }
    }

    /// The actual output DMX frames the node has computed (post-merge,
    /// post-failsafe). Out of scope per spec.md's Non-goals is forwarding
    /// these onto a serial DMX backend; this channel is how an external
    /// collaborator can pick them up instead.
    pub async fn recv_dmx_frame(&self) -> Option<Effect> {
        self.dmx_rx.lock().await.recv().await
    }
}
