//! Art-Net 4 node shell: owns the UDP socket, buffer pools, and the
//! receiver/logic/sender task graph plus a failsafe timer (spec.md §4.3).
//!
//! The pure protocol machine lives in `artnet-proto`; this crate is the
//! "external collaborator" side of spec.md §1's scope split — everything
//! that actually touches a socket, a timer, or (via `tracing`) a log.

pub mod bind;
pub mod callbacks;
pub mod error;
pub mod handle;
pub mod logic;
pub mod receiver;
pub mod sender;
pub mod timer;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use artnet_proto::config::NodeConfig;
use artnet_transport::{ArtnetSocket, BufferPool, PoolConfig};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::info;

pub use callbacks::Callbacks;
pub use error::{NodeError, Result};
pub use handle::NodeHandle;

/// A cooperative pause/resume gate for the receiver and failsafe timer
/// (spec.md §4.3 "Pause/resume is cooperative through a semaphore gate so
/// idle receivers consume no CPU").
#[derive(Clone)]
pub struct PauseGate {
    paused: Arc<AtomicBool>,
    notify: Arc<tokio::sync::Notify>,
}

impl PauseGate {
    fn new() -> Self {
        PauseGate { paused: Arc::new(AtomicBool::new(false)), notify: Arc::new(tokio::sync::Notify::new()) }
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.notify.notify_waiters();
    }

    async fn wait_resumed(&self) {
        while self.paused.load(Ordering::Acquire) {
            self.notify.notified().await;
        }
    }
}

/// Starts a node: binds the socket, allocates the buffer pools, spawns the
/// receiver/logic/sender/timer tasks, and returns a handle (spec.md §4.3
/// "Lifecycle").
pub async fn start(config: NodeConfig) -> Result<NodeHandle> {
    start_with_callbacks(config, Callbacks::default()).await
}

pub async fn start_with_callbacks(config: NodeConfig, callbacks: Callbacks) -> Result<NodeHandle> {
    let bind_addr = bind::resolve_socket_addr(&config);
    let socket = Arc::new(ArtnetSocket::bind(bind_addr).await?);
    info!(local = %socket.local_addr()?, "artnet node starting");

    let rx_pool = Arc::new(BufferPool::new(PoolConfig { count: config.rx_buffer.count, buffer_size: config.rx_buffer.size }));
    let tick_interval = config.failsafe.tick_interval;

    let running = Arc::new(AtomicBool::new(true));
    let pause = PauseGate::new();
    let start = Instant::now();

    let (rx_tx, rx_rx) = mpsc::channel(64);
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (action_tx, action_rx) = mpsc::channel(32);
    let (dmx_tx, dmx_rx) = mpsc::channel(64);

    let tick_rx = timer::spawn(tick_interval, start, running.clone(), pause.clone());

    tokio::spawn(receiver::run(socket.clone(), rx_pool.clone(), rx_tx, start, pause.clone(), running.clone()));

    let snapshot_waiters = Arc::new(DashMap::new());
    let state = artnet_proto::initial_state(config.clone());
    tokio::spawn(logic::run(state, rx_rx, tick_rx, cmd_rx, action_tx, dmx_tx, snapshot_waiters.clone(), running.clone()));

    tokio::spawn(sender::run(action_rx, socket, Arc::new(callbacks), running.clone()));

    Ok(NodeHandle {
        config,
        start,
        cmd_tx,
        dmx_rx: Arc::new(tokio::sync::Mutex::new(dmx_rx)),
        snapshot_waiters,
        snapshot_counter: Arc::new(AtomicU64::new(0)),
        running,
        pause,
        rx_pool,
    })
}
