//! Logic task: the sole mutator of [`NodeState`], the sole consumer of the
//! rx/tick/command channels (spec.md §4.3 "Logic process", §5).

use std::sync::Arc;
use std::time::Duration;

use artnet_proto::effect::{CallbackPayload, Effect};
use artnet_proto::event::Event;
use artnet_proto::state::NodeState;
use dashmap::DashMap;
use rand::Rng;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::sender::Action;

pub async fn run(
    mut state: NodeState,
    mut rx_rx: mpsc::Receiver<Event>,
    mut tick_rx: watch::Receiver<Duration>,
    mut cmd_rx: mpsc::Receiver<Event>,
    action_tx: mpsc::Sender<Action>,
    dmx_tx: mpsc::Sender<Effect>,
    snapshot_waiters: Arc<DashMap<u64, oneshot::Sender<Vec<artnet_proto::event::SnapshotValue>>>>,
    running: Arc<std::sync::atomic::AtomicBool>,
) {
    let (requeue_tx, mut requeue_rx) = mpsc::channel::<Event>(32);

    while running.load(std::sync::atomic::Ordering::Acquire) {
        let event = tokio::select! {
            biased;
            Some(e) = rx_rx.recv() => e,
            Some(e) = requeue_rx.recv() => e,
            changed = tick_rx.changed() => {
                if changed.is_err() { break; }
                Event::Tick { now: *tick_rx.borrow() }
            }
            Some(e) = cmd_rx.recv() => e,
            else => break,
        };

        let (next_state, effects) = artnet_proto::step(state, event);
        state = next_state;

        for effect in effects {
            apply_effect(effect, &action_tx, &dmx_tx, &snapshot_waiters, &requeue_tx).await;
        }
    }
    info!("logic task stopped");
}

async fn apply_effect(
    effect: Effect,
    action_tx: &mpsc::Sender<Action>,
    dmx_tx: &mpsc::Sender<Effect>,
    snapshot_waiters: &Arc<DashMap<u64, oneshot::Sender<Vec<artnet_proto::event::SnapshotValue>>>>,
    requeue_tx: &mpsc::Sender<Event>,
) {
    match effect {
        Effect::TxPacket { packet, target, broadcast } => {
            let _ = action_tx.send(Action::Send { packet, target, broadcast }).await;
        }
        Effect::TxPacketJittered { packet, target, max_delay } => {
            let delay = if max_delay.is_zero() {
                max_delay
            } else {
                Duration::from_millis(rand::thread_rng().gen_range(0..=max_delay.as_millis() as u64))
            };
            let action = Action::Send { packet, target, broadcast: false };
            let _ = action_tx.send(Action::Delayed { delay, action: Box::new(action) }).await;
        }
        Effect::Callback(cb) => {
            if let CallbackPayload::Snapshot { token, values } = &cb.payload {
                if let Some((_, reply)) = snapshot_waiters.remove(&token.0) {
                    let _ = reply.send(values.clone());
                    return;
                }
            }
            let _ = action_tx.send(Action::Callback(cb)).await;
        }
        Effect::Schedule { delay, event } => {
            let requeue_tx = requeue_tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = requeue_tx.send(*event).await;
            });
        }
        Effect::Log { level, message } => log_effect(level, message),
        Effect::DmxFrame { .. } => {
            let _ = dmx_tx.try_send(effect);
        }
    }
}

fn log_effect(level: artnet_proto::effect::LogLevel, message: String) {
    use artnet_proto::effect::LogLevel;
    match level {
        LogLevel::Debug => debug!("{message}"),
        LogLevel::Info => info!("{message}"),
        LogLevel::Warn => tracing::warn!("{message}"),
        LogLevel::Error => tracing::error!("{message}"),
    }
}
