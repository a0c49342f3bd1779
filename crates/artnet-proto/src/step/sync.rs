//! ArtSync handler (spec.md §4.2 "ArtSync", §8 invariant 11, scenario C).

use std::net::SocketAddrV4;

use artnet_core::packet::Sync;

use crate::effect::{CallbackEffect, CallbackKey, CallbackPayload, Effect};
use crate::event::Timestamp;
use crate::state::{NodeState, SyncPhase};

pub fn handle_sync(state: &mut NodeState, _sync: &Sync, _sender: SocketAddrV4, now: Timestamp) -> Vec<Effect> {
    state.stats.rx_artsync += 1;
    state.sync.last_sync_at = Some(now);

    // Art-Net 4: ArtSync must be ignored while the node is merging multiple
    // sources on any port (spec.md §9 Open Question 1: staged frames are kept,
    // not dropped, for the next sync that arrives once merging clears).
    if state.dmx.values().any(|p| p.is_merging()) {
        return vec![Effect::Callback(CallbackEffect {
            key: CallbackKey::Sync,
            payload: CallbackPayload::Sync { ignored: true },
        })];
    }

    let ttl = state.config.sync.buffer_ttl;
    let fresh: Vec<_> = state
        .sync
        .staging
        .iter()
        .filter(|(_, frame)| now.saturating_sub(frame.received_at) < ttl)
        .map(|(&pa, frame)| (pa, frame.clone()))
        .collect();

    let mut effects = Vec::with_capacity(fresh.len() * 2 + 1);
    for (port_address, frame) in fresh {
        effects.push(Effect::DmxFrame {
            port_address,
            sequence: frame.sequence,
            data: frame.packet.clone(),
            length: frame.length,
        });
        effects.push(Effect::Callback(CallbackEffect {
            key: CallbackKey::Dmx,
            payload: CallbackPayload::Dmx {
                port_address,
                sequence: frame.sequence,
                data: frame.packet,
                length: frame.length,
                synced: true,
                failsafe: false,
                failsafe_mode: None,
                vlc: false,
            },
        }));
    }
    state.sync.staging.clear();
    state.sync.phase = SyncPhase::ArtSyncArmed;
    effects
}
