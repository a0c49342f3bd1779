//! ArtDmx / ArtNzs / ArtVlc handlers (spec.md §4.2, §8 invariants 8-11,
//! scenarios B and C).

use std::net::{Ipv4Addr, SocketAddrV4};

use artnet_core::packet::{Dmx, Nzs, Vlc};
use artnet_core::port_address::PortAddress;

use crate::config::SyncMode;
use crate::effect::{CallbackEffect, CallbackKey, CallbackPayload, Effect};
use crate::event::Timestamp;
use crate::merge;
use crate::state::{NodeState, StagedFrame, SyncPhase};

fn dmx_callback_effects(
    port_address: PortAddress,
    sequence: u8,
    data: bytes::Bytes,
    length: u16,
    synced: bool,
    vlc: bool,
) -> Vec<Effect> {
    vec![
        Effect::DmxFrame { port_address, sequence, data: data.clone(), length },
        Effect::Callback(CallbackEffect {
            key: CallbackKey::Dmx,
            payload: CallbackPayload::Dmx {
                port_address,
                sequence,
                data,
                length,
                synced,
                failsafe: false,
                failsafe_mode: None,
                vlc,
            },
        }),
    ]
}

/// Routes a freshly received frame through the merge/sync machine common to
/// ArtDmx and ArtNzs (spec.md §4.2: "ArtNzs. Same as ArtDmx...").
fn route_frame(
    state: &mut NodeState,
    port_address: PortAddress,
    sender_host: Ipv4Addr,
    physical: u8,
    sequence: u8,
    data: bytes::Bytes,
    length: u16,
    now: Timestamp,
) -> Vec<Effect> {
    // "fall back to immediate for an individual frame if now - last-sync-at >
    // artsync-timeout-ns" (spec.md §4.2 "State machine for ArtSync").
    let timed_out = state
        .sync
        .last_sync_at
        .is_some_and(|last| now.saturating_sub(last) > state.config.artsync_timeout);
    let stage_this_frame = state.config.sync.mode == SyncMode::ArtSync && !timed_out;

    if stage_this_frame {
        if state.sync.phase == SyncPhase::Immediate {
            state.sync.phase = SyncPhase::ArtSyncArmed;
        }
        state.sync.staging.insert(port_address, StagedFrame { packet: data, sequence, length, received_at: now });
        prune_staged(state, now);
        return Vec::new();
    }

    state.sync.phase = SyncPhase::Immediate;
    let port = state.dmx_port_mut(port_address);
    let (composed, out_len) = merge::merge_source(port, (sender_host, physical), data, length, now);

    // "engaged -> passive on any fresh ArtDmx frame for the port"
    // (spec.md §4.2 "State machine for failsafe").
    if let Some(fs) = state.failsafe.get_mut(&port_address) {
        fs.phase = crate::state::FailsafePhase::Passive;
        fs.engaged_at = None;
    }

    dmx_callback_effects(port_address, sequence, composed, out_len, false, false)
}

fn prune_staged(state: &mut NodeState, now: Timestamp) {
    let ttl = state.config.sync.buffer_ttl;
    state.sync.staging.retain(|_, frame| now.saturating_sub(frame.received_at) < ttl);
}

pub fn handle_dmx(state: &mut NodeState, dmx: &Dmx, sender: SocketAddrV4, now: Timestamp) -> Vec<Effect> {
    state.stats.rx_artdmx += 1;
    route_frame(
        state,
        dmx.port_address,
        *sender.ip(),
        dmx.physical,
        dmx.sequence,
        dmx.data.clone(),
        dmx.length,
        now,
    )
}

pub fn handle_nzs(state: &mut NodeState, nzs: &Nzs, sender: SocketAddrV4, now: Timestamp) -> Vec<Effect> {
    state.stats.rx_artnzs += 1;
    if let (Some(last), Some(refresh_hz)) =
        (state.dmx.get(&nzs.port_address).and_then(|p| p.last_nzs_at), state.config.refresh_rate_hz)
    {
        let min_gap = std::time::Duration::from_secs_f64(1.0 / refresh_hz);
        if now.saturating_sub(last) < min_gap {
            state.stats.rx_artnzs_throttled += 1;
            return Vec::new();
        }
    }
    state.dmx_port_mut(nzs.port_address).last_nzs_at = Some(now);
    route_frame(
        state,
        nzs.port_address,
        *sender.ip(),
        0,
        nzs.sequence,
        nzs.data.clone(),
        nzs.length,
        now,
    )
}

pub fn handle_vlc(_state: &mut NodeState, vlc: &Vlc, _sender: SocketAddrV4, _now: Timestamp) -> Vec<Effect> {
    vec![Effect::Callback(CallbackEffect {
        key: CallbackKey::Dmx,
        payload: CallbackPayload::Dmx {
            port_address: vlc.port_address,
            sequence: vlc.sequence,
            data: vlc.data.clone(),
            length: vlc.length,
            synced: false,
            failsafe: false,
            failsafe_mode: None,
            vlc: true,
        },
    })]
}
