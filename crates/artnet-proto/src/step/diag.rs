//! ArtDiagData handling: acknowledgements, subscriber fan-out and rate
//! limiting (spec.md §4.2 "ArtDiagData").

use std::net::SocketAddrV4;

use artnet_core::packet::{DiagData, DiagPriority, Packet};

use crate::effect::Effect;
use crate::event::Timestamp;
use crate::state::NodeState;

/// Builds a one-off ArtDiagData effect targeted at `target` — used for
/// ArtAddress/ArtIpProg/ArtCommand acknowledgements.
pub fn ack_effect(target: SocketAddrV4, priority: DiagPriority, text: impl Into<String>) -> Effect {
    Effect::TxPacket {
        packet: Packet::DiagData(DiagData { priority, text: text.into() }),
        target,
        broadcast: false,
    }
}

/// Routes an incoming ArtDiagData to subscribers whose priority threshold is
/// met, honoring unicast/broadcast preference and a per-priority rate limit
/// (spec.md §4.2 "ArtDiagData").
pub fn handle_diag_data(state: &mut NodeState, diag: &DiagData, now: Timestamp) -> Vec<Effect> {
    state.stats.rx_artdiagdata += 1;
    let rate_limit_hz = state.config.diagnostics.rate_limit_hz.max(1) as f64;
    let min_gap = std::time::Duration::from_secs_f64(1.0 / rate_limit_hz);

    let mut effects = Vec::new();
    for (key, record) in state.peers.clone() {
        if !record.diag_subscriber {
            continue;
        }
        if record.diag_priority > diag.priority {
            continue;
        }
        if now.saturating_sub(record.updated_at) < min_gap && record.updated_at != std::time::Duration::ZERO {
            state.stats.diagnostics_throttled += 1;
            continue;
        }
        let target = if record.diag_unicast {
            SocketAddrV4::new(key.0, key.1)
        } else if let Some((host, port)) = state.config.diagnostics.broadcast_target {
            SocketAddrV4::new(host, port)
        } else {
            SocketAddrV4::new(key.0, key.1)
        };
        state.stats.diagnostics_sent += 1;
        effects.push(ack_effect(target, diag.priority, diag.text.clone()));
        if let Some(r) = state.peers.get_mut(&key) {
            r.updated_at = now;
        }
    }
    effects
}
