//! Tick handler — merge-timeout purge, keepalive re-emit, failsafe engagement
//! (spec.md §4.2 "Tick", §8 invariant 12, scenario D).

use bytes::{Bytes, BytesMut};

use crate::effect::{CallbackEffect, CallbackKey, CallbackPayload, Effect, LogLevel};
use crate::event::Timestamp;
use crate::merge;
use crate::state::{FailsafePhase, NodeState};

pub fn handle_tick(state: &mut NodeState, now: Timestamp) -> Vec<Effect> {
    let mut effects = Vec::new();
    let merge_timeout = state.config.merge_timeout;
    let keepalive_interval = state.config.keepalive_interval;
    let failsafe_cfg = state.config.failsafe;
    let supports_failsafe = state.status3().supports_failsafe();
    let failsafe_mode = state.failsafe_mode();

    let port_addresses: Vec<_> = state.dmx.keys().copied().collect();
    for port_address in port_addresses {
        let port = state.dmx.get_mut(&port_address).unwrap();
        merge::purge_stale_sources(port, now, merge_timeout);

        if let Some(output) = &port.last_output {
            if now.saturating_sub(output.updated_at) >= keepalive_interval {
                effects.push(Effect::DmxFrame {
                    port_address,
                    sequence: 0,
                    data: output.data.clone(),
                    length: output.length,
                });
            }
        }

        // Failsafe: passive -> engaged (spec.md §4.2 "State machine for failsafe").
        let idle = port
            .last_output
            .as_ref()
            .map(|o| now.saturating_sub(o.updated_at) >= failsafe_cfg.idle_timeout)
            .unwrap_or(false);

        if failsafe_cfg.enabled && supports_failsafe && failsafe_mode != artnet_core::flags::FailsafeMode::Hold && idle
        {
            let fs = state.failsafe.entry(port_address).or_default();
            if fs.phase == FailsafePhase::Passive {
                fs.phase = FailsafePhase::Engaged;
                fs.engaged_at = Some(now);
                let length = port.last_output.as_ref().map(|o| o.length).unwrap_or(512);
                let data = failsafe_output(failsafe_mode, length, fs.scene.as_ref());
                effects.push(Effect::DmxFrame { port_address, sequence: 0, data: data.clone(), length });
                effects.push(Effect::Callback(CallbackEffect {
                    key: CallbackKey::Dmx,
                    payload: CallbackPayload::Dmx {
                        port_address,
                        sequence: 0,
                        data,
                        length,
                        synced: false,
                        failsafe: true,
                        failsafe_mode: Some(failsafe_mode),
                        vlc: false,
                    },
                }));
                effects.push(Effect::log(
                    LogLevel::Warn,
                    format!("port {port_address} entered failsafe ({failsafe_mode:?})"),
                ));
            }
        } else if let Some(fs) = state.failsafe.get_mut(&port_address) {
            if fs.phase == FailsafePhase::Engaged && !idle {
                fs.phase = FailsafePhase::Passive;
                fs.engaged_at = None;
            }
        }
    }
    effects
}

fn failsafe_output(mode: artnet_core::flags::FailsafeMode, length: u16, scene: Option<&Bytes>) -> Bytes {
    match mode {
        artnet_core::flags::FailsafeMode::Zero => BytesMut::zeroed(length as usize).freeze(),
        artnet_core::flags::FailsafeMode::Full => {
            let mut buf = BytesMut::zeroed(length as usize);
            buf.fill(0xFF);
            buf.freeze()
        }
        artnet_core::flags::FailsafeMode::Scene => scene.cloned().unwrap_or_else(|| BytesMut::zeroed(length as usize).freeze()),
        artnet_core::flags::FailsafeMode::Hold => scene.cloned().unwrap_or_else(|| BytesMut::zeroed(length as usize).freeze()),
    }
}
