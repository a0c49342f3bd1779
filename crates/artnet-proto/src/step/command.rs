//! ArtCommand handler (spec.md §4.2 "ArtCommand").

use std::net::SocketAddrV4;

use artnet_core::packet::{Command, DiagPriority};

use crate::effect::{CallbackEffect, CallbackKey, CallbackPayload, Effect};
use crate::event::Timestamp;
use crate::state::NodeState;
use crate::step::diag::ack_effect;

pub fn handle_command(state: &mut NodeState, command: &Command, sender: SocketAddrV4, _now: Timestamp) -> Vec<Effect> {
    if command.esta_man != state.identity.esta_man && command.esta_man != 0xFFFF {
        return Vec::new();
    }
    state.stats.rx_artcommand += 1;

    let mut effects = Vec::new();
    let mut changed = false;
    for directive in command.text.split('&').filter(|s| !s.is_empty()) {
        let Some((key, value)) = directive.split_once('=') else {
            effects.push(ack_effect(sender, DiagPriority::Low, format!("Unsupported ArtCommand: {directive}")));
            continue;
        };
        match key {
            "SwoutText" => {
                if state.command_labels.swout_text.as_deref() == Some(value) {
                    effects.push(ack_effect(sender, DiagPriority::Low, "SwoutText already set"));
                } else {
                    state.command_labels.swout_text = Some(value.to_string());
                    changed = true;
                    effects.push(ack_effect(sender, DiagPriority::Low, "SwoutText set"));
                }
            }
            "SwinText" => {
                if state.command_labels.swin_text.as_deref() == Some(value) {
                    effects.push(ack_effect(sender, DiagPriority::Low, "SwinText already set"));
                } else {
                    state.command_labels.swin_text = Some(value.to_string());
                    changed = true;
                    effects.push(ack_effect(sender, DiagPriority::Low, "SwinText set"));
                }
            }
            _ => {
                effects.push(ack_effect(sender, DiagPriority::Low, format!("Unsupported ArtCommand: {key}")));
            }
        }
    }

    if changed {
        effects.push(Effect::Callback(CallbackEffect {
            key: CallbackKey::Command,
            payload: CallbackPayload::Command { text: command.text.clone() },
        }));
    }
    effects
}
