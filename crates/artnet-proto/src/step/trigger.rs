//! ArtTrigger handler (spec.md §4.2 "ArtTrigger", §9 Open Question 2).

use std::net::SocketAddrV4;

use artnet_core::packet::{DiagPriority, Packet, Trigger};

use crate::effect::{CallbackEffect, CallbackKey, CallbackPayload, Effect};
use crate::event::Timestamp;
use crate::state::NodeState;
use crate::step::diag::ack_effect;

pub fn handle_trigger(state: &mut NodeState, trigger: &Trigger, sender: SocketAddrV4, now: Timestamp) -> Vec<Effect> {
    if trigger.oem != state.identity.oem && trigger.oem != 0xFFFF {
        return Vec::new();
    }
    state.stats.rx_arttrigger += 1;

    let debounce_key = (trigger.key, trigger.sub_key);
    let min_interval = state.config.triggers.min_interval;

    if let Some(last) = state.trigger_last_fired.get(&debounce_key).copied() {
        if now.saturating_sub(last) < min_interval {
            state.stats.trigger_throttled += 1;
            return vec![ack_effect(sender, DiagPriority::Low, "ArtTrigger debounced")];
        }
    }
    state.trigger_last_fired.insert(debounce_key, now);

    let key = if state.config.triggers.macros.lookup(trigger.key, trigger.sub_key).is_some() {
        CallbackKey::TriggerMacro(trigger.key, trigger.sub_key)
    } else {
        CallbackKey::Trigger
    };
    let mut effects = vec![Effect::Callback(CallbackEffect {
        key,
        payload: CallbackPayload::Trigger { key: trigger.key, sub_key: trigger.sub_key, data: trigger.data.clone() },
    })];

    if state.config.triggers.reply_enabled {
        effects.push(Effect::TxPacket {
            packet: Packet::Trigger(Trigger {
                oem: state.identity.oem,
                key: trigger.key,
                sub_key: trigger.sub_key,
                data: trigger.data.clone(),
            }),
            target: sender,
            broadcast: false,
        });
    }
    effects
}
