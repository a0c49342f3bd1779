//! ArtAddress handler (spec.md §4.2 "ArtAddress", scenario E).

use std::net::SocketAddrV4;

use artnet_core::packet::{Address, AddressCommand, DiagPriority};

use crate::config::{MergeMode, PortDirection};
use crate::effect::{CallbackEffect, CallbackKey, CallbackPayload, Effect};
use crate::event::Timestamp;
use crate::state::{FailsafePhase, NodeState};
use crate::step::diag::ack_effect;

const PAGE_SIZE: usize = 4;

pub fn handle_address(state: &mut NodeState, address: &Address, sender: SocketAddrV4, now: Timestamp) -> Vec<Effect> {
    state.stats.rx_artaddress += 1;
    let page_start = (address.bind_index.max(1) as usize - 1) * PAGE_SIZE;

    if let Some(name) = &address.short_name {
        state.identity.short_name = name.clone();
    }
    if let Some(name) = &address.long_name {
        state.identity.long_name = name.clone();
    }
    if let Some(net) = address.net_switch {
        for port in state.identity.ports.iter_mut() {
            let (_, sub, uni) = port.universe.split();
            if let Ok(pa) = artnet_core::port_address::PortAddress::compose(net, sub, uni) {
                port.universe = pa;
            }
        }
    }
    if let Some(sub) = address.sub_switch {
        for port in state.identity.ports.iter_mut().skip(page_start).take(PAGE_SIZE) {
            let (net, _, uni) = port.universe.split();
            if let Ok(pa) = artnet_core::port_address::PortAddress::compose(net, sub, uni) {
                port.universe = pa;
            }
        }
    }

    apply_command(state, address.command, page_start);

    let mut effects = Vec::new();
    effects.extend(crate::step::poll::reply_effects(state, sender));
    effects.push(ack_effect(sender, DiagPriority::Low, "ArtAddress applied"));
    for subscriber in state.reply_on_change_subscribers() {
        let target = SocketAddrV4::new(subscriber.0, subscriber.1);
        effects.extend(crate::step::poll::reply_effects(state, target));
    }
    effects.push(Effect::Callback(CallbackEffect {
        key: CallbackKey::Address,
        payload: CallbackPayload::Address { bind_index: address.bind_index },
    }));
    let _ = now;
    effects
}

fn apply_command(state: &mut NodeState, command: AddressCommand, page_start: usize) {
    match command {
        AddressCommand::None => {}
        AddressCommand::CancelMerge => {
            for port in state.dmx.values_mut() {
                port.sources.clear();
                port.exclusive_owner = None;
                port.exclusive_updated_at = None;
            }
        }
        AddressCommand::ClearAllOutputPorts => {
            for port in state.dmx.values_mut() {
                *port = Default::default();
            }
        }
        AddressCommand::LedNormal | AddressCommand::LedMute | AddressCommand::LedLocate => {}
        AddressCommand::MergeLtp(offset) => set_port_merge_mode(state, page_start, offset, MergeMode::Ltp),
        AddressCommand::MergeHtp(offset) => set_port_merge_mode(state, page_start, offset, MergeMode::Htp),
        AddressCommand::ArtNetSel(_) | AddressCommand::AcnSel(_) => {}
        AddressCommand::FailsafeHold => set_failsafe_mode(state, artnet_core::flags::FailsafeMode::Hold),
        AddressCommand::FailsafeZero => set_failsafe_mode(state, artnet_core::flags::FailsafeMode::Zero),
        AddressCommand::FailsafeFull => set_failsafe_mode(state, artnet_core::flags::FailsafeMode::Full),
        AddressCommand::FailsafeScene => set_failsafe_mode(state, artnet_core::flags::FailsafeMode::Scene),
        AddressCommand::FailsafeRecord => {
            for (pa, port) in state.dmx.iter() {
                if let Some(output) = &port.last_output {
                    state
                        .failsafe
                        .entry(*pa)
                        .or_default()
                        .scene
                        .replace(output.data.clone());
                }
            }
        }
        AddressCommand::InputPortDirection(offset) => set_port_direction(state, page_start, offset, PortDirection::Input),
        AddressCommand::OutputPortDirection(offset) => set_port_direction(state, page_start, offset, PortDirection::Output),
        AddressCommand::BackgroundQueuePolicy(policy) => {
            state.identity.background_queue_policy = policy;
        }
        AddressCommand::Unknown(_) => {}
    }
}

fn set_port_merge_mode(state: &mut NodeState, page_start: usize, offset: u8, mode: MergeMode) {
    let idx = page_start + offset as usize;
    if let Some(port) = state.identity.ports.get(idx) {
        state.dmx.entry(port.universe).or_default().merge_mode = mode;
    }
}

fn set_port_direction(state: &mut NodeState, page_start: usize, offset: u8, direction: PortDirection) {
    let idx = page_start + (offset as usize % PAGE_SIZE);
    if let Some(port) = state.identity.ports.get_mut(idx) {
        port.direction = direction;
    }
}

fn set_failsafe_mode(state: &mut NodeState, mode: artnet_core::flags::FailsafeMode) {
    let status3 = state.status3().with_failsafe_mode(mode);
    state.identity.status3 = status3.bits();
    for port in state.failsafe.values_mut() {
        if port.phase == FailsafePhase::Engaged {
            port.phase = FailsafePhase::Passive;
            port.engaged_at = None;
        }
    }
}
