//! The pure `step(state, event) -> (state', effects)` function
//! (spec.md §4.2) and its per-opcode handlers.

pub mod address;
pub mod command;
pub mod commands;
pub mod data_request;
pub mod diag;
pub mod dmx;
pub mod firmware;
pub mod input;
pub mod ipprog;
pub mod poll;
pub mod rdm;
pub mod sync;
pub mod tick;
pub mod trigger;

use std::net::SocketAddrV4;

use artnet_core::packet::Packet;

use crate::effect::Effect;
use crate::event::{Event, SnapshotValue};
use crate::state::NodeState;

/// Advances the node one event, returning the new state and the effects the
/// shell must run. Never performs I/O, never reads a clock (spec.md §4.2).
pub fn step(mut state: NodeState, event: Event) -> (NodeState, Vec<Effect>) {
    let effects = match event {
        Event::Rx { packet, sender, timestamp } => handle_rx(&mut state, packet, sender, timestamp),
        Event::Tick { now } => tick::handle_tick(&mut state, now),
        Event::Command { command, timestamp } => commands::handle_command(&mut state, &command, timestamp),
        Event::Snapshot { keys, reply } => {
            let values = keys.into_iter().map(|key| resolve_snapshot(&state, key)).collect();
            vec![Effect::Callback(crate::effect::CallbackEffect {
                key: crate::effect::CallbackKey::Default,
                payload: crate::effect::CallbackPayload::Snapshot { token: reply, values },
            })]
        }
    };
    (state, effects)
}

fn handle_rx(state: &mut NodeState, packet: Packet, sender: SocketAddrV4, now: crate::event::Timestamp) -> Vec<Effect> {
    match packet {
        Packet::Poll(p) => poll::handle_poll(state, &p, sender, now),
        Packet::PollReply(_) => poll::handle_poll_reply(state, sender, now),
        Packet::Dmx(p) => dmx::handle_dmx(state, &p, sender, now),
        Packet::Nzs(p) => dmx::handle_nzs(state, &p, sender, now),
        Packet::Vlc(p) => dmx::handle_vlc(state, &p, sender, now),
        Packet::Sync(p) => sync::handle_sync(state, &p, sender, now),
        Packet::Address(p) => address::handle_address(state, &p, sender, now),
        Packet::Input(p) => input::handle_input(state, &p, sender, now),
        Packet::IpProg(p) => ipprog::handle_ip_prog(state, &p, sender, now),
        Packet::TodRequest(p) => rdm::handle_tod_request(state, &p, sender, now),
        Packet::TodControl(p) => rdm::handle_tod_control(state, &p, now),
        Packet::Rdm(p) => rdm::handle_rdm(state, &p, sender, now),
        Packet::RdmSub(p) => rdm::handle_rdm_sub(state, &p, now),
        Packet::Command(p) => command::handle_command(state, &p, sender, now),
        Packet::Trigger(p) => trigger::handle_trigger(state, &p, sender, now),
        Packet::DataRequest(p) => data_request::handle_data_request(state, &p, sender, now),
        Packet::FirmwareMaster(p) => firmware::handle_firmware_master(state, &p, sender, now),
        Packet::DiagData(p) => diag::handle_diag_data(state, &p, now),
        // Replies/responses and deprecated opcodes are recorded by stats only
        // when relevant; otherwise they carry no further state transition.
        Packet::IpProgReply(_)
        | Packet::TodData(_)
        | Packet::DataReply(_)
        | Packet::FirmwareReply(_)
        | Packet::Deprecated => Vec::new(),
    }
}

fn resolve_snapshot(state: &NodeState, key: crate::event::SnapshotKey) -> SnapshotValue {
    use crate::event::SnapshotKey;
    match key {
        SnapshotKey::Stats => SnapshotValue::Stats(state.stats),
        SnapshotKey::Identity => SnapshotValue::Identity(state.identity.clone()),
        SnapshotKey::DmxState(pa) => SnapshotValue::DmxState(state.dmx.get(&pa).cloned()),
        SnapshotKey::FailsafeState(pa) => SnapshotValue::FailsafeState(state.failsafe.get(&pa).cloned()),
        SnapshotKey::Peers => SnapshotValue::PeerCount(state.peers.len()),
    }
}
