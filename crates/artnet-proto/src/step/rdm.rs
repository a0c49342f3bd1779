//! ArtTodRequest / ArtTodControl / ArtRdm / ArtRdmSub handlers
//! (spec.md §4.2 "ArtTodRequest / ArtTodControl / ArtRdm / ArtRdmSub").

use std::net::SocketAddrV4;

use artnet_core::packet::{
    Packet, Rdm, RdmSub, RdmSubValue, TodControl, TodData, TodRequest,
};

use crate::effect::{CallbackEffect, CallbackKey, CallbackPayload, Effect, RdmSubEntry, RdmSubPhase};
use crate::event::Timestamp;
use crate::state::NodeState;

/// RDM command classes the node accepts on ArtRdm (spec.md §4.2: "accepted
/// classes include 0x10, 0x11, 0x20, 0x21, 0x30, 0x31").
pub const ALLOWED_COMMAND_CLASSES: [u8; 6] = [0x10, 0x11, 0x20, 0x21, 0x30, 0x31];

/// ArtNet TodNak — no devices, or the request could not be satisfied.
const TOD_NAK: u8 = 0xFF;

pub fn handle_tod_request(
    state: &mut NodeState,
    tod_request: &TodRequest,
    sender: SocketAddrV4,
    _now: Timestamp,
) -> Vec<Effect> {
    let mut effects = Vec::new();
    for &address in &tod_request.addresses {
        let sub_net = (address >> 4) & 0x0F;
        let universe = address & 0x0F;
        let Ok(port_address) = artnet_core::port_address::PortAddress::compose(tod_request.net, sub_net, universe)
        else {
            continue;
        };
        let uids = state.rdm.tod.get(&port_address).cloned().unwrap_or_default();
        let (command_response, uids) = if uids.is_empty() { (TOD_NAK, Vec::new()) } else { (0x00, uids) };
        let uid_total = uids.len() as u16;
        let reply = TodData {
            rdm_ver: 1,
            port: 1,
            bind_index: 1,
            net: tod_request.net,
            command_response,
            port_address,
            uid_total,
            block_count: 0,
            uids,
        };
        state.stats.tx_arttoddata += 1;
        effects.push(Effect::TxPacket {
            packet: Packet::TodData(reply),
            target: sender,
            broadcast: false,
        });
    }
    effects
}

pub fn handle_tod_control(state: &mut NodeState, control: &TodControl, _now: Timestamp) -> Vec<Effect> {
    state.stats.rx_arttodcontrol += 1;
    if control.command == 0x01 {
        // AtcFlush: discard ToD for this address; a real discovery sequence is
        // driven by the shell's RDM discovery session, not the pure core.
        state.rdm.tod.remove(&control.port_address);
    }
    Vec::new()
}

pub fn handle_rdm(state: &mut NodeState, rdm: &Rdm, _sender: SocketAddrV4, _now: Timestamp) -> Vec<Effect> {
    state.stats.rx_artrdm += 1;
    if rdm.data.is_empty() {
        state.stats.rdm_invalid_command_class += 1;
        return Vec::new();
    }
    let command_class = rdm.data.get(20).copied().unwrap_or(0);
    if !ALLOWED_COMMAND_CLASSES.contains(&command_class) {
        state.stats.rdm_invalid_command_class += 1;
        return Vec::new();
    }
    vec![Effect::Callback(CallbackEffect {
        key: CallbackKey::Rdm,
        payload: CallbackPayload::Rdm { data: rdm.data.clone() },
    })]
}

pub fn handle_rdm_sub(state: &mut NodeState, rdm_sub: &RdmSub, _now: Timestamp) -> Vec<Effect> {
    if rdm_sub.values.is_empty() {
        state.stats.rdm_sub_invalid += 1;
        return Vec::new();
    }
    let entries: Vec<RdmSubEntry> = rdm_sub
        .values
        .iter()
        .enumerate()
        .map(|(i, v): (usize, &RdmSubValue)| RdmSubEntry {
            index: i as u16,
            sub_device: rdm_sub.sub_device.saturating_add(i as u16),
            value: v.0,
        })
        .collect();
    // RDM command classes are odd for *_COMMAND_RESPONSE, even for the
    // originating *_COMMAND (e.g. 0x20 GET_COMMAND / 0x21 GET_COMMAND_RESPONSE).
    let phase = if rdm_sub.command_class & 0x01 == 1 { RdmSubPhase::Response } else { RdmSubPhase::Request };
    vec![
        Effect::Callback(CallbackEffect {
            key: CallbackKey::RdmSub,
            payload: CallbackPayload::RdmSub { phase, entries: entries.clone() },
        }),
        Effect::Callback(CallbackEffect {
            key: CallbackKey::Rdm,
            payload: CallbackPayload::RdmSub { phase, entries },
        }),
    ]
}
