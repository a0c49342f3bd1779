//! ArtPoll / ArtPollReply (spec.md §4.2 "ArtPoll", §8 invariant 3 and 7,
//! scenarios A and G).

use std::net::SocketAddrV4;

use artnet_core::flags::TalkToMe;
use artnet_core::packet::{Packet, Poll, PollReply, PortEntry};

use crate::config::PortDirection;
use crate::effect::Effect;
use crate::event::Timestamp;
use crate::state::NodeState;

const PAGE_SIZE: usize = 4;

/// Builds one [`PollReply`] per page of ≤4 ports (spec.md §3 invariant:
/// "ports are grouped in pages of ≤4; bind-index is the 1-based page number").
pub fn build_pages(state: &NodeState) -> Vec<PollReply> {
    let ports = &state.identity.ports;
    if ports.is_empty() {
        return vec![build_page(state, &[], 1)];
    }
    ports
        .chunks(PAGE_SIZE)
        .enumerate()
        .map(|(i, chunk)| build_page(state, chunk, (i + 1) as u8))
        .collect()
}

fn build_page(state: &NodeState, chunk: &[crate::config::PortConfig], bind_index: u8) -> PollReply {
    let mut ports = [PortEntry::default(); 4];
    for (i, port) in chunk.iter().enumerate() {
        let dmx = state.dmx.get(&port.universe);
        let good_output_a = dmx.map(good_output_a_bits).unwrap_or(0);
        let mut good_input = if port.direction == PortDirection::Input { 0x80 } else { 0x00 };
        if port.input_disabled {
            good_input |= 0x08; // "input disabled" bit (spec.md §4.2 ArtInput)
        }
        ports[i] = PortEntry {
            port_type: port.port_type,
            good_input,
            good_output_a,
            good_output_b: good_output_b_bits(state),
            sw_in: port.universe.split().2,
            sw_out: port.universe.split().2,
        };
    }
    let (net_switch, sub_switch, _) =
        chunk.first().map(|p| p.universe.split()).unwrap_or((0, 0, 0));
    PollReply {
        address: state.identity.ip.unwrap_or(std::net::Ipv4Addr::new(2, 0, 0, 1)),
        port: state.identity.port.unwrap_or(0x1936),
        version: ((state.identity.version_hi as u16) << 8) | state.identity.version_lo as u16,
        net_switch,
        sub_switch,
        oem: state.identity.oem,
        ubea_version: 0,
        status1: state.status1(),
        esta_man: state.identity.esta_man,
        short_name: state.identity.short_name.clone(),
        long_name: state.identity.long_name.clone(),
        node_report: String::new(),
        num_ports: chunk.len() as u16,
        ports,
        sw_video: 0,
        sw_macro: 0,
        sw_remote: 0,
        style: state.identity.style,
        mac: state.identity.mac,
        bind_ip: state.identity.ip.unwrap_or(std::net::Ipv4Addr::new(2, 0, 0, 1)),
        bind_index,
        status2: artnet_core::flags::Status2::from_bits_truncate(state.identity.status2),
        status3: state.status3(),
        default_responder_uid: artnet_core::field::RdmUid::from_bytes(&[0; 6]),
        user_hi: 0,
        user_lo: 0,
        refresh_rate: state.config.refresh_rate_hz.map(|hz| hz as u16).unwrap_or(0),
        background_queue_policy: state.identity.background_queue_policy,
    }
}

fn good_output_a_bits(port: &crate::state::DmxPortState) -> u8 {
    const DATA_TRANSMITTING: u8 = 0b1000_0000;
    const MERGING: u8 = 0b0000_1000;
    let mut bits = 0u8;
    if port.last_output.is_some() {
        bits |= DATA_TRANSMITTING;
    }
    if port.is_merging() {
        bits |= MERGING;
    }
    bits
}

fn good_output_b_bits(state: &NodeState) -> u8 {
    const RDM_DISABLED: u8 = 0b0100_0000;
    if state.rdm_callback_registered {
        0
    } else {
        RDM_DISABLED
    }
}

/// Handles an incoming ArtPoll (spec.md §4.2 "ArtPoll").
pub fn handle_poll(state: &mut NodeState, poll: &Poll, sender: SocketAddrV4, now: Timestamp) -> Vec<Effect> {
    state.stats.rx_artpoll += 1;
    let peer_key = (*sender.ip(), sender.port());
    let record = state.peers.entry(peer_key).or_insert_with(|| crate::state::PeerRecord::new(now));
    record.seen_at = now;

    if poll.flags.contains(TalkToMe::REPLY_ON_CHANGE) {
        state.try_subscribe_reply_on_change(peer_key, now);
    }
    if poll.flags.contains(TalkToMe::DIAGNOSTICS) {
        if let Some(record) = state.peers.get_mut(&peer_key) {
            record.diag_subscriber = true;
            record.diag_unicast = poll.flags.contains(TalkToMe::DIAG_UNICAST);
        }
    }

    let pages = build_pages(state);
    let targeted = poll.flags.contains(TalkToMe::TARGETED);
    let (top, bottom) = (poll.target_port_address_top, poll.target_port_address_bottom);

    let included: Vec<PollReply> = pages
        .into_iter()
        .filter(|page| {
            if !targeted {
                return true;
            }
            page.ports.iter().enumerate().take(page.num_ports as usize).any(|(i, _)| {
                let Some(port) = state.identity.ports.get((page.bind_index as usize - 1) * PAGE_SIZE + i) else {
                    return false;
                };
                let value = port.universe.value();
                value >= bottom.min(top) && value <= top.max(bottom)
            })
        })
        .collect();

    let suppress_delay = poll.flags.contains(TalkToMe::SUPPRESS_DELAY);
    let mut effects = Vec::new();
    for reply in included {
        state.stats.tx_artpollreply += 1;
        let packet = Packet::PollReply(Box::new(reply));
        effects.push(if suppress_delay {
            Effect::TxPacket { packet, target: sender, broadcast: false }
        } else {
            Effect::TxPacketJittered { packet, target: sender, max_delay: std::time::Duration::from_millis(1000) }
        });
    }
    effects
}

/// No outbound effects — ArtPollReply only records peer capabilities
/// (spec.md §4.2 "ArtPollReply").
pub fn handle_poll_reply(state: &mut NodeState, sender: SocketAddrV4, now: Timestamp) -> Vec<Effect> {
    let peer_key = (*sender.ip(), sender.port());
    state.peers.entry(peer_key).or_insert_with(|| crate::state::PeerRecord::new(now)).seen_at = now;
    Vec::new()
}

/// Emits an ArtPollReply page set to `target` (used by ArtAddress/ArtInput/
/// apply-state fan-out, spec.md §4.2).
pub fn reply_effects(state: &mut NodeState, target: SocketAddrV4) -> Vec<Effect> {
    build_pages(state)
        .into_iter()
        .map(|reply| {
            state.stats.tx_artpollreply += 1;
            Effect::TxPacket {
                packet: Packet::PollReply(Box::new(reply)),
                target,
                broadcast: false,
            }
        })
        .collect()
}
