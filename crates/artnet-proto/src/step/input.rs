//! ArtInput handler (spec.md §4.2 "ArtInput").

use std::net::SocketAddrV4;

use artnet_core::packet::Input;

use crate::effect::Effect;
use crate::event::Timestamp;
use crate::state::NodeState;

const PAGE_SIZE: usize = 4;

pub fn handle_input(state: &mut NodeState, input: &Input, sender: SocketAddrV4, now: Timestamp) -> Vec<Effect> {
    state.stats.rx_artinput += 1;
    let page_start = (input.bind_index.max(1) as usize - 1) * PAGE_SIZE;
    let mut any_disabled = false;
    for (offset, &disabled) in input.disable.iter().enumerate() {
        if disabled {
            any_disabled = true;
        }
        if let Some(port) = state.identity.ports.get_mut(page_start + offset) {
            port.input_disabled = disabled;
        }
        if let Some(port) = state.identity.ports.get(page_start + offset).copied() {
            if disabled {
                state.dmx.entry(port.universe).or_default().sources.clear();
            }
        }
    }

    if any_disabled {
        state.sync.staging.clear();
    }

    let _ = now;
    crate::step::poll::build_pages(state)
        .into_iter()
        .filter(|page| page.bind_index == input.bind_index.max(1))
        .map(|reply| {
            state.stats.tx_artpollreply += 1;
            Effect::TxPacket {
                packet: artnet_core::packet::Packet::PollReply(Box::new(reply)),
                target: sender,
                broadcast: false,
            }
        })
        .collect()
}
