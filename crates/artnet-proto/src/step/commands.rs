//! User-issued commands (spec.md §4.2 "Commands").

use artnet_core::packet::{Dmx, DiagData, Packet, Rdm, Sync};

use crate::effect::Effect;
use crate::event::{Command, Timestamp};
use crate::state::NodeState;

pub fn handle_command(state: &mut NodeState, command: &Command, now: Timestamp) -> Vec<Effect> {
    match command {
        Command::SendDmx { port_address, data, target } => {
            vec![Effect::TxPacket {
                packet: Packet::Dmx(Dmx {
                    sequence: 0,
                    physical: 0,
                    port_address: *port_address,
                    length: data.len() as u16,
                    data: data.clone(),
                }),
                target: *target,
                broadcast: false,
            }]
        }
        Command::SendRdm { port_address, data, target } => {
            state.stats.tx_artrdm += 1;
            vec![Effect::TxPacket {
                packet: Packet::Rdm(Rdm { rdm_ver: 1, net: port_address.split().0, command: 0, port_address: *port_address, data: data.clone() }),
                target: *target,
                broadcast: false,
            }]
        }
        Command::SendSync { target } => {
            let default_target = state.config.diagnostics.broadcast_target;
            let explicit = target.is_some();
            let target = target.or_else(|| default_target.map(|(h, p)| std::net::SocketAddrV4::new(h, p)));
            let Some(target) = target else {
                return vec![Effect::TxPacket {
                    packet: Packet::Sync(Sync { aux: 0 }),
                    target: std::net::SocketAddrV4::new(std::net::Ipv4Addr::BROADCAST, 0x1936),
                    broadcast: true,
                }];
            };
            vec![Effect::TxPacket { packet: Packet::Sync(Sync { aux: 0 }), target, broadcast: !explicit }]
        }
        Command::SendDiagnostic { priority, text } => {
            let mut effects = Vec::new();
            for (key, record) in state.peers.clone() {
                if !record.diag_subscriber || record.diag_priority > *priority {
                    continue;
                }
                let target = std::net::SocketAddrV4::new(key.0, key.1);
                effects.push(Effect::TxPacket {
                    packet: Packet::DiagData(DiagData { priority: *priority, text: text.clone() }),
                    target,
                    broadcast: false,
                });
            }
            effects
        }
        Command::ApplyState(patch) => {
            state.apply_patch(patch);
            let mut effects = Vec::new();
            for subscriber in state.reply_on_change_subscribers() {
                let target = std::net::SocketAddrV4::new(subscriber.0, subscriber.1);
                effects.extend(crate::step::poll::reply_effects(state, target));
            }
            let _ = now;
            effects
        }
    }
}
