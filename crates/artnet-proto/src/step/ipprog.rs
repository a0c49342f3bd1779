//! ArtIpProg handler (spec.md §4.2 "ArtIpProg").

use std::net::SocketAddrV4;

use artnet_core::packet::{IpProg, IpProgCommand, IpProgReply, Packet};

use crate::effect::{CallbackEffect, CallbackKey, CallbackPayload, Effect, IpProgChange};
use crate::event::Timestamp;
use crate::state::NodeState;

pub fn handle_ip_prog(state: &mut NodeState, ip_prog: &IpProg, sender: SocketAddrV4, _now: Timestamp) -> Vec<Effect> {
    state.stats.rx_artipprog += 1;
    let mut change = IpProgChange { ip: None, subnet: None, gateway: None, port: None, dhcp: false };

    if ip_prog.command.contains(IpProgCommand::ENABLE) {
        if ip_prog.command.contains(IpProgCommand::RESET_DEFAULTS) {
            state.identity.ip = None;
            state.identity.port = None;
        } else {
            if ip_prog.command.contains(IpProgCommand::PROGRAM_IP) {
                state.identity.ip = Some(ip_prog.prog_ip);
                change.ip = Some(ip_prog.prog_ip);
            }
            if ip_prog.command.contains(IpProgCommand::PROGRAM_SUBNET) {
                change.subnet = Some(ip_prog.prog_subnet);
            }
            if ip_prog.command.contains(IpProgCommand::PROGRAM_PORT) {
                state.identity.port = Some(ip_prog.prog_port);
                change.port = Some(ip_prog.prog_port);
            }
            if ip_prog.command.contains(IpProgCommand::DHCP) {
                change.dhcp = true;
            }
            if ip_prog.command.contains(IpProgCommand::DEFAULT) {
                // restore the configured default network identity.
                state.identity.ip = None;
                state.identity.port = None;
            }
        }
    }

    let reply = IpProgReply {
        prog_ip: state.identity.ip.unwrap_or(std::net::Ipv4Addr::new(2, 0, 0, 1)),
        prog_subnet: std::net::Ipv4Addr::new(255, 0, 0, 0),
        prog_port: state.identity.port.unwrap_or(0x1936),
        status: 0,
        prog_gateway: std::net::Ipv4Addr::new(2, 0, 0, 1),
        dhcp_enabled: change.dhcp,
    };

    vec![
        Effect::TxPacket {
            packet: Packet::IpProgReply(reply),
            target: sender,
            broadcast: false,
        },
        Effect::Callback(CallbackEffect { key: CallbackKey::IpProg, payload: CallbackPayload::IpProg { change } }),
    ]
}
