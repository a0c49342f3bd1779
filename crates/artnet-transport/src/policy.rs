//! Broadcast policy enforcement (spec.md §4.3 "Broadcast policy", §8
//! invariant 6, scenario F).

use std::net::{Ipv4Addr, SocketAddr};

use artnet_core::opcode::OpCode;

use crate::error::{Result, TransportError};

const LIMITED_BROADCAST: Ipv4Addr = Ipv4Addr::BROADCAST;

/// Opcodes that must never be sent to the limited broadcast address.
pub fn is_broadcast_forbidden(opcode: OpCode) -> bool {
    matches!(opcode, OpCode::Dmx | OpCode::PollReply | OpCode::Rdm | OpCode::TodData)
}

/// Rejects a send whose target is (or is flagged as) the broadcast address
/// and whose opcode is in the forbidden set. Called before every socket
/// write, never after.
pub fn check(opcode: OpCode, target: SocketAddr, broadcast_flagged: bool) -> Result<()> {
    let targets_broadcast = broadcast_flagged || matches!(target.ip(), std::net::IpAddr::V4(ip) if ip == LIMITED_BROADCAST);
    if targets_broadcast && is_broadcast_forbidden(opcode) {
        return Err(TransportError::PolicyViolation { opcode, target });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddrV4;

    fn broadcast_addr() -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(LIMITED_BROADCAST, 6454))
    }

    #[test]
    fn forbidden_opcode_to_broadcast_is_rejected() {
        assert!(check(OpCode::Dmx, broadcast_addr(), false).is_err());
        assert!(check(OpCode::PollReply, broadcast_addr(), false).is_err());
        assert!(check(OpCode::Rdm, broadcast_addr(), false).is_err());
        assert!(check(OpCode::TodData, broadcast_addr(), false).is_err());
    }

    #[test]
    fn forbidden_opcode_to_unicast_is_allowed() {
        let unicast = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 5), 6454));
        assert!(check(OpCode::Dmx, unicast, false).is_ok());
    }

    #[test]
    fn allowed_opcode_to_broadcast_is_allowed() {
        assert!(check(OpCode::Poll, broadcast_addr(), false).is_ok());
    }
}
