//! Bit-flag registers used across several opcodes.
//!
//! Modeled with `bitflags`, the same crate `Trangar-artnet_protocol` (the
//! closest prior Art-Net implementation in the retrieval pack) re-exports
//! for its own status/flag bytes.

use bitflags::bitflags;

bitflags! {
    /// ArtPoll "TalkToMe" flags byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TalkToMe: u8 {
        /// Bit 0: reply immediately instead of waiting the random 0-1000ms
        const SUPPRESS_DELAY   = 0b0000_0001;
        /// Bit 1: subscribe this sender to reply-on-change notifications
        const REPLY_ON_CHANGE  = 0b0000_0010;
        /// Bit 2: subscribe this sender to diagnostics (ArtDiagData)
        const DIAGNOSTICS      = 0b0000_0100;
        /// Bit 3: diagnostics should be unicast rather than broadcast
        const DIAG_UNICAST     = 0b0000_1000;
        /// Bit 5: targeted mode — filter pages by TargetPortAddress range
        const TARGETED         = 0b0010_0000;
    }
}

bitflags! {
    /// Status1 register
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status1: u8 {
        const UBEA_PRESENT     = 0b0000_0001;
        const RDM_SUPPORTED    = 0b0000_0010;
        const BOOTED_FROM_ROM  = 0b0000_0100;
        const PORT_PROGRAMMABLE = 0b0001_0000;
        const INDICATOR_NORMAL  = 0b0100_0000;
        const INDICATOR_MUTE    = 0b1000_0000;
    }
}

bitflags! {
    /// Status2 register — spec.md §8 invariant 5: dhcp-capable,
    /// extended-port-address, and output-style bits are always set;
    /// rdm-via-artaddress is set iff an RDM callback is registered.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status2: u8 {
        const DHCP_CAPABLE          = 0b0000_0010;
        const DHCP_USED             = 0b0000_0100;
        const EXTENDED_PORT_ADDRESS = 0b0000_1000;
        const RDM_VIA_ARTADDRESS    = 0b0001_0000;
        const OUTPUT_STYLE          = 0b0010_0000;
        const SQUAWKING             = 0b0100_0000;
        const WEB_CONFIG            = 0b1000_0000;
    }
}

bitflags! {
    /// Status3 register — bits 7-6 select failsafe mode, bit 5 advertises
    /// failsafe support (spec.md §3 Failsafe state).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status3: u8 {
        const FAILSAFE_SUPPORTED = 0b0010_0000;
        const FAILSAFE_MODE_LOW  = 0b0100_0000;
        const FAILSAFE_MODE_HIGH = 0b1000_0000;
    }
}

impl Status3 {
    pub fn failsafe_mode(self) -> FailsafeMode {
        let bits = (self.bits() >> 6) & 0b11;
        match bits {
            0b00 => FailsafeMode::Hold,
            0b01 => FailsafeMode::Zero,
            0b10 => FailsafeMode::Full,
            _ => FailsafeMode::Scene,
        }
    }

    pub fn with_failsafe_mode(mut self, mode: FailsafeMode) -> Self {
        self.remove(Status3::FAILSAFE_MODE_LOW | Status3::FAILSAFE_MODE_HIGH);
        let bits = match mode {
            FailsafeMode::Hold => 0b00,
            FailsafeMode::Zero => 0b01,
            FailsafeMode::Full => 0b10,
            FailsafeMode::Scene => 0b11,
        };
        self | Status3::from_bits_truncate(bits << 6)
    }

    pub fn supports_failsafe(self) -> bool {
        self.contains(Status3::FAILSAFE_SUPPORTED)
    }
}

/// Failsafe output behavior when incoming DMX stops (spec.md Glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailsafeMode {
    Hold,
    Zero,
    Full,
    Scene,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failsafe_mode_round_trips_through_status3() {
        for mode in [
            FailsafeMode::Hold,
            FailsafeMode::Zero,
            FailsafeMode::Full,
            FailsafeMode::Scene,
        ] {
            let s = Status3::FAILSAFE_SUPPORTED.with_failsafe_mode(mode);
            assert_eq!(s.failsafe_mode(), mode);
            assert!(s.supports_failsafe());
        }
    }
}
