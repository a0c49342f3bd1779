//! The node's authoritative, single-writer state (spec.md §3/§5).
//!
//! Everything here is mutated only from inside [`crate::step`]. No field is
//! ever touched directly by the shell — the shell only reads snapshots via
//! [`crate::event::Event::Snapshot`].

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use artnet_core::field::RdmUid;
use artnet_core::flags::{FailsafeMode, Status1, Status2, Status3};
use artnet_core::port_address::PortAddress;
use bytes::Bytes;

use crate::config::{MergeMode, NodeConfig, NodeIdentity};
use crate::event::Timestamp;

/// `(host, port)` — the key spec.md §3 specifies for peer and firmware-session lookups.
pub type PeerKey = (Ipv4Addr, u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerRecord {
    pub reply_on_change: bool,
    pub diag_subscriber: bool,
    pub diag_priority: artnet_core::packet::DiagPriority,
    pub diag_unicast: bool,
    pub seen_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PeerRecord {
    pub fn new(now: Timestamp) -> Self {
        PeerRecord {
            reply_on_change: false,
            diag_subscriber: false,
            diag_priority: artnet_core::packet::DiagPriority::Low,
            diag_unicast: false,
            seen_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmxSource {
    pub data: Bytes,
    pub length: u16,
    pub last_updated: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastOutput {
    pub data: Bytes,
    pub length: u16,
    pub updated_at: Timestamp,
}

/// Per port-address DMX merge state (spec.md §3 "DMX state").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmxPortState {
    pub sources: BTreeMap<(Ipv4Addr, u8), DmxSource>,
    pub exclusive_owner: Option<(Ipv4Addr, u8)>,
    pub exclusive_updated_at: Option<Timestamp>,
    pub last_output: Option<LastOutput>,
    pub merge_mode: MergeMode,
    pub last_nzs_at: Option<Timestamp>,
}

impl Default for DmxPortState {
    fn default() -> Self {
        DmxPortState {
            sources: BTreeMap::new(),
            exclusive_owner: None,
            exclusive_updated_at: None,
            last_output: None,
            merge_mode: MergeMode::Htp,
            last_nzs_at: None,
        }
    }
}

impl DmxPortState {
    /// spec.md §8 invariant 10: "the `merging` bit of good-output-a clears
    /// when only one source remains".
    pub fn is_merging(&self) -> bool {
        self.sources.len() > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Immediate,
    ArtSyncArmed,
    ArtSyncActive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFrame {
    pub packet: Bytes,
    pub sequence: u8,
    pub length: u16,
    pub received_at: Timestamp,
}

/// ArtSync staging and the {immediate, art-sync-armed, art-sync-active} machine
/// (spec.md §3 "ArtSync state", §4.2 "State machine for ArtSync").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    pub phase: SyncPhase,
    pub last_sync_at: Option<Timestamp>,
    pub waiting_since: Option<Timestamp>,
    pub staging: BTreeMap<PortAddress, StagedFrame>,
}

impl Default for SyncState {
    fn default() -> Self {
        SyncState {
            phase: SyncPhase::Immediate,
            last_sync_at: None,
            waiting_since: None,
            staging: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailsafePhase {
    Passive,
    Engaged,
}

/// Per-port failsafe state (spec.md §3 "Failsafe state", §4.2 "State machine
/// for failsafe").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailsafePortState {
    pub phase: FailsafePhase,
    pub engaged_at: Option<Timestamp>,
    pub scene: Option<Bytes>,
}

impl Default for FailsafePortState {
    fn default() -> Self {
        FailsafePortState {
            phase: FailsafePhase::Passive,
            engaged_at: None,
            scene: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareSession {
    pub expected_length_words: u32,
    pub accumulated: Vec<u8>,
    pub checksum_accumulator: u16,
    pub last_block_id: Option<u8>,
}

/// RDM ToD and firmware-transfer state (spec.md §3 "RDM state").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RdmState {
    pub tod: BTreeMap<PortAddress, Vec<RdmUid>>,
    pub firmware_sessions: BTreeMap<PeerKey, FirmwareSession>,
}

/// Monotonic counters (spec.md §3 "Statistics"; SPEC_FULL.md §3 typed-struct note).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub rx_artpoll: u64,
    pub rx_artdmx: u64,
    pub rx_artnzs: u64,
    pub rx_artnzs_throttled: u64,
    pub rx_artsync: u64,
    pub rx_artvlc: u64,
    pub rx_artaddress: u64,
    pub rx_artinput: u64,
    pub rx_artipprog: u64,
    pub rx_arttodrequest: u64,
    pub rx_arttodcontrol: u64,
    pub rx_artrdm: u64,
    pub rx_artrdmsub: u64,
    pub rx_artcommand: u64,
    pub rx_arttrigger: u64,
    pub rx_artdatarequest: u64,
    pub rx_artfirmwaremaster: u64,
    pub rx_artdiagdata: u64,
    pub tx_artpollreply: u64,
    pub tx_arttoddata: u64,
    pub tx_artrdm: u64,
    pub diagnostics_sent: u64,
    pub diagnostics_throttled: u64,
    pub trigger_throttled: u64,
    pub rdm_sub_invalid: u64,
    pub rdm_invalid_command_class: u64,
    pub firmware_requests: u64,
}

/// The complete node state (spec.md §3 "Lifecycle": created by
/// `initial_state(config)`, mutated only inside `step`).
#[derive(Debug, Clone)]
pub struct NodeState {
    pub identity: NodeIdentity,
    pub config: NodeConfig,
    pub peers: BTreeMap<PeerKey, PeerRecord>,
    pub dmx: BTreeMap<PortAddress, DmxPortState>,
    pub sync: SyncState,
    pub failsafe: BTreeMap<PortAddress, FailsafePortState>,
    pub rdm: RdmState,
    pub stats: Stats,
    pub rdm_callback_registered: bool,
    pub command_labels: CommandLabels,
    pub trigger_last_fired: BTreeMap<(u8, u8), Timestamp>,
    pub data_responses: BTreeMap<u16, Bytes>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLabels {
    pub swout_text: Option<String>,
    pub swin_text: Option<String>,
}

/// A deep-merge patch for the `apply-state` command (spec.md §4.2
/// "Commands", §9 "Map-typed state -> typed record").
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub oem: Option<u16>,
    pub network_ip: Option<Ipv4Addr>,
    pub network_port: Option<u16>,
    pub rdm_callback_registered: Option<bool>,
    pub sync: Option<crate::config::SyncConfig>,
    pub failsafe: Option<crate::config::FailsafeConfig>,
    pub diagnostics: Option<crate::config::DiagnosticsConfig>,
    pub swout_text: Option<String>,
    pub swin_text: Option<String>,
}

impl NodeState {
    pub fn new(config: NodeConfig) -> Self {
        let mut dmx = BTreeMap::new();
        for port in &config.node.ports {
            dmx.insert(port.universe, DmxPortState::default());
        }
        let identity = config.node.clone();
        NodeState {
            identity,
            config,
            peers: BTreeMap::new(),
            dmx,
            sync: SyncState::default(),
            failsafe: BTreeMap::new(),
            rdm: RdmState::default(),
            stats: Stats::default(),
            rdm_callback_registered: false,
            command_labels: CommandLabels::default(),
            trigger_last_fired: BTreeMap::new(),
            data_responses: BTreeMap::new(),
        }
    }

    /// Looks up a configured canned response for ArtDataRequest's `request`
    /// variant (spec.md §4.2 "ArtDataRequest": "iff ... a configured response
    /// exists for the requested variant").
    pub fn config_data_response(&self, request: u16) -> Option<Bytes> {
        self.data_responses.get(&request).cloned()
    }

    pub fn dmx_port_mut(&mut self, port_address: PortAddress) -> &mut DmxPortState {
        self.dmx.entry(port_address).or_default()
    }

    pub fn failsafe_port_mut(&mut self, port_address: PortAddress) -> &mut FailsafePortState {
        self.failsafe.entry(port_address).or_default()
    }

    /// Recomputes Status2's always-derived bits (spec.md §8 invariant 5).
    pub fn derive_status_bits(&mut self) {
        let mut status2 = Status2::from_bits_truncate(self.identity.status2)
            | Status2::DHCP_CAPABLE
            | Status2::EXTENDED_PORT_ADDRESS
            | Status2::OUTPUT_STYLE;
        status2.set(Status2::RDM_VIA_ARTADDRESS, self.rdm_callback_registered);
        self.identity.status2 = status2.bits();
    }

    pub fn status1(&self) -> Status1 {
        Status1::from_bits_truncate(self.identity.status1)
    }

    pub fn status2(&self) -> Status2 {
        Status2::from_bits_truncate(self.identity.status2)
    }

    pub fn status3(&self) -> Status3 {
        Status3::from_bits_truncate(self.identity.status3)
    }

    pub fn failsafe_mode(&self) -> FailsafeMode {
        self.status3().failsafe_mode()
    }

    /// Tries to subscribe `peer` to reply-on-change, enforcing the
    /// configured limit and eviction policy (spec.md §8 invariant 7).
    pub fn try_subscribe_reply_on_change(&mut self, peer: PeerKey, now: Timestamp) -> bool {
        if let Some(record) = self.peers.get_mut(&peer) {
            if record.reply_on_change {
                record.updated_at = now;
                return true;
            }
        }
        let current = self.peers.values().filter(|p| p.reply_on_change).count();
        let limit = self.config.discovery.reply_on_change_limit;
        if current < limit {
            self.peers.entry(peer).or_insert_with(|| PeerRecord::new(now)).reply_on_change = true;
            self.peers.get_mut(&peer).unwrap().updated_at = now;
            return true;
        }
        match self.config.discovery.reply_on_change_policy {
            crate::config::SubscriberPolicy::PreferExisting => false,
            crate::config::SubscriberPolicy::PreferLatest => {
                if let Some(oldest_key) = self
                    .peers
                    .iter()
                    .filter(|(_, p)| p.reply_on_change)
                    .min_by_key(|(_, p)| p.seen_at)
                    .map(|(k, _)| *k)
                {
                    if let Some(r) = self.peers.get_mut(&oldest_key) {
                        r.reply_on_change = false;
                    }
                    self.peers.entry(peer).or_insert_with(|| PeerRecord::new(now)).reply_on_change = true;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Reply-on-change subscribers, sorted by `seen_at` for deterministic
    /// fan-out (spec.md §9 "Subscriber store").
    pub fn reply_on_change_subscribers(&self) -> Vec<PeerKey> {
        let mut subs: Vec<(PeerKey, Timestamp)> = self
            .peers
            .iter()
            .filter(|(_, p)| p.reply_on_change)
            .map(|(k, p)| (*k, p.seen_at))
            .collect();
        subs.sort_by_key(|(_, seen_at)| *seen_at);
        subs.into_iter().map(|(k, _)| k).collect()
    }

    pub fn apply_patch(&mut self, patch: &StatePatch) {
        if let Some(v) = &patch.short_name {
            self.identity.short_name = v.clone();
        }
        if let Some(v) = &patch.long_name {
            self.identity.long_name = v.clone();
        }
        if let Some(v) = patch.oem {
            self.identity.oem = v;
        }
        if let Some(v) = patch.network_ip {
            self.identity.ip = Some(v);
        }
        if let Some(v) = patch.network_port {
            self.identity.port = Some(v);
        }
        if let Some(v) = patch.rdm_callback_registered {
            self.rdm_callback_registered = v;
        }
        if let Some(v) = patch.sync {
            self.config.sync = v;
        }
        if let Some(v) = patch.failsafe {
            self.config.failsafe = v;
        }
        if let Some(v) = patch.diagnostics {
            self.config.diagnostics = v;
        }
        if let Some(v) = &patch.swout_text {
            self.command_labels.swout_text = Some(v.clone());
        }
        if let Some(v) = &patch.swin_text {
            self.command_labels.swin_text = Some(v.clone());
        }
        self.derive_status_bits();
    }
}

/// Creates the node's initial state from configuration (spec.md §3 "Lifecycle").
pub fn initial_state(config: NodeConfig) -> NodeState {
    let mut state = NodeState::new(config);
    state.derive_status_bits();
    state
}
