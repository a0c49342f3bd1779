//! Typed configuration (spec.md §6's configuration schema).
//!
//! No `serde` here deliberately — the pure core never deserializes anything;
//! an external layer parses JSON/TOML/CLI flags into this struct before
//! calling [`crate::initial_state`] (SPEC_FULL.md §1).

use std::net::Ipv4Addr;
use std::time::Duration;

use artnet_core::port_address::PortAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    Htp,
    Ltp,
}

impl Default for MergeMode {
    fn default() -> Self {
        MergeMode::Htp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfig {
    pub direction: PortDirection,
    pub universe: PortAddress,
    pub port_type: u8,
    /// Set by ArtInput's per-port disable mask (spec.md §4.2 ArtInput:
    /// "apply disable mask to the matching page's good-input"), persisted
    /// here so ArtPollReply's good-input byte reflects it.
    pub input_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub short_name: String,
    pub long_name: String,
    pub ip: Option<Ipv4Addr>,
    pub port: Option<u16>,
    pub mac: [u8; 6],
    pub ports: Vec<PortConfig>,
    pub style: u8,
    pub oem: u16,
    pub esta_man: u16,
    pub version_hi: u8,
    pub version_lo: u8,
    pub status1: u8,
    pub status2: u8,
    pub status3: u8,
    pub background_queue_policy: u8,
}

impl Default for NodeIdentity {
    fn default() -> Self {
        NodeIdentity {
            short_name: String::new(),
            long_name: String::new(),
            ip: None,
            port: None,
            mac: [0; 6],
            ports: Vec::new(),
            style: 0, // StNode
            oem: 0,
            esta_man: 0x4144, // "AD", a placeholder manufacturer id
            version_hi: 0,
            version_lo: 1,
            status1: 0,
            status2: 0,
            status3: 0,
            background_queue_policy: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindConfig {
    pub host: Option<Ipv4Addr>,
    pub port: Option<u16>,
}

impl Default for BindConfig {
    fn default() -> Self {
        BindConfig { host: None, port: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Immediate,
    ArtSync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub mode: SyncMode,
    pub buffer_ttl: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            mode: SyncMode::Immediate,
            buffer_ttl: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailsafeConfig {
    pub enabled: bool,
    pub idle_timeout: Duration,
    pub tick_interval: Duration,
}

impl Default for FailsafeConfig {
    fn default() -> Self {
        FailsafeConfig {
            enabled: true,
            idle_timeout: Duration::from_secs(4),
            tick_interval: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    pub count: usize,
    pub size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig { count: 256, size: 2048 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberPolicy {
    PreferExisting,
    PreferLatest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub reply_on_change_limit: usize,
    pub reply_on_change_policy: SubscriberPolicy,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            reply_on_change_limit: 64,
            reply_on_change_policy: SubscriberPolicy::PreferExisting,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticsConfig {
    pub broadcast_target: Option<(Ipv4Addr, u16)>,
    pub subscriber_ttl: Duration,
    pub rate_limit_hz: u32,
    pub subscriber_warning_threshold: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        DiagnosticsConfig {
            broadcast_target: None,
            subscriber_ttl: Duration::from_secs(60),
            rate_limit_hz: 10,
            subscriber_warning_threshold: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TriggerMacros {
    /// key-type -> sub-key -> handler name, matched exactly against a
    /// registered macro callback before falling back to the generic
    /// trigger callback (spec.md §4.2 ArtTrigger, §6 `triggers.macros`).
    by_key: std::collections::BTreeMap<u8, std::collections::BTreeMap<u8, String>>,
}

impl TriggerMacros {
    pub fn register(&mut self, key: u8, sub_key: u8, handler: impl Into<String>) {
        self.by_key.entry(key).or_default().insert(sub_key, handler.into());
    }

    pub fn lookup(&self, key: u8, sub_key: u8) -> Option<&str> {
        self.by_key.get(&key)?.get(&sub_key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggersConfig {
    pub min_interval: Duration,
    pub reply_enabled: bool,
    pub macros: TriggerMacros,
}

impl Default for TriggersConfig {
    fn default() -> Self {
        TriggersConfig {
            min_interval: Duration::from_millis(50),
            reply_enabled: false, // Open Question 2 — off by default, see DESIGN.md
            macros: TriggerMacros::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RdmConfig {
    pub background_supported: bool,
    pub background_policy: u8,
    pub poll_interval: Duration,
    pub discovery_batch_size: usize,
}

impl Default for RdmConfig {
    fn default() -> Self {
        RdmConfig {
            background_supported: false,
            background_policy: 0,
            poll_interval: Duration::from_secs(30),
            discovery_batch_size: 32,
        }
    }
}

/// Top-level config — mirrors spec.md §6's schema table one section per field.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub node: NodeIdentity,
    pub bind: BindConfig,
    pub sync: SyncConfig,
    pub failsafe: FailsafeConfig,
    pub rx_buffer: BufferConfig,
    pub tx_buffer: BufferConfig,
    pub discovery: DiscoveryConfig,
    pub diagnostics: DiagnosticsConfig,
    pub triggers: TriggersConfig,
    pub rdm: RdmConfig,
    pub merge_timeout: Duration,
    pub keepalive_interval: Duration,
    pub artsync_timeout: Duration,
    /// ArtNzs throttle rate; `None` means untimed (spec.md §4.2 ArtNzs:
    /// "throttled to the port's refresh-rate when refresh-rate is set").
    /// Also advertised verbatim in ArtPollReply's refresh-rate byte.
    pub refresh_rate_hz: Option<f64>,
}

impl Default for SyncMode {
    fn default() -> Self {
        SyncMode::Immediate
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            node: NodeIdentity::default(),
            bind: BindConfig::default(),
            sync: SyncConfig::default(),
            failsafe: FailsafeConfig::default(),
            rx_buffer: BufferConfig::default(),
            tx_buffer: BufferConfig { count: 128, size: 2048 },
            discovery: DiscoveryConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            triggers: TriggersConfig::default(),
            rdm: RdmConfig::default(),
            merge_timeout: Duration::from_secs(10),
            keepalive_interval: Duration::from_millis(900),
            artsync_timeout: Duration::from_secs(4),
            refresh_rate_hz: Some(40.0),
        }
    }
}
