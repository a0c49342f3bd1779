//! End-to-end scenarios against the pure `step` machine (spec.md §8).

use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use artnet_core::flags::TalkToMe;
use artnet_core::packet::{Address, AddressCommand, Dmx, Packet, Poll, Sync};
use artnet_core::port_address::PortAddress;
use artnet_proto::config::{MergeMode, NodeConfig, PortConfig, PortDirection, SyncMode};
use artnet_proto::effect::Effect;
use artnet_proto::event::{Command, Event};
use artnet_proto::{initial_state, step};

fn port(n: u8, s: u8, u: u8) -> PortAddress {
    PortAddress::compose(n, s, u).unwrap()
}

fn sender(octet: u8, p: u16) -> SocketAddrV4 {
    SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, octet), p)
}

fn config_with_port(universe: PortAddress) -> NodeConfig {
    let mut cfg = NodeConfig::default();
    cfg.node.ports.push(PortConfig { direction: PortDirection::Output, universe, port_type: 0x80, input_disabled: false });
    cfg
}

/// Scenario A: ArtPoll with suppress-delay yields exactly one ArtPollReply
/// per page, sent immediately, never broadcast.
#[test]
fn scenario_a_poll_yields_one_reply_per_page() {
    let state = initial_state(config_with_port(port(0, 0, 0)));
    let poll = Poll {
        flags: TalkToMe::SUPPRESS_DELAY,
        priority: 0,
        target_port_address_top: 0,
        target_port_address_bottom: 0,
        esta_man: 0,
        oem: 0,
    };
    let (_, effects) = step(state, Event::Rx { packet: Packet::Poll(poll), sender: sender(5, 0x1936), timestamp: Duration::ZERO });
    let replies: Vec<_> = effects
        .iter()
        .filter_map(|e| match e {
            Effect::TxPacket { packet: Packet::PollReply(r), broadcast, .. } => Some((r, *broadcast)),
            _ => None,
        })
        .collect();
    assert_eq!(replies.len(), 1, "single configured port fits on one page");
    assert!(!replies[0].1, "ArtPollReply is unicast to the poller (invariant 6)");
    assert_eq!(replies[0].0.bind_index, 1);
}

/// Scenario B: two sources on the same port under HTP merge compose to the
/// per-channel maximum.
#[test]
fn scenario_b_htp_merge_takes_channel_max() {
    let pa = port(0, 0, 0);
    let mut state = initial_state(config_with_port(pa));
    state.dmx.get_mut(&pa).unwrap().merge_mode = MergeMode::Htp;

    let a = Dmx { sequence: 1, physical: 0, port_address: pa, length: 3, data: bytes::Bytes::from_static(&[150, 0, 75]) };
    let b = Dmx { sequence: 1, physical: 0, port_address: pa, length: 3, data: bytes::Bytes::from_static(&[0, 200, 10]) };

    let (state, _) = step(state, Event::Rx { packet: Packet::Dmx(a), sender: sender(1, 0x1936), timestamp: Duration::from_millis(0) });
    let (state, effects) = step(state, Event::Rx { packet: Packet::Dmx(b), sender: sender(2, 0x1936), timestamp: Duration::from_millis(10) });

    let composed = state.dmx.get(&pa).unwrap().last_output.as_ref().unwrap();
    assert_eq!(&composed.data[..], &[150, 200, 75]);
    assert!(effects.iter().any(|e| matches!(e, Effect::DmxFrame { port_address, .. } if *port_address == pa)));
}

/// Scenario: a merge-timeout tick purges a stale source and drops the node
/// out of "merging" state (spec.md §8 invariant 9).
#[test]
fn merge_timeout_purges_stale_sources() {
    let pa = port(0, 0, 1);
    let mut state = initial_state(config_with_port(pa));
    state.config.merge_timeout = Duration::from_secs(1);

    let a = Dmx { sequence: 1, physical: 0, port_address: pa, length: 1, data: bytes::Bytes::from_static(&[10]) };
    let b = Dmx { sequence: 1, physical: 0, port_address: pa, length: 1, data: bytes::Bytes::from_static(&[20]) };
    let (state, _) = step(state, Event::Rx { packet: Packet::Dmx(a), sender: sender(1, 0x1936), timestamp: Duration::from_millis(0) });
    let (state, _) = step(state, Event::Rx { packet: Packet::Dmx(b), sender: sender(2, 0x1936), timestamp: Duration::from_millis(0) });
    assert!(state.dmx.get(&pa).unwrap().is_merging());

    let (state, _) = step(state, Event::Tick { now: Duration::from_secs(2) });
    assert!(!state.dmx.get(&pa).unwrap().is_merging(), "stale source must be purged past merge-timeout");
}

/// Scenario C: ArtSync stages frames under ArtSync mode and flushes them
/// together on the sync trigger.
#[test]
fn scenario_c_artsync_stages_then_flushes() {
    let pa = port(0, 0, 2);
    let mut cfg = config_with_port(pa);
    cfg.sync.mode = SyncMode::ArtSync;
    let state = initial_state(cfg);

    let frame = Dmx { sequence: 1, physical: 0, port_address: pa, length: 2, data: bytes::Bytes::from_static(&[1, 2]) };
    let (state, effects) = step(state, Event::Rx { packet: Packet::Dmx(frame), sender: sender(1, 0x1936), timestamp: Duration::from_millis(0) });
    assert!(effects.is_empty(), "a staged frame produces no effect until ArtSync arrives");
    assert_eq!(state.sync.staging.len(), 1);

    let sync = Sync { aux: 0 };
    let (state, effects) = step(state, Event::Rx { packet: Packet::Sync(sync), sender: sender(1, 0x1936), timestamp: Duration::from_millis(5) });
    assert!(state.sync.staging.is_empty(), "staged frames are cleared on flush");
    assert!(effects.iter().any(|e| matches!(e, Effect::DmxFrame { port_address, .. } if *port_address == pa)));
}

/// Scenario D: a port goes idle past the failsafe timeout and engages
/// zero-mode output (512 zero bytes by default).
#[test]
fn scenario_d_failsafe_engages_on_idle() {
    let pa = port(0, 0, 3);
    let mut cfg = config_with_port(pa);
    cfg.failsafe.idle_timeout = Duration::from_millis(100);
    let state = initial_state(cfg);

    let frame = Dmx { sequence: 1, physical: 0, port_address: pa, length: 512, data: bytes::Bytes::from(vec![200u8; 512]) };
    let (state, _) = step(state, Event::Rx { packet: Packet::Dmx(frame), sender: sender(1, 0x1936), timestamp: Duration::from_millis(0) });

    let (state, effects) = step(state, Event::Tick { now: Duration::from_millis(500) });
    assert_eq!(state.failsafe.get(&pa).map(|f| f.phase), Some(artnet_proto::state::FailsafePhase::Engaged));
    let failsafe_frame = effects.iter().find_map(|e| match e {
        Effect::DmxFrame { port_address, data, .. } if *port_address == pa => Some(data.clone()),
        _ => None,
    });
    assert_eq!(failsafe_frame.unwrap().as_ref(), &[0u8; 512][..]);
}

/// spec.md §8 invariant 4: Status2's always-derived bits are set regardless
/// of configuration, and rdm-via-artaddress tracks callback registration.
#[test]
fn status2_always_derived_bits_are_set() {
    let mut state = initial_state(config_with_port(port(1, 2, 3)));
    let status2 = state.status2();
    assert!(status2.contains(artnet_core::flags::Status2::DHCP_CAPABLE));
    assert!(status2.contains(artnet_core::flags::Status2::EXTENDED_PORT_ADDRESS));
    assert!(status2.contains(artnet_core::flags::Status2::OUTPUT_STYLE));
    assert!(!status2.contains(artnet_core::flags::Status2::RDM_VIA_ARTADDRESS));

    state.rdm_callback_registered = true;
    state.derive_status_bits();
    assert!(state.status2().contains(artnet_core::flags::Status2::RDM_VIA_ARTADDRESS));
}

/// spec.md §8 invariant 7: reply-on-change subscriber store enforces its
/// configured limit under the prefer-existing policy.
#[test]
fn reply_on_change_respects_limit_prefer_existing() {
    let mut state = initial_state(config_with_port(port(0, 0, 4)));
    state.config.discovery.reply_on_change_limit = 2;
    state.config.discovery.reply_on_change_policy = artnet_proto::config::SubscriberPolicy::PreferExisting;

    assert!(state.try_subscribe_reply_on_change((Ipv4Addr::new(10, 0, 0, 1), 0x1936), Duration::from_millis(0)));
    assert!(state.try_subscribe_reply_on_change((Ipv4Addr::new(10, 0, 0, 2), 0x1936), Duration::from_millis(1)));
    assert!(!state.try_subscribe_reply_on_change((Ipv4Addr::new(10, 0, 0, 3), 0x1936), Duration::from_millis(2)));
    assert_eq!(state.reply_on_change_subscribers().len(), 2);
}

/// Scenario E: an ArtAddress name update acks the sender and fans the
/// resulting ArtPollReply out to every reply-on-change subscriber.
#[test]
fn scenario_e_address_update_acks_and_fans_out_to_subscribers() {
    let mut state = initial_state(config_with_port(port(0, 0, 0)));
    let subscriber = (Ipv4Addr::new(10, 0, 0, 9), 0x1936);
    assert!(state.try_subscribe_reply_on_change(subscriber, Duration::from_millis(0)));

    let address = Address {
        net_switch: None,
        bind_index: 1,
        short_name: Some("new-short".into()),
        long_name: Some("new long name".into()),
        sw_in: [None; 4],
        sw_out: [None; 4],
        sub_switch: None,
        command: AddressCommand::None,
    };
    let poller = sender(5, 0x1936);
    let (state, effects) = step(
        state,
        Event::Rx { packet: Packet::Address(address), sender: poller, timestamp: Duration::from_millis(0) },
    );

    assert_eq!(state.identity.short_name, "new-short");
    assert_eq!(state.identity.long_name, "new long name");

    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::TxPacket { packet: Packet::DiagData(d), target, broadcast: false }
            if *target == poller && d.text == "ArtAddress applied"
    )));

    let subscriber_addr = SocketAddrV4::new(subscriber.0, subscriber.1);
    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::TxPacket { packet: Packet::PollReply(_), target, broadcast: false } if *target == subscriber_addr
    )));
}

/// Scenario G: an 8-port/2-page node replies to a targeted ArtPoll with only
/// the page whose ports fall inside the requested universe range.
#[test]
fn scenario_g_targeted_poll_returns_only_matching_page() {
    let mut cfg = NodeConfig::default();
    for universe in 0u8..8 {
        cfg.node.ports.push(PortConfig {
            direction: PortDirection::Output,
            universe: port(0, 0, universe),
            port_type: 0x80,
            input_disabled: false,
        });
    }
    let state = initial_state(cfg);

    let poll = Poll {
        flags: TalkToMe::TARGETED | TalkToMe::SUPPRESS_DELAY,
        priority: 0,
        target_port_address_top: 7,
        target_port_address_bottom: 4,
        esta_man: 0,
        oem: 0,
    };
    let (_, effects) =
        step(state, Event::Rx { packet: Packet::Poll(poll), sender: sender(5, 0x1936), timestamp: Duration::ZERO });

    let replies: Vec<_> = effects
        .iter()
        .filter_map(|e| match e {
            Effect::TxPacket { packet: Packet::PollReply(r), .. } => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(replies.len(), 1, "only the second page's ports fall in [4, 7]");
    assert_eq!(replies[0].bind_index, 2);
}

/// A `Command::SendRdm` never sets the broadcast flag — ArtRdm is in the
/// broadcast-forbidden opcode set (spec.md §8 invariant 6).
#[test]
fn send_rdm_command_is_never_broadcast() {
    let state = initial_state(config_with_port(port(0, 0, 5)));
    let cmd = Command::SendRdm {
        port_address: port(0, 0, 5),
        data: bytes::Bytes::from(vec![0u8; 24]),
        target: sender(9, 0x1936),
    };
    let (_, effects) = step(state, Event::Command { command: cmd, timestamp: Duration::ZERO });
    assert!(effects.iter().all(|e| !matches!(e, Effect::TxPacket { broadcast: true, .. })));
}
