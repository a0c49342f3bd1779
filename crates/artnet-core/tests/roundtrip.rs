//! Whole-frame encode -> decode round trips, one per opcode family, plus
//! the fixed-size and endianness invariants.

use std::net::Ipv4Addr;

use artnet_core::field::RdmUid;
use artnet_core::flags::{Status1, Status2, Status3, TalkToMe};
use artnet_core::packet::*;
use artnet_core::port_address::PortAddress;
use artnet_core::{decode, encode, OpCode, Packet};
use bytes::Bytes;

fn roundtrip(p: Packet) -> Packet {
    let wire = encode(&p);
    decode(wire).expect("decode of just-encoded packet must succeed")
}

#[test]
fn poll_roundtrips() {
    let p = Packet::Poll(Poll {
        flags: TalkToMe::SUPPRESS_DELAY | TalkToMe::REPLY_ON_CHANGE,
        priority: 0xF0,
        target_port_address_top: 0x1234,
        target_port_address_bottom: 0x0001,
        esta_man: 0x4144,
        oem: 0x0102,
    });
    match roundtrip(p) {
        Packet::Poll(got) => {
            assert_eq!(got.flags, TalkToMe::SUPPRESS_DELAY | TalkToMe::REPLY_ON_CHANGE);
            assert_eq!(got.priority, 0xF0);
            assert_eq!(got.esta_man, 0x4144);
        }
        other => panic!("expected Poll, got {other:?}"),
    }
}

#[test]
fn poll_reply_is_always_239_bytes_and_roundtrips() {
    let p = Packet::PollReply(Box::new(PollReply {
        address: Ipv4Addr::new(10, 0, 0, 5),
        port: 0x1936,
        version: 1,
        net_switch: 0,
        sub_switch: 0,
        oem: 0,
        ubea_version: 0,
        status1: Status1::RDM_SUPPORTED,
        esta_man: 0x4144,
        short_name: "node".into(),
        long_name: "a long name".into(),
        node_report: "#0001 [0001] ok".into(),
        num_ports: 1,
        ports: [PortEntry::default(); 4],
        sw_video: 0,
        sw_macro: 0,
        sw_remote: 0,
        style: 0,
        mac: [1, 2, 3, 4, 5, 6],
        bind_ip: Ipv4Addr::new(10, 0, 0, 5),
        bind_index: 1,
        status2: Status2::DHCP_CAPABLE | Status2::EXTENDED_PORT_ADDRESS | Status2::OUTPUT_STYLE,
        status3: Status3::FAILSAFE_SUPPORTED,
        default_responder_uid: RdmUid([0, 0, 0, 0, 0, 0]),
        user_hi: 0,
        user_lo: 0,
        refresh_rate: 40,
        background_queue_policy: 0,
    }));
    let wire = encode(&p);
    assert_eq!(wire.len(), 239);
    match roundtrip(p) {
        Packet::PollReply(got) => {
            assert_eq!(got.short_name, "node");
            assert_eq!(got.long_name, "a long name");
            assert_eq!(got.bind_index, 1);
            assert!(got.status2.contains(Status2::DHCP_CAPABLE));
        }
        other => panic!("expected PollReply, got {other:?}"),
    }
}

#[test]
fn dmx_roundtrips_with_odd_length_payload() {
    let data = Bytes::from_static(&[1, 2, 3]);
    let p = Packet::Dmx(Dmx {
        sequence: 7,
        physical: 0,
        port_address: PortAddress::compose(1, 2, 3).unwrap(),
        length: data.len() as u16,
        data: data.clone(),
    });
    match roundtrip(p) {
        Packet::Dmx(got) => {
            assert_eq!(got.sequence, 7);
            assert_eq!(got.port_address, PortAddress::compose(1, 2, 3).unwrap());
            assert_eq!(got.data, data);
        }
        other => panic!("expected Dmx, got {other:?}"),
    }
}

#[test]
fn dmx_rejects_oversize_payload() {
    let p = Packet::Dmx(Dmx {
        sequence: 0,
        physical: 0,
        port_address: PortAddress::compose(0, 0, 0).unwrap(),
        length: 513,
        data: Bytes::from(vec![0u8; 513]),
    });
    let wire = encode(&p);
    assert!(decode(wire).is_err());
}

#[test]
fn nzs_roundtrips_and_rejects_zero_start_code() {
    let p = Packet::Nzs(Nzs {
        sequence: 1,
        start_code: 0xDD,
        port_address: PortAddress::compose(0, 0, 1).unwrap(),
        length: 2,
        data: Bytes::from_static(&[9, 9]),
    });
    match roundtrip(p) {
        Packet::Nzs(got) => assert_eq!(got.start_code, 0xDD),
        other => panic!("expected Nzs, got {other:?}"),
    }

    let bad = Packet::Nzs(Nzs {
        sequence: 1,
        start_code: 0x00,
        port_address: PortAddress::compose(0, 0, 1).unwrap(),
        length: 1,
        data: Bytes::from_static(&[0]),
    });
    assert!(decode(encode(&bad)).is_err());
}

#[test]
fn sync_roundtrips() {
    let p = Packet::Sync(Sync { aux: 0 });
    match roundtrip(p) {
        Packet::Sync(got) => assert_eq!(got.aux, 0),
        other => panic!("expected Sync, got {other:?}"),
    }
}

#[test]
fn address_roundtrips_optional_fields() {
    let p = Packet::Address(Address {
        net_switch: Some(3),
        bind_index: 1,
        short_name: Some("rig-1".into()),
        long_name: None,
        sw_in: [Some(1), None, None, None],
        sw_out: [None, None, None, None],
        sub_switch: None,
        command: AddressCommand::MergeHtp(2),
    });
    match roundtrip(p) {
        Packet::Address(got) => {
            assert_eq!(got.net_switch, Some(3));
            assert_eq!(got.short_name.as_deref(), Some("rig-1"));
            assert_eq!(got.long_name, None);
            assert_eq!(got.sw_in, [Some(1), None, None, None]);
            assert_eq!(got.command, AddressCommand::MergeHtp(2));
        }
        other => panic!("expected Address, got {other:?}"),
    }
}

#[test]
fn input_roundtrips() {
    let p = Packet::Input(Input {
        bind_index: 2,
        disable: [true, false, true, false],
    });
    match roundtrip(p) {
        Packet::Input(got) => {
            assert_eq!(got.bind_index, 2);
            assert_eq!(got.disable, [true, false, true, false]);
        }
        other => panic!("expected Input, got {other:?}"),
    }
}

#[test]
fn ip_prog_and_reply_roundtrip() {
    let p = Packet::IpProg(IpProg {
        command: IpProgCommand::ENABLE | IpProgCommand::PROGRAM_IP,
        prog_ip: Ipv4Addr::new(192, 168, 1, 2),
        prog_subnet: Ipv4Addr::new(255, 255, 255, 0),
        prog_port: 6454,
        prog_gateway: Ipv4Addr::new(192, 168, 1, 1),
    });
    match roundtrip(p) {
        Packet::IpProg(got) => assert_eq!(got.prog_ip, Ipv4Addr::new(192, 168, 1, 2)),
        other => panic!("expected IpProg, got {other:?}"),
    }

    let reply = Packet::IpProgReply(IpProgReply {
        prog_ip: Ipv4Addr::new(192, 168, 1, 2),
        prog_subnet: Ipv4Addr::new(255, 255, 255, 0),
        prog_port: 6454,
        status: 0,
        prog_gateway: Ipv4Addr::new(192, 168, 1, 1),
        dhcp_enabled: true,
    });
    let wire = encode(&reply);
    assert_eq!(wire.len(), 34);
    match roundtrip(reply) {
        Packet::IpProgReply(got) => assert!(got.dhcp_enabled),
        other => panic!("expected IpProgReply, got {other:?}"),
    }
}

#[test]
fn tod_request_data_control_roundtrip() {
    let req = Packet::TodRequest(TodRequest {
        net: 0,
        command: 0,
        addresses: vec![0, 1, 2],
    });
    match roundtrip(req) {
        Packet::TodRequest(got) => assert_eq!(got.addresses, vec![0, 1, 2]),
        other => panic!("expected TodRequest, got {other:?}"),
    }

    let data = Packet::TodData(TodData {
        rdm_ver: 1,
        port: 1,
        bind_index: 1,
        net: 0,
        command_response: 0,
        port_address: PortAddress::compose(0, 0, 0).unwrap(),
        uid_total: 2,
        block_count: 0,
        uids: vec![RdmUid([1, 2, 3, 4, 5, 6]), RdmUid([6, 5, 4, 3, 2, 1])],
    });
    match roundtrip(data) {
        Packet::TodData(got) => assert_eq!(got.uids.len(), 2),
        other => panic!("expected TodData, got {other:?}"),
    }

    let control = Packet::TodControl(TodControl {
        net: 0,
        command: 0x01,
        port_address: PortAddress::compose(0, 0, 0).unwrap(),
    });
    match roundtrip(control) {
        Packet::TodControl(got) => assert_eq!(got.command, 0x01),
        other => panic!("expected TodControl, got {other:?}"),
    }
}

#[test]
fn rdm_and_rdm_sub_roundtrip() {
    let rdm = Packet::Rdm(Rdm {
        rdm_ver: 1,
        net: 0,
        command: 0,
        port_address: PortAddress::compose(0, 0, 0).unwrap(),
        data: Bytes::from_static(&[0xCC, 0x01, 0x02]),
    });
    match roundtrip(rdm) {
        Packet::Rdm(got) => assert_eq!(&got.data[..], &[0xCC, 0x01, 0x02]),
        other => panic!("expected Rdm, got {other:?}"),
    }

    let sub = Packet::RdmSub(RdmSub {
        rdm_ver: 1,
        uid: RdmUid([1, 2, 3, 4, 5, 6]),
        command_class: 0x20,
        parameter_id: 0x0100,
        sub_device: 1,
        sub_count: 2,
        values: vec![
            RdmSubValue { index: 1, value: 10 },
            RdmSubValue { index: 2, value: 20 },
        ],
    });
    match roundtrip(sub) {
        Packet::RdmSub(got) => {
            assert_eq!(got.values.len(), 2);
            assert_eq!(got.values[0].index, 1);
            assert_eq!(got.values[1].value, 20);
        }
        other => panic!("expected RdmSub, got {other:?}"),
    }
}

#[test]
fn command_trigger_data_roundtrip() {
    let cmd = Packet::Command(Command {
        esta_man: 0x4144,
        text: "SwoutText=1".into(),
    });
    match roundtrip(cmd) {
        Packet::Command(got) => assert_eq!(got.text, "SwoutText=1"),
        other => panic!("expected Command, got {other:?}"),
    }

    let trig = Packet::Trigger(Trigger {
        oem: 0,
        key: 1,
        sub_key: 2,
        data: Bytes::from_static(&[1, 2, 3, 4]),
    });
    match roundtrip(trig) {
        Packet::Trigger(got) => assert_eq!(&got.data[..], &[1, 2, 3, 4]),
        other => panic!("expected Trigger, got {other:?}"),
    }

    let req = Packet::DataRequest(DataRequest {
        esta_man: 0x4144,
        oem: 0,
        request: 1,
    });
    match roundtrip(req) {
        Packet::DataRequest(got) => assert_eq!(got.request, 1),
        other => panic!("expected DataRequest, got {other:?}"),
    }

    let reply = Packet::DataReply(DataReply {
        esta_man: 0x4144,
        oem: 0,
        request: 1,
        payload: Bytes::from_static(b"{}"),
    });
    match roundtrip(reply) {
        Packet::DataReply(got) => assert_eq!(&got.payload[..], b"{}"),
        other => panic!("expected DataReply, got {other:?}"),
    }
}

#[test]
fn firmware_master_and_reply_roundtrip() {
    let master = Packet::FirmwareMaster(FirmwareMaster {
        block_type: FirmwareBlockType::First,
        block_id: 0,
        firmware_length_words: 1024,
        data: Bytes::from(vec![0xAAu8; 64]),
    });
    match roundtrip(master) {
        Packet::FirmwareMaster(got) => {
            assert_eq!(got.block_type, FirmwareBlockType::First);
            assert_eq!(got.data.len(), 64);
        }
        other => panic!("expected FirmwareMaster, got {other:?}"),
    }

    let reply = Packet::FirmwareReply(FirmwareReply {
        status: FirmwareReplyStatus::AllGood,
    });
    match roundtrip(reply) {
        Packet::FirmwareReply(got) => assert_eq!(got.status, FirmwareReplyStatus::AllGood),
        other => panic!("expected FirmwareReply, got {other:?}"),
    }
}

#[test]
fn diag_data_roundtrips() {
    let p = Packet::DiagData(DiagData {
        priority: DiagPriority::High,
        text: "link down".into(),
    });
    match roundtrip(p) {
        Packet::DiagData(got) => {
            assert_eq!(got.text, "link down");
            assert_eq!(got.priority, DiagPriority::High);
        }
        other => panic!("expected DiagData, got {other:?}"),
    }
}

#[test]
fn vlc_roundtrips_flags() {
    let p = Packet::Vlc(Vlc {
        sequence: 1,
        start_code: 0,
        port_address: PortAddress::compose(0, 0, 0).unwrap(),
        ieee: true,
        reply_requested: false,
        beacon: true,
        length: 2,
        data: Bytes::from_static(&[1, 2]),
    });
    match roundtrip(p) {
        Packet::Vlc(got) => {
            assert!(got.ieee);
            assert!(!got.reply_requested);
            assert!(got.beacon);
        }
        other => panic!("expected Vlc, got {other:?}"),
    }
}

#[test]
fn deprecated_mac_opcodes_decode_without_error() {
    let wire = encode(&Packet::Deprecated);
    assert!(matches!(decode(wire).unwrap(), Packet::Deprecated));
}

#[test]
fn opcode_is_little_endian_and_protocol_version_is_big_endian() {
    let wire = encode(&Packet::Sync(Sync { aux: 0 }));
    // OpCode::Sync = 0x5200, little-endian on the wire: low byte first.
    assert_eq!(wire[8], 0x00);
    assert_eq!(wire[9], 0x52);
    assert_eq!(OpCode::from_u16(u16::from_le_bytes([wire[8], wire[9]])).unwrap(), OpCode::Sync);
    // Protocol version is transmitted big-endian.
    assert_eq!(u16::from_be_bytes([wire[10], wire[11]]), 14);
}

#[test]
fn unknown_opcode_is_rejected() {
    let mut wire = encode(&Packet::Sync(Sync { aux: 0 })).to_vec();
    wire[8] = 0xAB;
    wire[9] = 0xCD;
    assert!(decode(Bytes::from(wire)).is_err());
}

#[test]
fn truncated_frame_is_rejected() {
    let wire = encode(&Packet::Poll(Poll {
        flags: TalkToMe::empty(),
        priority: 0,
        target_port_address_top: 0,
        target_port_address_bottom: 0,
        esta_man: 0,
        oem: 0,
    }));
    let truncated = wire.slice(0..wire.len() - 4);
    assert!(decode(truncated).is_err());
}
