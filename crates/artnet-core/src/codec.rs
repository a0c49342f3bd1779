//! Per-opcode wire encode/decode.
//!
//! Every frame is `"Art-Net\0"` (8 bytes) + OpCode (u16 LE) + ProtVer
//! (u16 BE) + an opcode-specific body. [`decode`] reads the common header,
//! looks up the opcode, and dispatches to the matching `decode_*` function;
//! [`encode`] does the reverse via a match on [`Packet`]. All multi-byte
//! body fields are big-endian except OpCode itself (spec.md §4.1).

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};
use crate::field::{
    need, put_ipv4, put_u16_be, put_u16_le, put_u32_be, read_fixed_string, read_ipv4, read_mac,
    read_u16_be, read_u16_le, read_u32_be, slice_payload, slice_payload_len, write_fixed_string,
    RdmUid,
};
use crate::flags::{Status1, Status2, Status3, TalkToMe};
use crate::opcode::OpCode;
use crate::packet::*;
use crate::port_address::PortAddress;

const ID: &[u8; 8] = b"Art-Net\0";
const HEADER_LEN: usize = 12; // ID(8) + OpCode(2) + ProtVer(2)
const PROTOCOL_VERSION: u16 = 14;

const SHORT_NAME_WIDTH: usize = 18;
const LONG_NAME_WIDTH: usize = 64;
const NODE_REPORT_WIDTH: usize = 64;
const POLL_REPLY_LEN: usize = 239;
const NO_CHANGE_U8: u8 = 0xFF;

fn header(out: &mut BytesMut, op: OpCode) {
    out.put_slice(ID);
    put_u16_le(out, op.to_u16());
    put_u16_be(out, PROTOCOL_VERSION);
}

fn check_identifier(buf: &[u8]) -> Result<()> {
    if buf.len() < 8 || &buf[0..8] != ID {
        return Err(Error::InvalidIdentifier);
    }
    Ok(())
}

/// Decode a complete Art-Net frame from a zero-copy `Bytes` buffer.
pub fn decode(buf: Bytes) -> Result<Packet> {
    check_identifier(&buf)?;
    need(buf.len(), 0, HEADER_LEN, HEADER_LEN)?;
    let op_value = read_u16_le(&buf[8..10]);
    let op = OpCode::from_u16(op_value)?;
    if op.is_deprecated() {
        return Ok(Packet::Deprecated);
    }
    // ProtVer at buf[10..12] is read but not enforced beyond "parses as u16";
    // nodes have shipped mismatched minor versions in the wild.
    let _prot_ver = read_u16_be(&buf[10..12]);
    match op {
        OpCode::Poll => decode_poll(&buf),
        OpCode::PollReply => decode_poll_reply(&buf),
        OpCode::Dmx => decode_dmx(&buf),
        OpCode::Nzs => decode_nzs(&buf),
        OpCode::Vlc => decode_vlc(&buf),
        OpCode::Sync => decode_sync(&buf),
        OpCode::Address => decode_address(&buf),
        OpCode::Input => decode_input(&buf),
        OpCode::IpProg => decode_ip_prog(&buf),
        OpCode::IpProgReply => decode_ip_prog_reply(&buf),
        OpCode::TodRequest => decode_tod_request(&buf),
        OpCode::TodData => decode_tod_data(&buf),
        OpCode::TodControl => decode_tod_control(&buf),
        OpCode::Rdm => decode_rdm(&buf),
        OpCode::RdmSub => decode_rdm_sub(&buf),
        OpCode::Command => decode_command(&buf),
        OpCode::Trigger => decode_trigger(&buf),
        OpCode::DataRequest => decode_data_request(&buf),
        OpCode::DataReply => decode_data_reply(&buf),
        OpCode::FirmwareMaster => decode_firmware_master(&buf),
        OpCode::FirmwareReply => decode_firmware_reply(&buf),
        OpCode::DiagData => decode_diag_data(&buf),
        OpCode::MacMaster | OpCode::MacSlave => Ok(Packet::Deprecated),
        other => Err(Error::UnsupportedOpCode(other.to_u16())),
    }
}

// The decode_* helpers below take `&Bytes` (not `&[u8]`) specifically so
// they can hand out zero-copy `Payload` slices of the original receive
// buffer via [`slice_payload`]/[`slice_payload_len`] instead of copying.

/// Encode a [`Packet`] into a fresh `Bytes` buffer.
pub fn encode(packet: &Packet) -> Bytes {
    let mut out = BytesMut::new();
    match packet {
        Packet::Poll(p) => encode_poll(&mut out, p),
        Packet::PollReply(p) => encode_poll_reply(&mut out, p),
        Packet::Dmx(p) => encode_dmx(&mut out, p),
        Packet::Nzs(p) => encode_nzs(&mut out, p),
        Packet::Vlc(p) => encode_vlc(&mut out, p),
        Packet::Sync(p) => encode_sync(&mut out, p),
        Packet::Address(p) => encode_address(&mut out, p),
        Packet::Input(p) => encode_input(&mut out, p),
        Packet::IpProg(p) => encode_ip_prog(&mut out, p),
        Packet::IpProgReply(p) => encode_ip_prog_reply(&mut out, p),
        Packet::TodRequest(p) => encode_tod_request(&mut out, p),
        Packet::TodData(p) => encode_tod_data(&mut out, p),
        Packet::TodControl(p) => encode_tod_control(&mut out, p),
        Packet::Rdm(p) => encode_rdm(&mut out, p),
        Packet::RdmSub(p) => encode_rdm_sub(&mut out, p),
        Packet::Command(p) => encode_command(&mut out, p),
        Packet::Trigger(p) => encode_trigger(&mut out, p),
        Packet::DataRequest(p) => encode_data_request(&mut out, p),
        Packet::DataReply(p) => encode_data_reply(&mut out, p),
        Packet::FirmwareMaster(p) => encode_firmware_master(&mut out, p),
        Packet::FirmwareReply(p) => encode_firmware_reply(&mut out, p),
        Packet::DiagData(p) => encode_diag_data(&mut out, p),
        Packet::Deprecated => header(&mut out, OpCode::MacMaster),
    }
    out.freeze()
}

// ---- ArtPoll ----------------------------------------------------------

const POLL_LEN: usize = 22;

fn decode_poll(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, POLL_LEN, POLL_LEN)?;
    Ok(Packet::Poll(Poll {
        flags: TalkToMe::from_bits_truncate(buf[12]),
        priority: buf[13],
        target_port_address_top: read_u16_be(&buf[14..16]),
        target_port_address_bottom: read_u16_be(&buf[16..18]),
        esta_man: read_u16_le(&buf[18..20]),
        oem: read_u16_be(&buf[20..22]),
    }))
}

fn encode_poll(out: &mut BytesMut, p: &Poll) {
    header(out, OpCode::Poll);
    out.put_u8(p.flags.bits());
    out.put_u8(p.priority);
    put_u16_be(out, p.target_port_address_top);
    put_u16_be(out, p.target_port_address_bottom);
    put_u16_le(out, p.esta_man);
    put_u16_be(out, p.oem);
}

// ---- ArtPollReply -------------------------------------------------------

fn decode_poll_reply(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, POLL_REPLY_LEN, POLL_REPLY_LEN)?;
    let mut ports = [PortEntry::default(); 4];
    let port_types = &buf[176..180];
    let good_input = &buf[180..184];
    let good_output_a = &buf[184..188];
    let sw_in = &buf[188..192];
    let sw_out = &buf[192..196];
    let good_output_b = &buf[215..219];
    for i in 0..4 {
        ports[i] = PortEntry {
            port_type: port_types[i],
            good_input: good_input[i],
            good_output_a: good_output_a[i],
            good_output_b: good_output_b[i],
            sw_in: sw_in[i],
            sw_out: sw_out[i],
        };
    }
    Ok(Packet::PollReply(Box::new(PollReply {
        address: read_ipv4(&buf[12..16]),
        port: read_u16_le(&buf[16..18]),
        version: read_u16_be(&buf[18..20]),
        net_switch: buf[20],
        sub_switch: buf[21],
        oem: read_u16_be(&buf[22..24]),
        ubea_version: buf[24],
        status1: Status1::from_bits_truncate(buf[25]),
        esta_man: read_u16_le(&buf[26..28]),
        short_name: read_fixed_string(&buf[28..46]),
        long_name: read_fixed_string(&buf[46..110]),
        node_report: read_fixed_string(&buf[110..174]),
        num_ports: read_u16_be(&buf[174..176]),
        ports,
        sw_video: buf[196],
        sw_macro: buf[197],
        sw_remote: buf[198],
        style: buf[202],
        mac: read_mac(&buf[203..209]),
        bind_ip: read_ipv4(&buf[209..213]),
        bind_index: buf[213],
        status2: Status2::from_bits_truncate(buf[214]),
        status3: Status3::from_bits_truncate(buf[219]),
        default_responder_uid: RdmUid::from_bytes(&buf[220..226]),
        user_hi: buf[226],
        user_lo: buf[227],
        refresh_rate: buf[228],
        background_queue_policy: buf[229],
    })))
}

fn encode_poll_reply(out: &mut BytesMut, p: &PollReply) {
    header(out, OpCode::PollReply);
    put_ipv4(out, p.address);
    put_u16_le(out, p.port);
    put_u16_be(out, p.version);
    out.put_u8(p.net_switch);
    out.put_u8(p.sub_switch);
    put_u16_be(out, p.oem);
    out.put_u8(p.ubea_version);
    out.put_u8(p.status1.bits());
    put_u16_le(out, p.esta_man);
    let _ = write_fixed_string(out, "short_name", &p.short_name, SHORT_NAME_WIDTH);
    let _ = write_fixed_string(out, "long_name", &p.long_name, LONG_NAME_WIDTH);
    let _ = write_fixed_string(out, "node_report", &p.node_report, NODE_REPORT_WIDTH);
    put_u16_be(out, p.num_ports);
    for port in &p.ports {
        out.put_u8(port.port_type);
    }
    for port in &p.ports {
        out.put_u8(port.good_input);
    }
    for port in &p.ports {
        out.put_u8(port.good_output_a);
    }
    for port in &p.ports {
        out.put_u8(port.sw_in);
    }
    for port in &p.ports {
        out.put_u8(port.sw_out);
    }
    out.put_u8(p.sw_video);
    out.put_u8(p.sw_macro);
    out.put_u8(p.sw_remote);
    out.put_bytes(0, 3); // spare
    out.put_u8(p.style);
    out.put_slice(&p.mac);
    put_ipv4(out, p.bind_ip);
    out.put_u8(p.bind_index);
    out.put_u8(p.status2.bits());
    for port in &p.ports {
        out.put_u8(port.good_output_b);
    }
    out.put_u8(p.status3.bits());
    p.default_responder_uid.write(out);
    out.put_u8(p.user_hi);
    out.put_u8(p.user_lo);
    out.put_u8(p.refresh_rate);
    out.put_u8(p.background_queue_policy);
    out.put_bytes(0, 9); // reserved, pads the frame to the fixed 239 bytes
    debug_assert_eq!(out.len(), POLL_REPLY_LEN);
}

// ---- ArtDmx / ArtNzs ----------------------------------------------------

const DMX_HEADER_LEN: usize = 18;

fn decode_dmx(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, DMX_HEADER_LEN, DMX_HEADER_LEN)?;
    let length = read_u16_be(&buf[16..18]) as usize;
    need(buf.len(), DMX_HEADER_LEN, length, DMX_HEADER_LEN + length)?;
    if length == 0 || length > 512 {
        return Err(Error::DmxLengthOutOfRange(length));
    }
    Ok(Packet::Dmx(Dmx {
        sequence: buf[12],
        physical: buf[13],
        port_address: PortAddress::from_bytes(buf[14], buf[15]),
        length: length as u16,
        data: slice_payload_len(buf, DMX_HEADER_LEN, length),
    }))
}

fn encode_dmx(out: &mut BytesMut, p: &Dmx) {
    header(out, OpCode::Dmx);
    out.put_u8(p.sequence);
    out.put_u8(p.physical);
    let (lo, hi) = p.port_address.to_bytes();
    out.put_u8(lo);
    out.put_u8(hi);
    put_u16_be(out, p.length);
    out.put_slice(&p.data);
}

fn decode_nzs(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, DMX_HEADER_LEN, DMX_HEADER_LEN)?;
    let length = read_u16_be(&buf[16..18]) as usize;
    need(buf.len(), DMX_HEADER_LEN, length, DMX_HEADER_LEN + length)?;
    let start_code = buf[13];
    if start_code == 0 {
        return Err(Error::InvalidNzsStartCode(start_code));
    }
    Ok(Packet::Nzs(Nzs {
        sequence: buf[12],
        start_code,
        port_address: PortAddress::from_bytes(buf[14], buf[15]),
        length: length as u16,
        data: slice_payload_len(buf, DMX_HEADER_LEN, length),
    }))
}

fn encode_nzs(out: &mut BytesMut, p: &Nzs) {
    header(out, OpCode::Nzs);
    out.put_u8(p.sequence);
    out.put_u8(p.start_code);
    let (lo, hi) = p.port_address.to_bytes();
    out.put_u8(lo);
    out.put_u8(hi);
    put_u16_be(out, p.length);
    out.put_slice(&p.data);
}

// ---- ArtVlc --------------------------------------------------------------

const VLC_HEADER_LEN: usize = 20;

fn decode_vlc(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, VLC_HEADER_LEN, VLC_HEADER_LEN)?;
    let flags = buf[16];
    let length = read_u16_be(&buf[18..20]) as usize;
    need(buf.len(), VLC_HEADER_LEN, length, VLC_HEADER_LEN + length)?;
    Ok(Packet::Vlc(Vlc {
        sequence: buf[12],
        start_code: buf[13],
        port_address: PortAddress::from_bytes(buf[14], buf[15]),
        ieee: flags & 0b001 != 0,
        reply_requested: flags & 0b010 != 0,
        beacon: flags & 0b100 != 0,
        length: length as u16,
        data: slice_payload_len(buf, VLC_HEADER_LEN, length),
    }))
}

fn encode_vlc(out: &mut BytesMut, p: &Vlc) {
    header(out, OpCode::Vlc);
    out.put_u8(p.sequence);
    out.put_u8(p.start_code);
    let (lo, hi) = p.port_address.to_bytes();
    out.put_u8(lo);
    out.put_u8(hi);
    let flags = (p.ieee as u8) | ((p.reply_requested as u8) << 1) | ((p.beacon as u8) << 2);
    out.put_u8(flags);
    out.put_u8(0); // reserved
    put_u16_be(out, p.length);
    out.put_slice(&p.data);
}

// ---- ArtSync ------------------------------------------------------------

const SYNC_LEN: usize = 14;

fn decode_sync(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, SYNC_LEN, SYNC_LEN)?;
    Ok(Packet::Sync(Sync { aux: buf[12] }))
}

fn encode_sync(out: &mut BytesMut, p: &Sync) {
    header(out, OpCode::Sync);
    out.put_u8(p.aux);
    out.put_u8(0); // reserved
}

// ---- ArtAddress -----------------------------------------------------------

const ADDRESS_LEN: usize = 107;

fn opt_u8(b: u8) -> Option<u8> {
    if b == NO_CHANGE_U8 {
        None
    } else {
        Some(b)
    }
}

fn put_opt_u8(out: &mut BytesMut, v: Option<u8>) {
    out.put_u8(v.unwrap_or(NO_CHANGE_U8));
}

fn opt_string(buf: &[u8]) -> Option<String> {
    if buf[0] == 0 {
        None
    } else {
        Some(read_fixed_string(buf))
    }
}

fn decode_address(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, ADDRESS_LEN, ADDRESS_LEN)?;
    let mut sw_in = [None; 4];
    let mut sw_out = [None; 4];
    for i in 0..4 {
        sw_in[i] = opt_u8(buf[96 + i]);
        sw_out[i] = opt_u8(buf[100 + i]);
    }
    Ok(Packet::Address(Address {
        net_switch: opt_u8(buf[12]),
        bind_index: buf[13],
        short_name: opt_string(&buf[14..32]),
        long_name: opt_string(&buf[32..96]),
        sw_in,
        sw_out,
        sub_switch: opt_u8(buf[104]),
        command: AddressCommand::from_byte(buf[106]),
    }))
}

fn address_command_byte(c: AddressCommand) -> u8 {
    match c {
        AddressCommand::None => 0x00,
        AddressCommand::CancelMerge => 0x01,
        AddressCommand::ClearAllOutputPorts => 0x90,
        AddressCommand::LedNormal => 0x91,
        AddressCommand::LedMute => 0x92,
        AddressCommand::LedLocate => 0x93,
        AddressCommand::MergeLtp(p) => 0x10 + p,
        AddressCommand::MergeHtp(p) => 0x50 + p,
        AddressCommand::ArtNetSel(p) => 0x60 + p,
        AddressCommand::AcnSel(p) => 0x70 + p,
        AddressCommand::FailsafeHold => 0x08,
        AddressCommand::FailsafeZero => 0x09,
        AddressCommand::FailsafeFull => 0x0A,
        AddressCommand::FailsafeScene => 0x0B,
        AddressCommand::FailsafeRecord => 0x0C,
        AddressCommand::InputPortDirection(p) => 0x20 + p,
        AddressCommand::OutputPortDirection(p) => 0x30 + p,
        AddressCommand::BackgroundQueuePolicy(p) => 0xE0 + p,
        AddressCommand::Unknown(b) => b,
    }
}

fn encode_address(out: &mut BytesMut, p: &Address) {
    header(out, OpCode::Address);
    put_opt_u8(out, p.net_switch);
    out.put_u8(p.bind_index);
    match &p.short_name {
        Some(s) => {
            let _ = write_fixed_string(out, "short_name", s, SHORT_NAME_WIDTH);
        }
        None => out.put_bytes(0, SHORT_NAME_WIDTH),
    }
    match &p.long_name {
        Some(s) => {
            let _ = write_fixed_string(out, "long_name", s, LONG_NAME_WIDTH);
        }
        None => out.put_bytes(0, LONG_NAME_WIDTH),
    }
    for v in p.sw_in {
        put_opt_u8(out, v);
    }
    for v in p.sw_out {
        put_opt_u8(out, v);
    }
    put_opt_u8(out, p.sub_switch);
    out.put_u8(0); // reserved
    out.put_u8(address_command_byte(p.command));
}

// ---- ArtInput -------------------------------------------------------------

const INPUT_LEN: usize = 18;

fn decode_input(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, INPUT_LEN, INPUT_LEN)?;
    let mut disable = [false; 4];
    for i in 0..4 {
        disable[i] = buf[14 + i] & 0x01 != 0;
    }
    Ok(Packet::Input(Input {
        bind_index: buf[12],
        disable,
    }))
}

fn encode_input(out: &mut BytesMut, p: &Input) {
    header(out, OpCode::Input);
    out.put_u8(p.bind_index);
    out.put_u8(0); // reserved
    for d in p.disable {
        out.put_u8(d as u8);
    }
}

// ---- ArtIpProg / ArtIpProgReply --------------------------------------------

const IP_PROG_LEN: usize = 32;
const IP_PROG_REPLY_LEN: usize = 34;

fn decode_ip_prog(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, IP_PROG_LEN, IP_PROG_LEN)?;
    Ok(Packet::IpProg(IpProg {
        command: IpProgCommand::from_bits_truncate(buf[12]),
        prog_ip: read_ipv4(&buf[14..18]),
        prog_subnet: read_ipv4(&buf[18..22]),
        prog_port: read_u16_be(&buf[22..24]),
        prog_gateway: read_ipv4(&buf[24..28]),
    }))
}

fn encode_ip_prog(out: &mut BytesMut, p: &IpProg) {
    header(out, OpCode::IpProg);
    out.put_u8(p.command.bits());
    out.put_u8(0); // reserved
    put_ipv4(out, p.prog_ip);
    put_ipv4(out, p.prog_subnet);
    put_u16_be(out, p.prog_port);
    put_ipv4(out, p.prog_gateway);
    out.put_bytes(0, 4); // spare
}

fn decode_ip_prog_reply(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, IP_PROG_REPLY_LEN, IP_PROG_REPLY_LEN)?;
    Ok(Packet::IpProgReply(IpProgReply {
        prog_ip: read_ipv4(&buf[16..20]),
        prog_subnet: read_ipv4(&buf[20..24]),
        prog_port: read_u16_be(&buf[24..26]),
        status: buf[26],
        prog_gateway: read_ipv4(&buf[28..32]),
        dhcp_enabled: buf[32] != 0,
    }))
}

fn encode_ip_prog_reply(out: &mut BytesMut, p: &IpProgReply) {
    header(out, OpCode::IpProgReply);
    out.put_bytes(0, 4); // filler
    put_ipv4(out, p.prog_ip);
    put_ipv4(out, p.prog_subnet);
    put_u16_be(out, p.prog_port);
    out.put_u8(p.status);
    out.put_u8(0); // spare
    put_ipv4(out, p.prog_gateway);
    out.put_u8(p.dhcp_enabled as u8);
    out.put_u8(0); // spare
    debug_assert_eq!(out.len(), IP_PROG_REPLY_LEN);
}

// ---- ArtTodRequest / ArtTodData / ArtTodControl ----------------------------

const TOD_REQUEST_HEADER_LEN: usize = 21;

fn decode_tod_request(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, TOD_REQUEST_HEADER_LEN, TOD_REQUEST_HEADER_LEN)?;
    let count = buf[20] as usize;
    need(buf.len(), TOD_REQUEST_HEADER_LEN, count, TOD_REQUEST_HEADER_LEN + count)?;
    Ok(Packet::TodRequest(TodRequest {
        net: buf[12],
        command: buf[19],
        addresses: buf[21..21 + count].to_vec(),
    }))
}

fn encode_tod_request(out: &mut BytesMut, p: &TodRequest) {
    header(out, OpCode::TodRequest);
    out.put_u8(p.net);
    out.put_bytes(0, 6); // spare
    out.put_u8(p.command);
    out.put_u8(p.addresses.len() as u8);
    out.put_slice(&p.addresses);
}

const TOD_DATA_HEADER_LEN: usize = 23;

fn decode_tod_data(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, TOD_DATA_HEADER_LEN, TOD_DATA_HEADER_LEN)?;
    let count = buf[22] as usize;
    let needed = count * 6;
    need(buf.len(), TOD_DATA_HEADER_LEN, needed, TOD_DATA_HEADER_LEN + needed)?;
    let uids = buf[23..23 + needed]
        .chunks_exact(6)
        .map(RdmUid::from_bytes)
        .collect();
    Ok(Packet::TodData(TodData {
        rdm_ver: buf[12],
        port: buf[13],
        bind_index: buf[14],
        net: buf[15],
        command_response: buf[16],
        port_address: PortAddress::from_bytes(buf[17], buf[18]),
        uid_total: read_u16_be(&buf[19..21]),
        block_count: buf[21],
        uids,
    }))
}

fn encode_tod_data(out: &mut BytesMut, p: &TodData) {
    header(out, OpCode::TodData);
    out.put_u8(p.rdm_ver);
    out.put_u8(p.port);
    out.put_u8(p.bind_index);
    out.put_u8(p.net);
    out.put_u8(p.command_response);
    let (lo, hi) = p.port_address.to_bytes();
    out.put_u8(lo);
    out.put_u8(hi);
    put_u16_be(out, p.uid_total);
    out.put_u8(p.block_count);
    out.put_u8(p.uids.len() as u8);
    for uid in &p.uids {
        uid.write(out);
    }
}

const TOD_CONTROL_LEN: usize = 22;

fn decode_tod_control(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, TOD_CONTROL_LEN, TOD_CONTROL_LEN)?;
    Ok(Packet::TodControl(TodControl {
        net: buf[12],
        command: buf[19],
        port_address: PortAddress::from_bytes(buf[20], buf[21]),
    }))
}

fn encode_tod_control(out: &mut BytesMut, p: &TodControl) {
    header(out, OpCode::TodControl);
    out.put_u8(p.net);
    out.put_bytes(0, 6); // spare
    out.put_u8(p.command);
    let (lo, hi) = p.port_address.to_bytes();
    out.put_u8(lo);
    out.put_u8(hi);
}

// ---- ArtRdm / ArtRdmSub -----------------------------------------------------

const RDM_HEADER_LEN: usize = 17;

fn decode_rdm(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, RDM_HEADER_LEN, RDM_HEADER_LEN)?;
    Ok(Packet::Rdm(Rdm {
        rdm_ver: buf[12],
        net: buf[13],
        command: buf[14],
        port_address: PortAddress::from_bytes(buf[15], buf[16]),
        data: slice_payload(buf, RDM_HEADER_LEN),
    }))
}

fn encode_rdm(out: &mut BytesMut, p: &Rdm) {
    header(out, OpCode::Rdm);
    out.put_u8(p.rdm_ver);
    out.put_u8(p.net);
    out.put_u8(p.command);
    let (lo, hi) = p.port_address.to_bytes();
    out.put_u8(lo);
    out.put_u8(hi);
    out.put_slice(&p.data);
}

const RDM_SUB_HEADER_LEN: usize = 26;

fn decode_rdm_sub(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, RDM_SUB_HEADER_LEN, RDM_SUB_HEADER_LEN)?;
    let sub_device = read_u16_be(&buf[22..24]);
    let sub_count = read_u16_be(&buf[24..26]);
    let needed = sub_count as usize * 2;
    need(buf.len(), RDM_SUB_HEADER_LEN, needed, RDM_SUB_HEADER_LEN + needed)?;
    let values = buf[26..26 + needed]
        .chunks_exact(2)
        .enumerate()
        .map(|(i, chunk)| RdmSubValue {
            index: sub_device + i as u16,
            value: read_u16_be(chunk),
        })
        .collect();
    Ok(Packet::RdmSub(RdmSub {
        rdm_ver: buf[12],
        uid: RdmUid::from_bytes(&buf[13..19]),
        command_class: buf[19],
        parameter_id: read_u16_be(&buf[20..22]),
        sub_device,
        sub_count,
        values,
    }))
}

fn encode_rdm_sub(out: &mut BytesMut, p: &RdmSub) {
    header(out, OpCode::RdmSub);
    out.put_u8(p.rdm_ver);
    p.uid.write(out);
    out.put_u8(p.command_class);
    put_u16_be(out, p.parameter_id);
    put_u16_be(out, p.sub_device);
    put_u16_be(out, p.sub_count);
    for v in &p.values {
        put_u16_be(out, v.value);
    }
}

// ---- ArtCommand -------------------------------------------------------------

const COMMAND_HEADER_LEN: usize = 16;

fn decode_command(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, COMMAND_HEADER_LEN, COMMAND_HEADER_LEN)?;
    let length = read_u16_be(&buf[14..16]) as usize;
    need(buf.len(), COMMAND_HEADER_LEN, length, COMMAND_HEADER_LEN + length)?;
    let text = read_fixed_string(&buf[16..16 + length]);
    Ok(Packet::Command(Command {
        esta_man: read_u16_le(&buf[12..14]),
        text,
    }))
}

fn encode_command(out: &mut BytesMut, p: &Command) {
    header(out, OpCode::Command);
    put_u16_le(out, p.esta_man);
    // length includes a trailing NUL, matching read_fixed_string's terminator search
    put_u16_be(out, p.text.len() as u16 + 1);
    out.put_slice(p.text.as_bytes());
    out.put_u8(0);
}

// ---- ArtTrigger -------------------------------------------------------------

const TRIGGER_HEADER_LEN: usize = 16;

fn decode_trigger(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, TRIGGER_HEADER_LEN, TRIGGER_HEADER_LEN)?;
    Ok(Packet::Trigger(Trigger {
        oem: read_u16_be(&buf[12..14]),
        key: buf[14],
        sub_key: buf[15],
        data: slice_payload(buf, TRIGGER_HEADER_LEN),
    }))
}

fn encode_trigger(out: &mut BytesMut, p: &Trigger) {
    header(out, OpCode::Trigger);
    put_u16_be(out, p.oem);
    out.put_u8(p.key);
    out.put_u8(p.sub_key);
    out.put_slice(&p.data);
}

// ---- ArtDataRequest / ArtDataReply ------------------------------------------

const DATA_REQUEST_LEN: usize = 18;
const DATA_REPLY_HEADER_LEN: usize = 18;

fn decode_data_request(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, DATA_REQUEST_LEN, DATA_REQUEST_LEN)?;
    Ok(Packet::DataRequest(DataRequest {
        esta_man: read_u16_le(&buf[12..14]),
        oem: read_u16_be(&buf[14..16]),
        request: read_u16_be(&buf[16..18]),
    }))
}

fn encode_data_request(out: &mut BytesMut, p: &DataRequest) {
    header(out, OpCode::DataRequest);
    put_u16_le(out, p.esta_man);
    put_u16_be(out, p.oem);
    put_u16_be(out, p.request);
}

fn decode_data_reply(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, DATA_REPLY_HEADER_LEN, DATA_REPLY_HEADER_LEN)?;
    Ok(Packet::DataReply(DataReply {
        esta_man: read_u16_le(&buf[12..14]),
        oem: read_u16_be(&buf[14..16]),
        request: read_u16_be(&buf[16..18]),
        payload: slice_payload(buf, DATA_REPLY_HEADER_LEN),
    }))
}

fn encode_data_reply(out: &mut BytesMut, p: &DataReply) {
    header(out, OpCode::DataReply);
    put_u16_le(out, p.esta_man);
    put_u16_be(out, p.oem);
    put_u16_be(out, p.request);
    out.put_slice(&p.payload);
}

// ---- ArtFirmwareMaster / ArtFirmwareReply -----------------------------------

const FIRMWARE_MASTER_HEADER_LEN: usize = 36;

fn decode_firmware_master(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, FIRMWARE_MASTER_HEADER_LEN, FIRMWARE_MASTER_HEADER_LEN)?;
    let block_type =
        FirmwareBlockType::from_byte(buf[12]).ok_or(Error::InvalidFirmwareBlockType(buf[12]))?;
    Ok(Packet::FirmwareMaster(FirmwareMaster {
        block_type,
        block_id: buf[13],
        firmware_length_words: read_u32_be(&buf[14..18]),
        data: slice_payload(buf, FIRMWARE_MASTER_HEADER_LEN),
    }))
}

fn encode_firmware_master(out: &mut BytesMut, p: &FirmwareMaster) {
    header(out, OpCode::FirmwareMaster);
    out.put_u8(p.block_type.to_byte());
    out.put_u8(p.block_id);
    put_u32_be(out, p.firmware_length_words);
    out.put_bytes(0, 18); // spare
    out.put_slice(&p.data);
}

const FIRMWARE_REPLY_LEN: usize = 13;

fn decode_firmware_reply(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, FIRMWARE_REPLY_LEN, FIRMWARE_REPLY_LEN)?;
    let status = match buf[12] {
        0x00 => FirmwareReplyStatus::Fail,
        0x01 => FirmwareReplyStatus::BlockGood,
        0x02 => FirmwareReplyStatus::AllGood,
        other => return Err(Error::InvalidFirmwareStatus(other)),
    };
    Ok(Packet::FirmwareReply(FirmwareReply { status }))
}

fn encode_firmware_reply(out: &mut BytesMut, p: &FirmwareReply) {
    header(out, OpCode::FirmwareReply);
    let status = match p.status {
        FirmwareReplyStatus::Fail => 0x00,
        FirmwareReplyStatus::BlockGood => 0x01,
        FirmwareReplyStatus::AllGood => 0x02,
    };
    out.put_u8(status);
}

// ---- ArtDiagData ------------------------------------------------------------

const DIAG_DATA_HEADER_LEN: usize = 16;

fn decode_diag_data(buf: &Bytes) -> Result<Packet> {
    need(buf.len(), 0, DIAG_DATA_HEADER_LEN, DIAG_DATA_HEADER_LEN)?;
    let length = read_u16_be(&buf[14..16]) as usize;
    need(buf.len(), DIAG_DATA_HEADER_LEN, length, DIAG_DATA_HEADER_LEN + length)?;
    let text = read_fixed_string(&buf[16..16 + length]);
    Ok(Packet::DiagData(DiagData {
        priority: DiagPriority::from_byte(buf[12]),
        text,
    }))
}

fn encode_diag_data(out: &mut BytesMut, p: &DiagData) {
    header(out, OpCode::DiagData);
    out.put_u8(p.priority as u8);
    out.put_u8(0); // reserved
    // length includes a trailing NUL, matching read_fixed_string's terminator search
    put_u16_be(out, p.text.len() as u16 + 1);
    out.put_slice(p.text.as_bytes());
    out.put_u8(0);
}
