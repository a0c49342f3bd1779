//! ArtFirmwareMaster handler — chunked firmware transfer sessions
//! (spec.md §4.2 "ArtFirmwareMaster", §3 "RDM state: firmware sessions").

use std::net::SocketAddrV4;

use artnet_core::packet::{FirmwareBlockType, FirmwareMaster, FirmwareReply, FirmwareReplyStatus, Packet};

use crate::effect::{CallbackEffect, CallbackKey, CallbackPayload, Effect, FirmwareEvent};
use crate::event::Timestamp;
use crate::state::{FirmwareSession, NodeState};

fn reply(status: FirmwareReplyStatus, target: SocketAddrV4) -> Effect {
    Effect::TxPacket {
        packet: Packet::FirmwareReply(FirmwareReply { status }),
        target,
        broadcast: false,
    }
}

fn callback(event: FirmwareEvent) -> Effect {
    Effect::Callback(CallbackEffect { key: CallbackKey::Firmware, payload: CallbackPayload::Firmware { event } })
}

/// Ones-complement checksum over the accumulated firmware image, matching
/// the ArtFirmwareMaster 16-bit words the frame is specified in.
fn ones_complement_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    for chunk in data.chunks(2) {
        let word = if chunk.len() == 2 { u16::from_be_bytes([chunk[0], chunk[1]]) } else { (chunk[0] as u16) << 8 };
        sum = sum.wrapping_add(word as u32);
    }
    while sum > 0xFFFF {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

pub fn handle_firmware_master(
    state: &mut NodeState,
    master: &FirmwareMaster,
    sender: SocketAddrV4,
    _now: Timestamp,
) -> Vec<Effect> {
    state.stats.rx_artfirmwaremaster += 1;
    state.stats.firmware_requests += 1;
    let peer = (*sender.ip(), sender.port());
    match master.block_type {
        FirmwareBlockType::First | FirmwareBlockType::UfFirst => {
            state.rdm.firmware_sessions.insert(
                peer,
                FirmwareSession {
                    expected_length_words: master.firmware_length_words,
                    accumulated: master.data.to_vec(),
                    checksum_accumulator: 0,
                    last_block_id: Some(master.block_id),
                },
            );
            vec![reply(FirmwareReplyStatus::BlockGood, sender), callback(FirmwareEvent::BlockGood)]
        }
        FirmwareBlockType::Continue | FirmwareBlockType::UfContinue => {
            if let Some(session) = state.rdm.firmware_sessions.get_mut(&peer) {
                session.accumulated.extend_from_slice(&master.data);
                session.last_block_id = Some(master.block_id);
            }
            vec![reply(FirmwareReplyStatus::BlockGood, sender), callback(FirmwareEvent::BlockGood)]
        }
        FirmwareBlockType::Last | FirmwareBlockType::UfLast => {
            let Some(mut session) = state.rdm.firmware_sessions.remove(&peer) else {
                return vec![reply(FirmwareReplyStatus::Fail, sender), callback(FirmwareEvent::Failed)];
            };
            session.accumulated.extend_from_slice(&master.data);
            let expected_bytes = session.expected_length_words as usize * 2;
            let checksum = ones_complement_checksum(&session.accumulated);
            if session.accumulated.len() != expected_bytes || checksum != 0 {
                return vec![reply(FirmwareReplyStatus::Fail, sender), callback(FirmwareEvent::Failed)];
            }
            vec![reply(FirmwareReplyStatus::AllGood, sender), callback(FirmwareEvent::Complete)]
        }
    }
}
