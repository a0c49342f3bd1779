//! ArtDataRequest handler (spec.md §4.2 "ArtDataRequest").

use std::net::SocketAddrV4;

use artnet_core::packet::{DataReply, DataRequest, Packet};

use crate::effect::{CallbackEffect, CallbackKey, CallbackPayload, Effect};
use crate::event::Timestamp;
use crate::state::NodeState;

/// The `dr-poll` request variant (spec.md §4.2 ArtDataRequest: "`dr-poll`
/// returns an empty reply when any response is configured").
const DR_POLL: u16 = 0x0000;

pub fn handle_data_request(
    state: &mut NodeState,
    request: &DataRequest,
    sender: SocketAddrV4,
    _now: Timestamp,
) -> Vec<Effect> {
    state.stats.rx_artdatarequest += 1;
    if request.esta_man != state.identity.esta_man || request.oem != state.identity.oem {
        return Vec::new();
    }

    let mut effects = vec![Effect::Callback(CallbackEffect {
        key: CallbackKey::DataRequest,
        payload: CallbackPayload::DataRequest { request: request.request },
    })];

    if let Some(payload) = state.config_data_response(request.request) {
        let payload = if request.request == DR_POLL { bytes::Bytes::new() } else { payload };
        effects.push(Effect::TxPacket {
            packet: Packet::DataReply(DataReply {
                esta_man: state.identity.esta_man,
                oem: state.identity.oem,
                request: request.request,
                payload,
            }),
            target: sender,
            broadcast: false,
        });
    }
    effects
}
