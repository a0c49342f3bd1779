//! HTP/LTP merge across DMX sources for a single port-address
//! (spec.md §3 "DMX state", §8 invariants 8-10).

use std::net::Ipv4Addr;

use bytes::{Bytes, BytesMut};

use crate::config::MergeMode;
use crate::event::Timestamp;
use crate::state::{DmxPortState, DmxSource, LastOutput};

/// Drops sources untouched for `timeout`. Returns `true` if the port was
/// merging two-or-more sources before the purge and is not anymore — the
/// caller uses this to know when to clear the good-output-a "merging" bit.
pub fn purge_stale_sources(port: &mut DmxPortState, now: Timestamp, timeout: std::time::Duration) -> bool {
    let was_merging = port.is_merging();
    port.sources.retain(|_, src| now.saturating_sub(src.last_updated) < timeout);
    if let Some(owner) = port.exclusive_owner {
        if !port.sources.contains_key(&owner) {
            port.exclusive_owner = None;
            port.exclusive_updated_at = None;
        }
    }
    was_merging && !port.is_merging()
}

/// Merges `data` from `(host, physical)` into the port per its configured
/// mode, recomputes `last_output`, and returns the new composed frame.
pub fn merge_source(
    port: &mut DmxPortState,
    source_key: (Ipv4Addr, u8),
    data: Bytes,
    length: u16,
    now: Timestamp,
) -> (Bytes, u16) {
    port.sources.insert(source_key, DmxSource { data, length, last_updated: now });
    port.exclusive_owner = Some(source_key);
    port.exclusive_updated_at = Some(now);
    let (composed, length) = match port.merge_mode {
        MergeMode::Htp => htp_compose(port),
        MergeMode::Ltp => {
            let src = &port.sources[&source_key];
            (src.data.clone(), src.length)
        }
    };
    port.last_output = Some(LastOutput { data: composed.clone(), length, updated_at: now });
    (composed, length)
}

/// Highest-Takes-Precedence: `out[i] = max(sources[*][i])` (spec.md §8 invariant 8).
fn htp_compose(port: &DmxPortState) -> (Bytes, u16) {
    let max_len = port.sources.values().map(|s| s.length).max().unwrap_or(0);
    let mut out = BytesMut::zeroed(max_len as usize);
    for src in port.sources.values() {
        for i in 0..src.length as usize {
            let v = src.data.get(i).copied().unwrap_or(0);
            if v > out[i] {
                out[i] = v;
            }
        }
    }
    (out.freeze(), max_len)
}
