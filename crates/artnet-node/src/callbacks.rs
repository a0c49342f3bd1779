//! User-registered callback dispatch (spec.md §6 "callbacks" config
//! section, §4.3 "Sender": "On callback, dispatch the user function on an
//! I/O thread, catching and logging throwables").

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

use artnet_proto::effect::{CallbackEffect, CallbackKey};
use tracing::error;

pub type CallbackFn = Box<dyn Fn(CallbackEffect) + Send + Sync>;

/// Registered per-opcode callbacks plus a catch-all `default`.
#[derive(Default)]
pub struct Callbacks {
    by_key: HashMap<CallbackKey, CallbackFn>,
    default: Option<CallbackFn>,
}

impl Callbacks {
    pub fn register(&mut self, key: CallbackKey, f: CallbackFn) {
        self.by_key.insert(key, f);
    }

    pub fn set_default(&mut self, f: CallbackFn) {
        self.default = Some(f);
    }

    /// Runs the matching callback, falling back to `default`. Panics are
    /// caught and logged, never propagated.
    pub async fn dispatch(&self, effect: CallbackEffect) {
        let key = effect.key;
        let handler = self.by_key.get(&key).or(self.default.as_ref());
        let Some(handler) = handler else { return };
        if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(|| handler(effect))) {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            error!(?key, message, "callback panicked");
        }
    }
}
