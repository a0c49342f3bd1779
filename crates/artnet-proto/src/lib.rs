//! Pure Art-Net 4 protocol state machine: `step(state, event) -> (state', effects)`.
//!
//! No I/O, no clocks, no logging — see [`step::step`]. The shell crates
//! (`artnet-transport`, `artnet-node`) own everything that touches a socket,
//! a timer, or a tracing subscriber.

pub mod config;
pub mod effect;
pub mod error;
pub mod event;
pub mod merge;
pub mod state;
pub mod step;

pub use config::NodeConfig;
pub use effect::Effect;
pub use error::CommandError;
pub use event::{Command, Event};
pub use state::NodeState;
pub use step::step;

/// Builds the node's initial state from configuration (spec.md §3 "Lifecycle").
pub fn initial_state(config: NodeConfig) -> NodeState {
    state::initial_state(config)
}
