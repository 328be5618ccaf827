//! Keyboard input: a bounded set of recognized keys and the held-key state.
//!
//! # Invariants
//! - Hosts translate platform key codes into [`Key`] and ignore everything else.
//! - State is queried once per frame, never event-streamed into the core.

pub mod action;

pub use action::{InputState, Key};

pub fn crate_info() -> &'static str {
    "minivillage-input v0.1.0"
}
