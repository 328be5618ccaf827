//! Shared value types: colors, world positions, ground-plane points.
//!
//! # Invariants
//! - Every type here is `Copy`; shapes own their own copy of a color and
//!   nothing is shared by reference between scene entries.

mod types;

pub use types::{Color, Position, XzPoint};

pub fn crate_info() -> &'static str {
    "minivillage-common v0.1.0"
}
