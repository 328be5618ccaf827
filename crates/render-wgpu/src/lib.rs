//! wgpu backend for the immediate-mode draw interface.
//!
//! [`WgpuContext`] implements [`minivillage_render::GraphicsContext`] on a
//! window surface with a single vertex-color pipeline per topology.
//!
//! # Invariants
//! - Draws are replayed in exactly the order they were issued.
//! - Each draw captures the model-view and projection matrices current at
//!   issue time; later uniform writes never affect earlier draws.
//! - Triangle fans are expanded to indexed triangle lists; other topologies
//!   map one to one.

mod gpu;
mod shaders;

pub use gpu::{ContextError, WgpuContext};

pub fn crate_info() -> &'static str {
    "minivillage-render-wgpu v0.1.0"
}
