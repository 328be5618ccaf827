//! Rendering adapter: the immediate-mode draw interface the scene talks to.
//!
//! # Invariants
//! - Shapes only ever see [`GraphicsContext`]; the backend is swappable.
//! - View/projection matrices are derived from [`Camera`] state each frame
//!   and never cached by shapes across frames.
//!
//! [`RecordingContext`] implements the interface without a GPU and keeps an
//! ordered log of every call, which is what the tests and the headless CLI
//! drive.

mod camera;
mod renderer;

pub use camera::{Camera, CameraMatrices};
pub use renderer::{
    AttributeLocation, BufferHandle, DrawCall, GraphicsCommand, GraphicsContext, PrimitiveKind,
    ProgramHandle, RecordingContext, ShaderInfo, UniformLocation,
};

pub fn crate_info() -> &'static str {
    "minivillage-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
