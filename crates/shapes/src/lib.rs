//! Shapes: procedural meshes and the one draw path they all share.
//!
//! # Invariants
//! - A mesh holds exactly 4 color floats for every 3 position floats.
//! - Vertex data is local space; placement comes only from the model
//!   transform passed to [`Shape::draw`].
//! - Drawing a shape whose buffers were never uploaded issues no calls.

mod error;
mod mesh;
mod primitives;
mod road;
mod shape;
mod windmill;

pub use error::ShapeError;
pub use mesh::{DrawRange, Mesh};
pub use primitives::{FENCE_BROWN, GRID_GREEN, ShapeKind};
pub use road::{ROAD_Y, road_vertices};
pub use shape::Shape;
pub use windmill::{Windmill, WindmillParams};

pub fn crate_info() -> &'static str {
    "minivillage-shapes v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("shapes"));
    }
}
