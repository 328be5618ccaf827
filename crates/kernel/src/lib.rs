//! Village kernel: parameter tables, the layout engine that turns them into
//! a scene list, and the frame driver that draws it.
//!
//! # Invariants
//! - The scene is built once; only the camera and the windmill angle change
//!   between frames.
//! - Construction errors (unknown roof kind, zero-length road, empty house)
//!   surface from [`MiniVillage::initialize`], never from a frame.
//! - Per-frame draw order is axes, ground, houses, roads, doors, fence posts,
//!   fence planks, windmill.

pub mod config;
pub mod frame;
pub mod layout;
pub mod scene;

pub use config::{
    CameraConfig, ConfigError, FenceConfig, GroundConfig, HouseSpec, RoadSpec, VillageConfig,
};
pub use frame::{FixedRateClock, FpsCounter, FrameStats, FrameTimer, MiniVillage, VillageError};
pub use layout::{
    CUBE_SIZE, LayoutError, MAX_GRID_SIZE, RoofKind, build_fence_ring, build_house, build_road,
    build_village,
};
pub use scene::{Scene, SceneEntry};

pub fn crate_info() -> &'static str {
    "minivillage-kernel v0.1.0"
}
