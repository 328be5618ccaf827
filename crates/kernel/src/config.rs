//! Village parameter tables.
//!
//! [`VillageConfig::default`] is the fixed village: four houses, five roads,
//! four fence rings and one windmill. Any table can be overridden from JSON.

use crate::layout::RoofKind;
use glam::Vec3;
use minivillage_common::{Color, Position, XzPoint};
use minivillage_shapes::WindmillParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

const BABY_PINK: Color = Color::rgb(0.98, 0.78, 0.82);
const PASTEL_GREEN: Color = Color::rgb(0.68, 0.85, 0.44);
const PASTEL_YELLOW: Color = Color::rgb(0.96, 0.98, 0.60);
const LIGHT_BLUE: Color = Color::rgb(0.68, 0.85, 0.90);
const BURGUNDY: Color = Color::rgb(0.5, 0.0, 0.0);
const PASTEL_ORANGE: Color = Color::rgb(1.0, 0.7, 0.5);
const BROWN: Color = Color::rgb(0.6, 0.4, 0.2);
const PINK: Color = Color::rgb(1.0, 0.75, 0.8);
const ASPHALT: Color = Color::rgb(0.3, 0.3, 0.3);

/// Errors loading or writing a village config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Camera start state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConfig {
    pub position: Position,
    pub look_at: Position,
    pub up: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(-90.0, 30.0, 90.0),
            look_at: Vec3::ZERO,
            up: Vec3::Y,
            near: 0.1,
            far: 10_000.0,
        }
    }
}

/// Wireframe ground grid, drawn `offset_y` below the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroundConfig {
    pub width: f32,
    pub height: f32,
    pub grid_size: u32,
    pub offset_y: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 200.0,
            grid_size: 100,
            offset_y: -3.0,
        }
    }
}

/// One house: stacked cube columns, absolute window/door positions, a roof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseSpec {
    pub base_color: Color,
    pub roof_color: Color,
    pub position: Position,
    pub column_heights: Vec<u32>,
    #[serde(default)]
    pub windows: Vec<Position>,
    #[serde(default)]
    pub doors: Vec<Position>,
    pub roof: RoofKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoadSpec {
    pub start: XzPoint,
    pub end: XzPoint,
    pub width: f32,
    pub color: Color,
}

/// Fence rings: one ring of `post_count` posts around each center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FenceConfig {
    pub centers: Vec<XzPoint>,
    /// Ring radius.
    pub spacing: f32,
    pub post_count: u32,
    pub post_y: f32,
}

impl Default for FenceConfig {
    fn default() -> Self {
        Self {
            centers: vec![
                XzPoint::new(-7.0, 3.5),
                XzPoint::new(33.0, -50.0),
                XzPoint::new(-28.0, -70.0),
                XzPoint::new(47.0, 13.0),
            ],
            spacing: 10.0,
            post_count: 20,
            post_y: -1.0,
        }
    }
}

/// Everything needed to build and frame the village.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VillageConfig {
    pub clear_color: Color,
    pub draw_axes: bool,
    pub axes_bound: f32,
    pub camera: CameraConfig,
    pub ground: GroundConfig,
    pub houses: Vec<HouseSpec>,
    pub roads: Vec<RoadSpec>,
    pub fences: FenceConfig,
    pub windmill: WindmillParams,
}

impl Default for VillageConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::rgb(0.9, 0.9, 0.9),
            draw_axes: true,
            axes_bound: 1000.0,
            camera: CameraConfig::default(),
            ground: GroundConfig::default(),
            houses: default_houses(),
            roads: default_roads(),
            fences: FenceConfig::default(),
            windmill: WindmillParams::default(),
        }
    }
}

impl VillageConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        tracing::info!(
            path = %path.display(),
            houses = config.houses.len(),
            "village config loaded"
        );
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

fn default_houses() -> Vec<HouseSpec> {
    vec![
        HouseSpec {
            base_color: PASTEL_YELLOW,
            roof_color: BURGUNDY,
            position: Vec3::new(-10.0, 0.0, 3.0),
            column_heights: vec![3, 2, 2],
            windows: vec![Vec3::new(-10.0, 5.0, 6.0), Vec3::new(-4.0, 2.0, 6.0)],
            doors: vec![Vec3::new(-10.0, -1.2, 6.5)],
            roof: RoofKind::Flat,
        },
        HouseSpec {
            base_color: PASTEL_GREEN,
            roof_color: PINK,
            position: Vec3::new(30.0, 0.0, -50.0),
            column_heights: vec![1, 1, 2],
            windows: vec![Vec3::new(30.0, 0.5, -47.0)],
            doors: vec![Vec3::new(36.0, -1.2, -47.0)],
            roof: RoofKind::Conical,
        },
        HouseSpec {
            base_color: BABY_PINK,
            roof_color: BROWN,
            position: Vec3::new(-30.0, 0.0, -70.0),
            column_heights: vec![1, 1],
            windows: vec![Vec3::new(-26.0, 0.5, -67.0), Vec3::new(-31.0, 0.5, -67.0)],
            doors: vec![Vec3::new(-28.5, -1.2, -67.0)],
            roof: RoofKind::TriangularPrism,
        },
        HouseSpec {
            base_color: LIGHT_BLUE,
            roof_color: PASTEL_ORANGE,
            position: Vec3::new(46.0, 0.0, 13.0),
            column_heights: vec![2],
            windows: vec![Vec3::new(44.5, 3.0, 16.0), Vec3::new(47.5, 3.0, 16.0)],
            doors: vec![Vec3::new(46.0, -1.2, 16.0)],
            roof: RoofKind::TriangularPrism,
        },
    ]
}

fn default_roads() -> Vec<RoadSpec> {
    let road = |start: [f32; 2], end: [f32; 2], width: f32| RoadSpec {
        start: XzPoint::from_array(start),
        end: XzPoint::from_array(end),
        width,
        color: ASPHALT,
    };
    vec![
        road([54.0, -35.0], [-147.0, -35.0], 5.0),
        road([0.0, 0.0], [0.0, -35.0], 3.0),
        road([-50.0, -10.0], [-50.0, -35.0], 3.0),
        road([-76.0, -82.0], [-66.0, -35.0], 3.0),
        road([-10.0, -63.0], [-10.0, -35.0], 3.0),
    ]
}
