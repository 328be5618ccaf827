use crate::config::{FenceConfig, HouseSpec, RoadSpec, VillageConfig};
use crate::scene::{Scene, SceneEntry};
use glam::Vec3;
use minivillage_common::{Color, Position, XzPoint};
use minivillage_shapes::{FENCE_BROWN, ShapeError, ShapeKind, Windmill};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Edge length between stacked cubes; cubes are generated with this half-extent.
pub const CUBE_SIZE: f32 = 3.0;

const WINDOW_COLOR: Color = Color::new(0.83, 0.83, 0.83, 0.8);
const WINDOW_SIZE: f32 = 0.7;
const WINDOW_DEPTH: f32 = 0.1;
const DOOR_COLOR: Color = Color::rgb(0.6, 0.3, 0.1);
const DOOR_WIDTH: f32 = 1.0;
const DOOR_HEIGHT: f32 = 1.7;
const DOOR_DEPTH: f32 = 0.1;
const PRISM_ROOF_SIZE: f32 = 9.0;
const CONE_ROOF_SIZE: f32 = 5.0;
const CONE_ROOF_SEGMENTS: u32 = 36;
const FLAT_ROOF_LIFT: f32 = 0.2;
const PLANK_WIDTH: f32 = 0.2;
const PLANK_HEIGHT: f32 = 1.0;
/// Largest ground grid accepted; the grid costs `8 * n * n` line vertices.
pub const MAX_GRID_SIZE: u32 = 1000;

/// Failures while placing the village.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("unknown roof kind {0:?} (expected flat, conical or triangularPrism)")]
    UnknownRoofKind(String),
    #[error("house at {0:?} has no columns")]
    EmptyHouse(Position),
    #[error("fence ring needs at least one post, got {post_count}")]
    InvalidFence { post_count: u32 },
    #[error("ground grid size {grid_size} exceeds the limit of {max}")]
    GridTooLarge { grid_size: u32, max: u32 },
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Roof placed on top of a house.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RoofKind {
    Flat,
    Conical,
    TriangularPrism,
}

impl RoofKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RoofKind::Flat => "flat",
            RoofKind::Conical => "conical",
            RoofKind::TriangularPrism => "triangularPrism",
        }
    }
}

impl fmt::Display for RoofKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoofKind {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(RoofKind::Flat),
            "conical" => Ok(RoofKind::Conical),
            "triangularPrism" => Ok(RoofKind::TriangularPrism),
            other => Err(LayoutError::UnknownRoofKind(other.to_string())),
        }
    }
}

impl TryFrom<String> for RoofKind {
    type Error = LayoutError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RoofKind> for String {
    fn from(kind: RoofKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Roof shape and its world position for a house of `columns` columns whose
/// tallest column is `max_height` world units.
fn roof_entry(
    kind: RoofKind,
    color: Color,
    base: Position,
    columns: usize,
    max_height: f32,
) -> (ShapeKind, Position) {
    let n = columns as f32;
    let top = base.y + max_height;
    match kind {
        RoofKind::TriangularPrism => (
            ShapeKind::TriangularPrismRoof {
                size: PRISM_ROOF_SIZE,
                color,
            },
            Vec3::new(base.x + (n - 1.0) * CUBE_SIZE / 2.0, top, base.z),
        ),
        RoofKind::Conical => (
            ShapeKind::ConicalRoof {
                size: CONE_ROOF_SIZE,
                segments: CONE_ROOF_SEGMENTS,
                color,
            },
            Vec3::new(base.x + (n + 1.0) * CUBE_SIZE / 2.0, top, base.z),
        ),
        RoofKind::Flat => (
            ShapeKind::FlatRoof {
                size: n * CUBE_SIZE,
                color,
            },
            Vec3::new(
                base.x + (n - 3.0) * CUBE_SIZE / 2.0,
                top + FLAT_ROOF_LIFT,
                base.z,
            ),
        ),
    }
}

/// Stack cube columns, then add windows, doors and one roof.
///
/// Column `i` sits at `x + i * CUBE_SIZE` and is `column_heights[i]` cubes
/// tall. Window and door positions are absolute.
pub fn build_house(house: &HouseSpec) -> Result<Vec<SceneEntry>, LayoutError> {
    let max_cubes = house
        .column_heights
        .iter()
        .copied()
        .max()
        .ok_or(LayoutError::EmptyHouse(house.position))?;
    let base = house.position;

    let mut entries = Vec::new();
    for (i, &height) in house.column_heights.iter().enumerate() {
        for j in 0..height {
            let position = base + Vec3::new(i as f32 * CUBE_SIZE, j as f32 * CUBE_SIZE, 0.0);
            entries.push(SceneEntry::new(
                ShapeKind::Cube {
                    size: CUBE_SIZE,
                    color: house.base_color,
                },
                position,
            )?);
        }
    }
    for &position in &house.windows {
        entries.push(SceneEntry::new(
            ShapeKind::Window {
                width: WINDOW_SIZE,
                height: WINDOW_SIZE,
                depth: WINDOW_DEPTH,
                color: WINDOW_COLOR,
            },
            position,
        )?);
    }
    for &position in &house.doors {
        entries.push(SceneEntry::new(
            ShapeKind::Door {
                width: DOOR_WIDTH,
                height: DOOR_HEIGHT,
                depth: DOOR_DEPTH,
                color: DOOR_COLOR,
            },
            position,
        )?);
    }

    let max_height = max_cubes as f32 * CUBE_SIZE;
    let (roof, roof_position) = roof_entry(
        house.roof,
        house.roof_color,
        base,
        house.column_heights.len(),
        max_height,
    );
    entries.push(SceneEntry::new(roof, roof_position)?);
    Ok(entries)
}

/// Posts and planks of one open fence ring around `center`.
///
/// Post `i` sits at angle `i / post_count * 2π` on a circle of radius
/// `spacing`. Each post after the first is joined to its predecessor by a
/// plank at their midpoint, yawed by `atan2(dz, dx)`; no plank closes the ring.
pub fn build_fence_ring(
    center: XzPoint,
    fence: &FenceConfig,
) -> Result<(Vec<SceneEntry>, Vec<SceneEntry>), LayoutError> {
    if fence.post_count == 0 {
        return Err(LayoutError::InvalidFence {
            post_count: fence.post_count,
        });
    }
    let count = fence.post_count as usize;
    let mut posts = Vec::with_capacity(count);
    let mut planks = Vec::with_capacity(count - 1);

    let mut previous: Option<Position> = None;
    for i in 0..fence.post_count {
        let angle = i as f32 / fence.post_count as f32 * TAU;
        let position = Vec3::new(
            center.x + angle.cos() * fence.spacing,
            fence.post_y,
            center.y + angle.sin() * fence.spacing,
        );
        posts.push(SceneEntry::new(ShapeKind::fence_post(), position)?);

        if let Some(prev) = previous {
            let delta = position - prev;
            let plank = ShapeKind::FencePlank {
                width: PLANK_WIDTH,
                height: PLANK_HEIGHT,
                depth: delta.length(),
                color: FENCE_BROWN,
            };
            let yaw = delta.z.atan2(delta.x);
            planks.push(SceneEntry::new(plank, (position + prev) / 2.0)?.with_yaw(yaw));
        }
        previous = Some(position);
    }
    Ok((posts, planks))
}

pub fn build_road(road: &RoadSpec) -> Result<SceneEntry, LayoutError> {
    let kind = ShapeKind::Road {
        start: road.start,
        end: road.end,
        width: road.width,
        color: road.color,
    };
    // Road vertices are already in world space.
    Ok(SceneEntry::new(kind, Vec3::ZERO)?)
}

/// Place every house, road, fence ring and the windmill described by `config`.
pub fn build_village(config: &VillageConfig) -> Result<Scene, LayoutError> {
    let _span = tracing::info_span!("build_village").entered();
    if config.ground.grid_size > MAX_GRID_SIZE {
        return Err(LayoutError::GridTooLarge {
            grid_size: config.ground.grid_size,
            max: MAX_GRID_SIZE,
        });
    }

    let axes = if config.draw_axes {
        Some(SceneEntry::new(
            ShapeKind::Coord {
                bound: config.axes_bound,
            },
            Vec3::ZERO,
        )?)
    } else {
        None
    };
    let ground = SceneEntry::new(
        ShapeKind::ground_grid(
            config.ground.width,
            config.ground.height,
            config.ground.grid_size,
        ),
        Vec3::new(0.0, config.ground.offset_y, 0.0),
    )?;

    let mut houses = Vec::new();
    for house in &config.houses {
        houses.extend(build_house(house)?);
    }
    let roads = config
        .roads
        .iter()
        .map(build_road)
        .collect::<Result<Vec<_>, _>>()?;

    let mut fence_posts = Vec::new();
    let mut fence_planks = Vec::new();
    for &center in &config.fences.centers {
        let (posts, planks) = build_fence_ring(center, &config.fences)?;
        fence_posts.extend(posts);
        fence_planks.extend(planks);
    }

    let windmill = Windmill::new(config.windmill)?;

    let scene = Scene {
        axes,
        ground,
        houses,
        roads,
        fence_posts,
        fence_planks,
        windmill,
    };
    tracing::info!(
        houses = config.houses.len(),
        roads = scene.roads.len(),
        fence_posts = scene.fence_posts.len(),
        fence_planks = scene.fence_planks.len(),
        entries = scene.entry_count(),
        "village built"
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn house(heights: Vec<u32>, roof: RoofKind) -> HouseSpec {
        HouseSpec {
            base_color: Color::rgb(0.96, 0.98, 0.60),
            roof_color: Color::rgb(0.5, 0.0, 0.0),
            position: Vec3::new(-10.0, 0.0, 3.0),
            column_heights: heights,
            windows: vec![Vec3::new(-10.0, 5.0, 6.0), Vec3::new(-4.0, 2.0, 6.0)],
            doors: vec![Vec3::new(-10.0, -1.2, 6.5)],
            roof,
        }
    }

    fn roof_of(entries: &[SceneEntry]) -> &SceneEntry {
        entries.last().unwrap()
    }

    #[test]
    fn house_counts_cubes_windows_doors_and_one_roof() {
        let entries = build_house(&house(vec![3, 2, 2], RoofKind::Flat)).unwrap();
        let cubes = entries
            .iter()
            .filter(|e| matches!(e.shape.kind(), ShapeKind::Cube { .. }))
            .count();
        let roofs = entries.iter().filter(|e| e.shape.kind().is_roof()).count();
        assert_eq!(cubes, 7);
        assert_eq!(roofs, 1);
        assert_eq!(entries.len(), 7 + 2 + 1 + 1);
        assert!(roof_of(&entries).shape.kind().is_roof());
    }

    #[test]
    fn cubes_stack_in_columns() {
        let entries = build_house(&house(vec![3, 2, 2], RoofKind::Flat)).unwrap();
        let positions: Vec<Position> = entries.iter().take(7).map(|e| e.position).collect();
        assert_eq!(positions[0], Vec3::new(-10.0, 0.0, 3.0));
        assert_eq!(positions[2], Vec3::new(-10.0, 6.0, 3.0));
        assert_eq!(positions[3], Vec3::new(-7.0, 0.0, 3.0));
        assert_eq!(positions[6], Vec3::new(-4.0, 3.0, 3.0));
    }

    #[test]
    fn flat_roof_centering() {
        let entries = build_house(&house(vec![3, 2, 2], RoofKind::Flat)).unwrap();
        let roof = roof_of(&entries);
        assert_eq!(roof.position, Vec3::new(-10.0, 9.2, 3.0));
        assert!(matches!(roof.shape.kind(), ShapeKind::FlatRoof { size, .. } if *size == 9.0));
    }

    #[test]
    fn conical_roof_centering() {
        let mut spec = house(vec![1, 1, 2], RoofKind::Conical);
        spec.position = Vec3::new(30.0, 0.0, -50.0);
        let entries = build_house(&spec).unwrap();
        assert_eq!(roof_of(&entries).position, Vec3::new(36.0, 6.0, -50.0));
    }

    #[test]
    fn prism_roof_centering() {
        let mut spec = house(vec![1, 1], RoofKind::TriangularPrism);
        spec.position = Vec3::new(-30.0, 0.0, -70.0);
        let entries = build_house(&spec).unwrap();
        assert_eq!(roof_of(&entries).position, Vec3::new(-28.5, 3.0, -70.0));
    }

    #[test]
    fn empty_house_is_rejected() {
        let err = build_house(&house(vec![], RoofKind::Flat)).unwrap_err();
        assert!(matches!(err, LayoutError::EmptyHouse(_)));
    }

    #[test]
    fn roof_kind_parses_and_rejects_unknown() {
        assert_eq!("conical".parse::<RoofKind>().unwrap(), RoofKind::Conical);
        assert_eq!(
            "triangularPrism".parse::<RoofKind>().unwrap(),
            RoofKind::TriangularPrism
        );
        let err = "dome".parse::<RoofKind>().unwrap_err();
        assert!(err.to_string().contains("dome"));
        assert_eq!(RoofKind::Flat.to_string(), "flat");
    }

    #[test]
    fn fence_ring_is_open() {
        let fence = FenceConfig::default();
        let (posts, planks) = build_fence_ring(XzPoint::new(-7.0, 3.5), &fence).unwrap();
        assert_eq!(posts.len(), 20);
        assert_eq!(planks.len(), 19);

        for (i, plank) in planks.iter().enumerate() {
            let a = posts[i].position;
            let b = posts[i + 1].position;
            let mid = (a + b) / 2.0;
            assert!((plank.position - mid).length() < 1e-4);
            let d = b - a;
            assert!((plank.yaw - d.z.atan2(d.x)).abs() < 1e-5);
            assert!(matches!(
                plank.shape.kind(),
                ShapeKind::FencePlank { depth, .. } if (depth - d.length()).abs() < 1e-4
            ));
        }
    }

    #[test]
    fn fence_posts_lie_on_the_circle() {
        let fence = FenceConfig::default();
        let center = XzPoint::new(33.0, -50.0);
        let (posts, _) = build_fence_ring(center, &fence).unwrap();
        for post in &posts {
            let offset = XzPoint::new(post.position.x, post.position.z) - center;
            assert!((offset.length() - fence.spacing).abs() < 1e-4);
            assert_eq!(post.position.y, -1.0);
        }
        assert!((posts[0].position.x - 43.0).abs() < 1e-4);
    }

    #[test]
    fn fence_without_posts_is_rejected() {
        let fence = FenceConfig {
            post_count: 0,
            ..FenceConfig::default()
        };
        assert!(matches!(
            build_fence_ring(XzPoint::ZERO, &fence),
            Err(LayoutError::InvalidFence { post_count: 0 })
        ));
    }

    #[test]
    fn zero_length_road_fails_at_build_time() {
        let road = RoadSpec {
            start: XzPoint::new(1.0, 1.0),
            end: XzPoint::new(1.0, 1.0),
            width: 3.0,
            color: Color::rgb(0.3, 0.3, 0.3),
        };
        assert!(matches!(
            build_road(&road),
            Err(LayoutError::Shape(ShapeError::ZeroLengthRoad { .. }))
        ));
    }

    #[test]
    fn default_village_entry_count_is_sum_of_builders() {
        let config = VillageConfig::default();
        let scene = build_village(&config).unwrap();

        let houses: usize = config
            .houses
            .iter()
            .map(|h| build_house(h).unwrap().len())
            .sum();
        let fences: usize = config
            .fences
            .centers
            .iter()
            .map(|&c| {
                let (p, k) = build_fence_ring(c, &config.fences).unwrap();
                p.len() + k.len()
            })
            .sum();
        assert_eq!(houses, 30);
        assert_eq!(fences, 4 * 39);
        assert_eq!(scene.entry_count(), houses + config.roads.len() + fences + 1);
        assert_eq!(scene.entry_count(), 192);
    }

    #[test]
    fn oversized_ground_grid_fails_before_allocating() {
        let mut config = VillageConfig::default();
        config.ground.grid_size = u32::MAX;
        assert!(matches!(
            build_village(&config),
            Err(LayoutError::GridTooLarge { grid_size: u32::MAX, max: MAX_GRID_SIZE })
        ));

        config.ground.grid_size = 1;
        assert!(build_village(&config).is_ok());
    }

    #[test]
    fn entries_own_their_colors() {
        let mut config = VillageConfig::default();
        let scene = build_village(&config).unwrap();
        config.houses[0].base_color.red = 0.0;
        let first = scene.houses[0].shape.kind().color().unwrap();
        assert_eq!(first.red, 0.96);
    }
}
