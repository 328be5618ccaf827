use crate::error::ShapeError;
use crate::mesh::Mesh;
use crate::road::road_vertices;
use glam::Vec3;
use minivillage_common::{Color, XzPoint};
use minivillage_render::PrimitiveKind;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

pub const FENCE_BROWN: Color = Color::rgb(0.6, 0.3, 0.1);
pub const GRID_GREEN: Color = Color::rgb(0.3, 0.5, 0.2);

/// Every shape the village is built from, with its generation parameters.
///
/// Box-like kinds (`Door`, `Window`, `FencePlank`) take half-extents, so a
/// door of `width: 1.0` spans two units. `Cube::size` is a half-extent too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ShapeKind {
    Cube {
        size: f32,
        color: Color,
    },
    Cylinder {
        height: f32,
        radius: f32,
        segments: u32,
        color: Color,
    },
    FlatRoof {
        size: f32,
        color: Color,
    },
    ConicalRoof {
        size: f32,
        segments: u32,
        color: Color,
    },
    TriangularPrismRoof {
        size: f32,
        color: Color,
    },
    Door {
        width: f32,
        height: f32,
        depth: f32,
        color: Color,
    },
    Window {
        width: f32,
        height: f32,
        depth: f32,
        color: Color,
    },
    FencePost {
        height: f32,
        radius: f32,
        segments: u32,
        color: Color,
    },
    FencePlank {
        width: f32,
        height: f32,
        depth: f32,
        color: Color,
    },
    Rectangle {
        width: f32,
        height: f32,
        color: Color,
    },
    XzPlane {
        width: f32,
        height: f32,
        grid_size: u32,
        color: Color,
    },
    Coord {
        bound: f32,
    },
    Road {
        start: XzPoint,
        end: XzPoint,
        width: f32,
        color: Color,
    },
}

impl ShapeKind {
    /// Brown fence post: 3 tall, radius 0.3, 32 segments.
    pub fn fence_post() -> Self {
        ShapeKind::FencePost {
            height: 3.0,
            radius: 0.3,
            segments: 32,
            color: FENCE_BROWN,
        }
    }

    /// Green wireframe ground grid.
    pub fn ground_grid(width: f32, height: f32, grid_size: u32) -> Self {
        ShapeKind::XzPlane {
            width,
            height,
            grid_size,
            color: GRID_GREEN,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Cube { .. } => "cube",
            ShapeKind::Cylinder { .. } => "cylinder",
            ShapeKind::FlatRoof { .. } => "flatRoof",
            ShapeKind::ConicalRoof { .. } => "conicalRoof",
            ShapeKind::TriangularPrismRoof { .. } => "triangularPrismRoof",
            ShapeKind::Door { .. } => "door",
            ShapeKind::Window { .. } => "window",
            ShapeKind::FencePost { .. } => "fencePost",
            ShapeKind::FencePlank { .. } => "fencePlank",
            ShapeKind::Rectangle { .. } => "rectangle",
            ShapeKind::XzPlane { .. } => "xzPlane",
            ShapeKind::Coord { .. } => "coord",
            ShapeKind::Road { .. } => "road",
        }
    }

    pub fn is_door(&self) -> bool {
        matches!(self, ShapeKind::Door { .. })
    }

    pub fn is_roof(&self) -> bool {
        matches!(
            self,
            ShapeKind::FlatRoof { .. }
                | ShapeKind::ConicalRoof { .. }
                | ShapeKind::TriangularPrismRoof { .. }
        )
    }

    /// Uniform color of the shape, `None` for the multi-colored axes.
    pub fn color(&self) -> Option<Color> {
        match self {
            ShapeKind::Cube { color, .. }
            | ShapeKind::Cylinder { color, .. }
            | ShapeKind::FlatRoof { color, .. }
            | ShapeKind::ConicalRoof { color, .. }
            | ShapeKind::TriangularPrismRoof { color, .. }
            | ShapeKind::Door { color, .. }
            | ShapeKind::Window { color, .. }
            | ShapeKind::FencePost { color, .. }
            | ShapeKind::FencePlank { color, .. }
            | ShapeKind::Rectangle { color, .. }
            | ShapeKind::XzPlane { color, .. }
            | ShapeKind::Road { color, .. } => Some(*color),
            ShapeKind::Coord { .. } => None,
        }
    }

    /// Generate the local-space mesh for this kind.
    pub fn generate_mesh(&self) -> Result<Mesh, ShapeError> {
        let mesh = match *self {
            ShapeKind::Cube { size, color } => box_mesh(Vec3::splat(size), color),
            ShapeKind::Door {
                width,
                height,
                depth,
                color,
            }
            | ShapeKind::Window {
                width,
                height,
                depth,
                color,
            }
            | ShapeKind::FencePlank {
                width,
                height,
                depth,
                color,
            } => box_mesh(Vec3::new(width, height, depth), color),
            ShapeKind::Cylinder {
                height,
                radius,
                segments,
                color,
            } => cylinder_mesh("cylinder", height, radius, segments, color)?,
            ShapeKind::FencePost {
                height,
                radius,
                segments,
                color,
            } => cylinder_mesh("fence post", height, radius, segments, color)?,
            ShapeKind::FlatRoof { size, color } => flat_roof_mesh(size, color),
            ShapeKind::ConicalRoof {
                size,
                segments,
                color,
            } => conical_roof_mesh(size, segments, color)?,
            ShapeKind::TriangularPrismRoof { size, color } => prism_roof_mesh(size, color),
            ShapeKind::Rectangle {
                width,
                height,
                color,
            } => rectangle_mesh(width, height, color),
            ShapeKind::XzPlane {
                width,
                height,
                grid_size,
                color,
            } => xz_plane_mesh(width, height, grid_size, color),
            ShapeKind::Coord { bound } => coord_mesh(bound),
            ShapeKind::Road {
                start,
                end,
                width,
                color,
            } => {
                let mut mesh = Mesh::with_capacity(4);
                mesh.push(
                    PrimitiveKind::TriangleStrip,
                    road_vertices(start, end, width)?,
                    color,
                );
                mesh
            }
        };
        Ok(mesh)
    }
}

/// 36-vertex box with half-extents `e`: front, back, top, bottom, right, left.
fn box_mesh(e: Vec3, color: Color) -> Mesh {
    let (w, h, d) = (e.x, e.y, e.z);
    #[rustfmt::skip]
    let corners = [
        // front
        [-w,  h,  d], [-w, -h,  d], [ w, -h,  d], [ w, -h,  d], [ w,  h,  d], [-w,  h,  d],
        // back
        [-w,  h, -d], [-w, -h, -d], [ w, -h, -d], [ w, -h, -d], [ w,  h, -d], [-w,  h, -d],
        // top
        [-w,  h, -d], [-w,  h,  d], [ w,  h,  d], [ w,  h,  d], [ w,  h, -d], [-w,  h, -d],
        // bottom
        [-w, -h, -d], [-w, -h,  d], [ w, -h,  d], [ w, -h,  d], [ w, -h, -d], [-w, -h, -d],
        // right
        [ w,  h, -d], [ w, -h, -d], [ w, -h,  d], [ w, -h,  d], [ w,  h,  d], [ w,  h, -d],
        // left
        [-w,  h, -d], [-w, -h, -d], [-w, -h,  d], [-w, -h,  d], [-w,  h,  d], [-w,  h, -d],
    ];
    let mut mesh = Mesh::with_capacity(corners.len());
    mesh.push(PrimitiveKind::Triangles, corners.map(Vec3::from_array), color);
    mesh
}

fn ring(radius: f32, segments: u32, y: f32) -> impl Iterator<Item = Vec3> {
    let step = TAU / segments as f32;
    (0..=segments).map(move |i| {
        let a = i as f32 * step;
        Vec3::new(a.cos() * radius, y, a.sin() * radius)
    })
}

/// Side strip of `2(n+1)` vertices, then bottom and top fans of `n+2` each.
fn cylinder_mesh(
    shape: &'static str,
    height: f32,
    radius: f32,
    segments: u32,
    color: Color,
) -> Result<Mesh, ShapeError> {
    if segments == 0 {
        return Err(ShapeError::TooFewSegments { shape, segments });
    }
    let half = height / 2.0;
    let n = segments as usize;
    let mut mesh = Mesh::with_capacity(4 * n + 6);

    let side = ring(radius, segments, -half)
        .zip(ring(radius, segments, half))
        .flat_map(|(bottom, top)| [bottom, top]);
    mesh.push(PrimitiveKind::TriangleStrip, side, color);

    for y in [-half, half] {
        let fan = std::iter::once(Vec3::new(0.0, y, 0.0)).chain(ring(radius, segments, y));
        mesh.push(PrimitiveKind::TriangleFan, fan, color);
    }
    Ok(mesh)
}

fn flat_roof_mesh(size: f32, color: Color) -> Mesh {
    let s = size / 2.0;
    let mut mesh = Mesh::with_capacity(6);
    mesh.push(
        PrimitiveKind::Triangles,
        [
            Vec3::new(-s, 0.0, -s),
            Vec3::new(s, 0.0, -s),
            Vec3::new(s, 0.0, s),
            Vec3::new(-s, 0.0, -s),
            Vec3::new(s, 0.0, s),
            Vec3::new(-s, 0.0, s),
        ],
        color,
    );
    mesh
}

/// Cone of height `size` over a circle of radius `size + 0.5`.
///
/// Each segment emits a base wedge (apex at the origin) and a side wedge
/// (apex at `size`), both as plain triangles.
fn conical_roof_mesh(size: f32, segments: u32, color: Color) -> Result<Mesh, ShapeError> {
    if segments == 0 {
        return Err(ShapeError::TooFewSegments {
            shape: "conical roof",
            segments,
        });
    }
    let radius = size + 0.5;
    let apex = Vec3::new(0.0, size, 0.0);
    let step = TAU / segments as f32;
    let rim = |a: f32| Vec3::new(radius * a.cos(), 0.0, radius * a.sin());

    let mut mesh = Mesh::with_capacity(segments as usize * 6);
    let triangles = (0..segments).flat_map(|i| {
        let p1 = rim(i as f32 * step);
        let p2 = rim((i + 1) as f32 * step);
        [Vec3::ZERO, p1, p2, apex, p1, p2]
    });
    mesh.push(PrimitiveKind::Triangles, triangles, color);
    Ok(mesh)
}

/// Gable roof: two end triangles, two slopes, and a two-triangle floor.
fn prism_roof_mesh(size: f32, color: Color) -> Mesh {
    let s = size / 2.0;
    let apex = Vec3::new(0.0, size - 3.0, 0.0);
    let front_left = Vec3::new(-s, 0.0, s);
    let front_right = Vec3::new(s, 0.0, s);
    let back_left = Vec3::new(-s, 0.0, -s);
    let back_right = Vec3::new(s, 0.0, -s);

    #[rustfmt::skip]
    let triangles = [
        front_left, front_right, apex,
        back_left, back_right, apex,
        front_left, back_left, apex,
        front_right, back_right, apex,
        front_left, front_right, back_left,
        front_right, back_right, back_left,
    ];
    let mut mesh = Mesh::with_capacity(triangles.len());
    mesh.push(PrimitiveKind::Triangles, triangles, color);
    mesh
}

fn rectangle_mesh(width: f32, height: f32, color: Color) -> Mesh {
    let (w, h) = (width / 2.0, height / 2.0);
    let mut mesh = Mesh::with_capacity(4);
    mesh.push(
        PrimitiveKind::TriangleFan,
        [
            Vec3::new(-w, 0.0, -h),
            Vec3::new(w, 0.0, -h),
            Vec3::new(w, 0.0, h),
            Vec3::new(-w, 0.0, h),
        ],
        color,
    );
    mesh
}

/// One closed outline of 4 line segments per cell; cells share no vertices.
fn xz_plane_mesh(width: f32, height: f32, grid_size: u32, color: Color) -> Mesh {
    let mut mesh = Mesh::with_capacity(grid_size as usize * grid_size as usize * 8);
    if grid_size == 0 {
        return mesh;
    }
    let x_step = width / grid_size as f32;
    let z_step = height / grid_size as f32;

    let cells = (0..grid_size).flat_map(|i| (0..grid_size).map(move |j| (i, j)));
    let lines = cells.flat_map(|(i, j)| {
        let x = -width / 2.0 + i as f32 * x_step;
        let z = -height / 2.0 + j as f32 * z_step;
        let a = Vec3::new(x, 0.0, z);
        let b = Vec3::new(x + x_step, 0.0, z);
        let c = Vec3::new(x + x_step, 0.0, z + z_step);
        let d = Vec3::new(x, 0.0, z + z_step);
        [a, b, b, c, c, d, d, a]
    });
    mesh.push(PrimitiveKind::Lines, lines, color);
    mesh
}

fn coord_mesh(bound: f32) -> Mesh {
    let mut mesh = Mesh::with_capacity(6);
    mesh.push_colored(
        PrimitiveKind::Lines,
        [
            (Vec3::new(-bound, 0.0, 0.0), Color::RED),
            (Vec3::new(bound, 0.0, 0.0), Color::RED),
            (Vec3::new(0.0, bound, 0.0), Color::GREEN),
            (Vec3::new(0.0, -bound, 0.0), Color::GREEN),
            (Vec3::new(0.0, 0.0, bound), Color::BLUE),
            (Vec3::new(0.0, 0.0, -bound), Color::BLUE),
        ],
    );
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::DrawRange;

    fn all_kinds() -> Vec<ShapeKind> {
        let c = Color::rgb(0.2, 0.4, 0.6);
        vec![
            ShapeKind::Cube { size: 3.0, color: c },
            ShapeKind::Cylinder {
                height: 5.0,
                radius: 1.0,
                segments: 36,
                color: c,
            },
            ShapeKind::FlatRoof { size: 9.0, color: c },
            ShapeKind::ConicalRoof {
                size: 5.0,
                segments: 36,
                color: c,
            },
            ShapeKind::TriangularPrismRoof { size: 9.0, color: c },
            ShapeKind::Door {
                width: 1.0,
                height: 1.7,
                depth: 0.1,
                color: c,
            },
            ShapeKind::Window {
                width: 0.7,
                height: 0.7,
                depth: 0.1,
                color: c,
            },
            ShapeKind::fence_post(),
            ShapeKind::FencePlank {
                width: 0.2,
                height: 1.0,
                depth: 3.1,
                color: c,
            },
            ShapeKind::Rectangle {
                width: 4.0,
                height: 2.0,
                color: c,
            },
            ShapeKind::ground_grid(20.0, 20.0, 10),
            ShapeKind::Coord { bound: 1000.0 },
            ShapeKind::Road {
                start: XzPoint::new(0.0, 0.0),
                end: XzPoint::new(10.0, 0.0),
                width: 4.0,
                color: c,
            },
        ]
    }

    #[test]
    fn every_kind_keeps_positions_and_colors_in_lockstep() {
        for kind in all_kinds() {
            let mesh = kind.generate_mesh().unwrap();
            assert_eq!(mesh.positions().len() % 3, 0, "{}", kind.name());
            assert_eq!(
                mesh.colors().len(),
                mesh.positions().len() / 3 * 4,
                "{}",
                kind.name()
            );
            let covered: u32 = mesh.ranges().iter().map(|r| r.count).sum();
            assert_eq!(covered, mesh.vertex_count(), "{}", kind.name());
        }
    }

    #[test]
    fn cube_has_36_vertices_on_the_corners() {
        let mesh = ShapeKind::Cube {
            size: 3.0,
            color: Color::RED,
        }
        .generate_mesh()
        .unwrap();
        assert_eq!(mesh.vertex_count(), 36);
        assert!(mesh.positions().iter().all(|&p| p == 3.0 || p == -3.0));
        assert_eq!(
            mesh.ranges(),
            &[DrawRange {
                kind: PrimitiveKind::Triangles,
                first: 0,
                count: 36
            }]
        );
    }

    #[test]
    fn door_uses_independent_half_extents() {
        let mesh = ShapeKind::Door {
            width: 1.0,
            height: 1.7,
            depth: 0.1,
            color: FENCE_BROWN,
        }
        .generate_mesh()
        .unwrap();
        let (lo, hi) = mesh.bounds().unwrap();
        assert_eq!(lo, Vec3::new(-1.0, -1.7, -0.1));
        assert_eq!(hi, Vec3::new(1.0, 1.7, 0.1));
    }

    #[test]
    fn cylinder_ranges_are_strip_then_two_fans() {
        let n = 8;
        let mesh = ShapeKind::Cylinder {
            height: 4.0,
            radius: 1.0,
            segments: n,
            color: Color::WHITE,
        }
        .generate_mesh()
        .unwrap();
        let r = mesh.ranges();
        assert_eq!(r.len(), 3);
        assert_eq!(r[0].kind, PrimitiveKind::TriangleStrip);
        assert_eq!(r[0].count, 2 * (n + 1));
        assert_eq!(r[1].kind, PrimitiveKind::TriangleFan);
        assert_eq!(r[1].count, n + 2);
        assert_eq!(r[2].kind, PrimitiveKind::TriangleFan);
        assert_eq!(r[2].count, n + 2);
        assert_eq!(mesh.vertex_count(), 4 * n + 6);

        // Fan centers sit on the axis at the cap heights.
        assert_eq!(mesh.vertex(r[1].first as usize), Some(Vec3::new(0.0, -2.0, 0.0)));
        assert_eq!(mesh.vertex(r[2].first as usize), Some(Vec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn zero_segments_is_rejected() {
        let err = ShapeKind::Cylinder {
            height: 1.0,
            radius: 1.0,
            segments: 0,
            color: Color::WHITE,
        }
        .generate_mesh()
        .unwrap_err();
        assert!(matches!(err, ShapeError::TooFewSegments { segments: 0, .. }));

        let cone = ShapeKind::ConicalRoof {
            size: 2.0,
            segments: 0,
            color: Color::WHITE,
        };
        assert!(cone.generate_mesh().is_err());
    }

    #[test]
    fn conical_roof_keeps_literal_radius_and_doubled_wedges() {
        let mesh = ShapeKind::ConicalRoof {
            size: 5.0,
            segments: 36,
            color: Color::WHITE,
        }
        .generate_mesh()
        .unwrap();
        assert_eq!(mesh.vertex_count(), 36 * 6);
        let p1 = mesh.vertex(1).unwrap();
        assert!((p1.length() - 5.5).abs() < 1e-5);
        assert_eq!(mesh.vertex(0), Some(Vec3::ZERO));
        assert_eq!(mesh.vertex(3), Some(Vec3::new(0.0, 5.0, 0.0)));
    }

    #[test]
    fn prism_roof_apex_height() {
        let mesh = ShapeKind::TriangularPrismRoof {
            size: 9.0,
            color: Color::WHITE,
        }
        .generate_mesh()
        .unwrap();
        assert_eq!(mesh.vertex_count(), 18);
        let (lo, hi) = mesh.bounds().unwrap();
        assert_eq!(hi.y, 6.0);
        assert_eq!(lo, Vec3::new(-4.5, 0.0, -4.5));
    }

    #[test]
    fn flat_roof_is_one_quad() {
        let mesh = ShapeKind::FlatRoof {
            size: 9.0,
            color: Color::WHITE,
        }
        .generate_mesh()
        .unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert!(mesh.vertices().all(|v| v.y == 0.0 && v.x.abs() == 4.5));
    }

    #[test]
    fn rectangle_is_a_four_vertex_fan() {
        let mesh = ShapeKind::Rectangle {
            width: 4.0,
            height: 2.0,
            color: Color::WHITE,
        }
        .generate_mesh()
        .unwrap();
        assert_eq!(mesh.ranges()[0].kind, PrimitiveKind::TriangleFan);
        assert_eq!(mesh.vertex(2), Some(Vec3::new(2.0, 0.0, 1.0)));
    }

    #[test]
    fn grid_emits_eight_line_vertices_per_cell() {
        let mesh = ShapeKind::ground_grid(200.0, 200.0, 100)
            .generate_mesh()
            .unwrap();
        assert_eq!(mesh.vertex_count(), 100 * 100 * 8);
        assert_eq!(mesh.ranges().len(), 1);
        assert_eq!(mesh.ranges()[0].kind, PrimitiveKind::Lines);
        let (lo, hi) = mesh.bounds().unwrap();
        assert!((lo.x + 100.0).abs() < 1e-3 && (hi.z - 100.0).abs() < 1e-3);
        assert_eq!(&mesh.colors()[..4], &GRID_GREEN.to_array());
    }

    #[test]
    fn coord_axes_are_red_green_blue() {
        let mesh = ShapeKind::Coord { bound: 1000.0 }.generate_mesh().unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(&mesh.colors()[0..4], &[1.0, 0.0, 0.0, 1.0]);
        assert_eq!(&mesh.colors()[8..12], &[0.0, 1.0, 0.0, 1.0]);
        assert_eq!(&mesh.colors()[16..20], &[0.0, 0.0, 1.0, 1.0]);
        assert_eq!(ShapeKind::Coord { bound: 1.0 }.color(), None);
    }

    #[test]
    fn kind_serializes_with_tag() {
        let json = serde_json::to_string(&ShapeKind::fence_post()).unwrap();
        assert!(json.contains("\"shape\":\"fencePost\""));
        let back: ShapeKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ShapeKind::fence_post());
    }

    #[test]
    fn variant_fields_serialize_in_camel_case() {
        let json = serde_json::to_string(&ShapeKind::ground_grid(200.0, 200.0, 100)).unwrap();
        assert!(json.contains("\"shape\":\"xzPlane\""));
        assert!(json.contains("\"gridSize\":100"));
        assert!(!json.contains("grid_size"));
    }
}
