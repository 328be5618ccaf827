use crate::error::ShapeError;
use crate::primitives::ShapeKind;
use crate::shape::Shape;
use glam::{Mat4, Vec3};
use minivillage_common::{Color, Position};
use minivillage_render::{CameraMatrices, GraphicsContext, ShaderInfo};
use serde::{Deserialize, Serialize};

const BLADE_COLOR: Color = Color::rgb(0.3, 0.4, 0.3);
const BLADE_SEGMENTS: u32 = 4;
const TOWER_SEGMENTS: u32 = 36;
const MOTOR_HEIGHT: f32 = 3.0;
const MOTOR_RADIUS: f32 = 1.7;
const BLADE_RADIUS: f32 = 1.0;

/// Offsets from the tower top for the motor and the two long blades.
const BLADE_OFFSETS: [Vec3; 3] = [
    Vec3::new(0.0, -2.0, 4.3),
    Vec3::new(0.0, -2.0, 6.7),
    Vec3::new(0.0, -2.0, 7.0),
];

/// Construction parameters for a [`Windmill`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindmillParams {
    pub position: Position,
    pub height: f32,
    pub radius: f32,
    pub blade_length: f32,
    pub color: Color,
    /// Blade spin in degrees per second.
    pub speed: f32,
}

impl Default for WindmillParams {
    fn default() -> Self {
        Self {
            position: Vec3::new(-45.0, 12.5, -40.0),
            height: 30.0,
            radius: 3.0,
            blade_length: 20.0,
            color: Color::rgb(0.6, 0.4, 0.9),
            speed: 90.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Blade {
    shape: Shape,
    offset: Vec3,
}

/// Cylinder tower with a fixed motor housing and two spinning blades.
#[derive(Debug, Clone)]
pub struct Windmill {
    position: Position,
    height: f32,
    speed: f32,
    /// Accumulated blade rotation in degrees, kept in `[0, 360)`.
    angle: f32,
    tower: Shape,
    blades: [Blade; 3],
}

impl Windmill {
    pub fn new(params: WindmillParams) -> Result<Self, ShapeError> {
        let tower = Shape::new(ShapeKind::Cylinder {
            height: params.height,
            radius: params.radius,
            segments: TOWER_SEGMENTS,
            color: params.color,
        })?;
        let blade = |height: f32, radius: f32, offset: Vec3| -> Result<Blade, ShapeError> {
            Ok(Blade {
                shape: Shape::new(ShapeKind::Cylinder {
                    height,
                    radius,
                    segments: BLADE_SEGMENTS,
                    color: BLADE_COLOR,
                })?,
                offset,
            })
        };
        let blades = [
            blade(MOTOR_HEIGHT, MOTOR_RADIUS, BLADE_OFFSETS[0])?,
            blade(params.blade_length, BLADE_RADIUS, BLADE_OFFSETS[1])?,
            blade(params.blade_length, BLADE_RADIUS, BLADE_OFFSETS[2])?,
        ];
        Ok(Self {
            position: params.position,
            height: params.height,
            speed: params.speed,
            angle: 0.0,
            tower,
            blades,
        })
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Degrees per second.
    pub fn set_speed(&mut self, speed: f32) {
        tracing::debug!(speed, "windmill speed changed");
        self.speed = speed;
    }

    /// Advance the blades by `speed * elapsed` degrees, wrapping at 360.
    pub fn update_rotation(&mut self, elapsed: f32) {
        let angle = (self.angle + self.speed * elapsed).rem_euclid(360.0);
        // rem_euclid rounds tiny negative sums up to exactly 360.
        self.angle = if angle >= 360.0 { 0.0 } else { angle };
    }

    /// Tower and blade shapes, tower first.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        std::iter::once(&self.tower).chain(self.blades.iter().map(|b| &b.shape))
    }

    pub fn upload_buffers(&mut self, gfx: &mut dyn GraphicsContext) {
        self.tower.upload_buffers(gfx);
        for blade in &mut self.blades {
            blade.shape.upload_buffers(gfx);
        }
    }

    /// Model transform of blade `index` at the current angle.
    pub fn blade_transform(&self, index: usize) -> Mat4 {
        let offset = self.blades.get(index).map_or(Vec3::ZERO, |b| b.offset);
        let hub = self.position + Vec3::new(0.0, self.height / 2.0, 0.0) + offset;
        let spin = Mat4::from_rotation_z(self.angle.to_radians());
        let rotation = match index {
            0 => Mat4::from_rotation_x(90f32.to_radians()),
            1 => spin,
            _ => spin * Mat4::from_rotation_z(90f32.to_radians()),
        };
        Mat4::from_translation(hub) * rotation
    }

    /// Draw the tower, advance the rotation by `elapsed`, then draw the blades.
    pub fn draw(
        &mut self,
        gfx: &mut dyn GraphicsContext,
        shader: &ShaderInfo,
        camera: &CameraMatrices,
        elapsed: f32,
    ) {
        self.tower.draw(gfx, shader, camera, Mat4::from_translation(self.position));
        self.update_rotation(elapsed);
        for (i, blade) in self.blades.iter().enumerate() {
            blade.shape.draw(gfx, shader, camera, self.blade_transform(i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minivillage_render::RecordingContext;

    fn windmill() -> Windmill {
        Windmill::new(WindmillParams::default()).unwrap()
    }

    #[test]
    fn two_seconds_at_90_is_half_a_turn() {
        let mut mill = windmill();
        mill.update_rotation(0.5);
        let old = mill.angle();
        mill.update_rotation(2.0);
        assert!((mill.angle() - (old + 180.0) % 360.0).abs() < 1e-4);
    }

    #[test]
    fn four_seconds_returns_to_start() {
        let mut mill = windmill();
        mill.update_rotation(0.25);
        let start = mill.angle();
        mill.update_rotation(4.0);
        assert_eq!(mill.angle(), start);
    }

    #[test]
    fn angle_stays_in_range() {
        let mut mill = windmill();
        mill.set_speed(-250.0);
        for _ in 0..50 {
            mill.update_rotation(0.37);
            assert!((0.0..360.0).contains(&mill.angle()));
        }
    }

    #[test]
    fn tiny_reverse_step_wraps_below_360() {
        let mut mill = windmill();
        mill.set_speed(-1e-6);
        mill.update_rotation(1.0);
        assert!((0.0..360.0).contains(&mill.angle()));
    }

    #[test]
    fn zero_speed_freezes_blades() {
        let mut mill = windmill();
        mill.set_speed(0.0);
        mill.update_rotation(10.0);
        assert_eq!(mill.angle(), 0.0);
    }

    #[test]
    fn motor_blade_ignores_spin() {
        let mut mill = windmill();
        let before = mill.blade_transform(0);
        mill.update_rotation(1.0);
        assert_eq!(mill.blade_transform(0), before);
        let hub = before.transform_point3(Vec3::ZERO);
        assert!((hub - Vec3::new(-45.0, 25.5, -35.7)).length() < 1e-4);
    }

    #[test]
    fn second_long_blade_is_quarter_turn_ahead() {
        let mut mill = windmill();
        mill.update_rotation(0.3);
        let one = mill.blade_transform(1).transform_vector3(Vec3::Y);
        let two = mill.blade_transform(2).transform_vector3(Vec3::Y);
        assert!(one.dot(two).abs() < 1e-5);
    }

    #[test]
    fn draw_advances_once_and_draws_four_parts() {
        let mut gfx = RecordingContext::new(ShaderInfo::default(), 960, 640);
        let shader = gfx.shader();
        let mut mill = windmill();
        mill.upload_buffers(&mut gfx);
        assert_eq!(gfx.buffer_count(), 8);

        mill.draw(&mut gfx, &shader, &CameraMatrices::default(), 0.5);
        assert!((mill.angle() - 45.0).abs() < 1e-5);
        // Each cylinder is one strip and two fans.
        assert_eq!(gfx.draw_calls().count(), 12);
        assert_eq!(mill.shapes().count(), 4);
    }
}
