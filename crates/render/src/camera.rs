use glam::{Mat4, Vec3};
use minivillage_input::{InputState, Key};
use std::fmt;

/// Degrees the camera orbits per frame while a rotate key is held.
const ROTATE_STEP_DEGREES: f32 = 2.0;
const ZOOM_OUT_FACTOR: f32 = 1.05;
const ZOOM_IN_FACTOR: f32 = 0.95;

/// View and projection matrices derived from a [`Camera`] for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
}

impl CameraMatrices {
    /// `view * model`, the matrix uploaded as the model-view uniform.
    pub fn model_view(&self, model: Mat4) -> Mat4 {
        self.view * model
    }
}

impl Default for CameraMatrices {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }
}

/// Orbit camera looking at a target point.
///
/// Keyboard input orbits the position about the world origin and scales its
/// distance from it. Matrices are recomputed by [`Camera::refresh`] and must be
/// refreshed after any mutation before shapes read them.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    matrices: CameraMatrices,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::new(5.0, 20.0, 35.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_degrees: 45.0,
            aspect: 960.0 / 640.0,
            near: 0.1,
            far: 10_000.0,
            matrices: CameraMatrices::default(),
        };
        camera.refresh();
        camera
    }
}

impl Camera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        let mut camera = Self {
            position,
            target,
            ..Self::default()
        };
        camera.refresh();
        camera
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
    }

    pub fn set_look_at(&mut self, x: f32, y: f32, z: f32) {
        self.target = Vec3::new(x, y, z);
    }

    pub fn set_up(&mut self, x: f32, y: f32, z: f32) {
        self.up = Vec3::new(x, y, z);
    }

    pub fn set_near(&mut self, near: f32) {
        self.near = near;
    }

    pub fn set_far(&mut self, far: f32) {
        self.far = far;
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Apply held keys for one frame.
    ///
    /// Steps are fixed per frame; `_elapsed` is accepted for the frame-driver
    /// contract but does not scale the motion.
    pub fn handle_input(&mut self, input: &InputState, _elapsed: f32) {
        let mut pos = self.position;
        for key in Key::ALL {
            if !input.is_held(key) {
                continue;
            }
            pos = match key {
                Key::RotateLeft => rotate_about(pos, Vec3::Y, ROTATE_STEP_DEGREES),
                Key::RotateUp => rotate_about(pos, Vec3::X, ROTATE_STEP_DEGREES),
                Key::RotateRight => rotate_about(pos, Vec3::Y, -ROTATE_STEP_DEGREES),
                Key::RotateDown => rotate_about(pos, Vec3::X, -ROTATE_STEP_DEGREES),
                Key::ZoomOut => pos * ZOOM_OUT_FACTOR,
                Key::ZoomIn => pos * ZOOM_IN_FACTOR,
            };
        }
        self.position = pos;
    }

    /// Recompute view (look-at) and projection (perspective) from current state.
    pub fn refresh(&mut self) -> CameraMatrices {
        self.matrices = CameraMatrices {
            view: Mat4::look_at_rh(self.position, self.target, self.up),
            projection: Mat4::perspective_rh(
                self.fov_degrees.to_radians(),
                self.aspect,
                self.near,
                self.far,
            ),
        };
        self.matrices
    }

    /// Matrices from the last [`Camera::refresh`].
    pub fn matrices(&self) -> CameraMatrices {
        self.matrices
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x:{:.1}, y:{:.1}, z:{:.1}",
            self.position.x, self.position.y, self.position.z
        )
    }
}

fn rotate_about(v: Vec3, axis: Vec3, degrees: f32) -> Vec3 {
    Mat4::from_axis_angle(axis, degrees.to_radians()).transform_point3(v)
}
