use glam::Mat4;
use minivillage_common::Position;
use minivillage_render::{CameraMatrices, GraphicsContext, ShaderInfo};
use minivillage_shapes::{Shape, ShapeError, ShapeKind, Windmill};

/// A shape placed in the world.
#[derive(Debug, Clone)]
pub struct SceneEntry {
    pub shape: Shape,
    pub position: Position,
    /// Rotation about world Y in radians, applied after the translation.
    pub yaw: f32,
}

impl SceneEntry {
    pub fn new(kind: ShapeKind, position: Position) -> Result<Self, ShapeError> {
        Ok(Self {
            shape: Shape::new(kind)?,
            position,
            yaw: 0.0,
        })
    }

    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    pub fn model_matrix(&self) -> Mat4 {
        let translation = Mat4::from_translation(self.position);
        if self.yaw == 0.0 {
            translation
        } else {
            translation * Mat4::from_rotation_y(self.yaw)
        }
    }

    fn draw(&self, gfx: &mut dyn GraphicsContext, shader: &ShaderInfo, camera: &CameraMatrices) {
        self.shape.draw(gfx, shader, camera, self.model_matrix());
    }
}

/// The flat, ordered render list built once at startup.
///
/// Categories are kept apart so the per-frame draw order is fixed: axes,
/// ground, houses, roads, doors again, fence posts, fence planks, windmill.
#[derive(Debug, Clone)]
pub struct Scene {
    pub axes: Option<SceneEntry>,
    pub ground: SceneEntry,
    /// Cubes, windows, doors and roofs, house by house.
    pub houses: Vec<SceneEntry>,
    pub roads: Vec<SceneEntry>,
    pub fence_posts: Vec<SceneEntry>,
    pub fence_planks: Vec<SceneEntry>,
    pub windmill: Windmill,
}

impl Scene {
    /// Entries produced by the village builders: house parts, roads, fence
    /// posts and planks, plus one for the windmill. Axes and ground excluded.
    pub fn entry_count(&self) -> usize {
        self.houses.len() + self.roads.len() + self.fence_posts.len() + self.fence_planks.len() + 1
    }

    pub fn door_count(&self) -> usize {
        self.doors().count()
    }

    fn doors(&self) -> impl Iterator<Item = &SceneEntry> {
        self.houses.iter().filter(|e| e.shape.kind().is_door())
    }

    /// Every placed entry in draw order, excluding the windmill.
    pub fn entries(&self) -> impl Iterator<Item = &SceneEntry> {
        self.axes
            .iter()
            .chain(std::iter::once(&self.ground))
            .chain(&self.houses)
            .chain(&self.roads)
            .chain(&self.fence_posts)
            .chain(&self.fence_planks)
    }

    pub fn set_axes_visible(&mut self, visible: bool, bound: f32) -> Result<(), ShapeError> {
        match (visible, self.axes.is_some()) {
            (true, false) => {
                self.axes = Some(SceneEntry::new(
                    ShapeKind::Coord { bound },
                    Position::ZERO,
                )?);
            }
            (false, true) => self.axes = None,
            _ => {}
        }
        Ok(())
    }

    /// Upload every shape's buffers. Safe to call again after adding entries.
    pub fn upload(&mut self, gfx: &mut dyn GraphicsContext) {
        let _span = tracing::debug_span!("scene_upload").entered();
        let Scene {
            axes,
            ground,
            houses,
            roads,
            fence_posts,
            fence_planks,
            windmill,
        } = self;
        let entries = axes
            .iter_mut()
            .chain(std::iter::once(ground))
            .chain(houses.iter_mut())
            .chain(roads.iter_mut())
            .chain(fence_posts.iter_mut())
            .chain(fence_planks.iter_mut());
        for entry in entries {
            entry.shape.upload_buffers(gfx);
        }
        windmill.upload_buffers(gfx);
    }

    /// Draw one frame in the fixed category order. Advances the windmill by
    /// `elapsed` seconds.
    pub fn draw(
        &mut self,
        gfx: &mut dyn GraphicsContext,
        shader: &ShaderInfo,
        camera: &CameraMatrices,
        elapsed: f32,
    ) {
        if let Some(axes) = &self.axes {
            axes.draw(gfx, shader, camera);
        }
        self.ground.draw(gfx, shader, camera);
        for entry in &self.houses {
            entry.draw(gfx, shader, camera);
        }
        for road in &self.roads {
            road.draw(gfx, shader, camera);
        }
        // Doors are drawn a second time on top of the house pass.
        for door in self.doors() {
            door.draw(gfx, shader, camera);
        }
        for post in &self.fence_posts {
            post.draw(gfx, shader, camera);
        }
        for plank in &self.fence_planks {
            plank.draw(gfx, shader, camera);
        }
        self.windmill.draw(gfx, shader, camera, elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VillageConfig;
    use crate::layout::build_village;
    use glam::Vec3;
    use minivillage_render::{PrimitiveKind, RecordingContext};

    fn uploaded_scene(gfx: &mut RecordingContext) -> Scene {
        let mut scene = build_village(&VillageConfig::default()).unwrap();
        scene.upload(gfx);
        gfx.take_commands();
        scene
    }

    #[test]
    fn plank_model_translates_then_yaws() {
        let entry = SceneEntry::new(ShapeKind::fence_post(), Vec3::new(1.0, 2.0, 3.0))
            .unwrap()
            .with_yaw(std::f32::consts::FRAC_PI_2);
        let m = entry.model_matrix();
        assert!((m.transform_point3(Vec3::ZERO) - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);
        assert!((m.transform_vector3(Vec3::X) - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn upload_covers_every_shape_once() {
        let mut gfx = RecordingContext::new(ShaderInfo::default(), 960, 640);
        let mut scene = build_village(&VillageConfig::default()).unwrap();
        scene.upload(&mut gfx);
        let shapes = scene.entries().count() + scene.windmill.shapes().count();
        assert_eq!(gfx.buffer_count(), shapes * 2);

        scene.upload(&mut gfx);
        assert_eq!(gfx.buffer_count(), shapes * 2);
    }

    #[test]
    fn draw_order_and_double_doors() {
        let mut gfx = RecordingContext::new(ShaderInfo::default(), 960, 640);
        let shader = gfx.shader();
        let mut scene = uploaded_scene(&mut gfx);
        scene.draw(&mut gfx, &shader, &CameraMatrices::default(), 0.0);

        let calls: Vec<_> = gfx.draw_calls().copied().collect();
        // Axes then the grid, both line lists.
        assert_eq!(calls[0].kind, PrimitiveKind::Lines);
        assert_eq!(calls[0].count, 6);
        assert_eq!(calls[1].kind, PrimitiveKind::Lines);
        assert_eq!(calls[1].count, 100 * 100 * 8);
        // Ground sits 3 below the origin.
        assert_eq!(calls[1].model_view, Mat4::from_translation(Vec3::new(0.0, -3.0, 0.0)));

        let houses = scene.houses.len();
        let roads = &calls[2 + houses..2 + houses + 5];
        assert!(roads.iter().all(|c| c.kind == PrimitiveKind::TriangleStrip && c.count == 4));

        let doors = &calls[2 + houses + 5..2 + houses + 5 + scene.door_count()];
        assert_eq!(doors.len(), 4);
        assert!(doors.iter().all(|c| c.count == 36));

        // Posts are one strip and two fans each, planks one triangle list,
        // then the windmill's four cylinders.
        let expected = 2 + houses + 5 + 4 + 80 * 3 + 76 + 4 * 3;
        assert_eq!(calls.len(), expected);
    }

    #[test]
    fn hidden_axes_are_not_drawn() {
        let mut gfx = RecordingContext::new(ShaderInfo::default(), 960, 640);
        let shader = gfx.shader();
        let mut scene = uploaded_scene(&mut gfx);
        scene.set_axes_visible(false, 1000.0).unwrap();
        scene.draw(&mut gfx, &shader, &CameraMatrices::default(), 0.0);
        assert_eq!(gfx.draw_calls().next().map(|c| c.count), Some(100 * 100 * 8));
    }

    #[test]
    fn re_enabled_axes_draw_after_upload() {
        let mut gfx = RecordingContext::new(ShaderInfo::default(), 960, 640);
        let shader = gfx.shader();
        let mut scene = uploaded_scene(&mut gfx);
        scene.set_axes_visible(false, 1000.0).unwrap();
        scene.set_axes_visible(true, 500.0).unwrap();

        // Fresh axes have no buffers yet and are skipped.
        scene.draw(&mut gfx, &shader, &CameraMatrices::default(), 0.0);
        assert_ne!(gfx.draw_calls().next().map(|c| c.count), Some(6));

        gfx.take_commands();
        scene.upload(&mut gfx);
        scene.draw(&mut gfx, &shader, &CameraMatrices::default(), 0.0);
        assert_eq!(gfx.draw_calls().next().map(|c| c.count), Some(6));
    }
}
