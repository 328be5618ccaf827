use crate::error::ShapeError;
use crate::mesh::Mesh;
use crate::primitives::ShapeKind;
use glam::Mat4;
use minivillage_render::{BufferHandle, CameraMatrices, GraphicsContext, ShaderInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ShapeBuffers {
    position: BufferHandle,
    color: BufferHandle,
}

/// A generated mesh plus the GPU buffers it was uploaded to.
///
/// Lifecycle: [`Shape::new`] generates the mesh, [`Shape::upload_buffers`]
/// creates and fills the two buffers once, then [`Shape::draw`] may be called
/// any number of times with a fresh model transform.
#[derive(Debug, Clone)]
pub struct Shape {
    kind: ShapeKind,
    mesh: Mesh,
    buffers: Option<ShapeBuffers>,
}

impl Shape {
    pub fn new(kind: ShapeKind) -> Result<Self, ShapeError> {
        let mesh = kind.generate_mesh()?;
        tracing::trace!(
            shape = kind.name(),
            vertices = mesh.vertex_count(),
            "mesh generated"
        );
        Ok(Self {
            kind,
            mesh,
            buffers: None,
        })
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn is_uploaded(&self) -> bool {
        self.buffers.is_some()
    }

    /// Create and fill the position and color buffers. Later calls do nothing.
    pub fn upload_buffers(&mut self, gfx: &mut dyn GraphicsContext) {
        if self.buffers.is_some() {
            return;
        }
        let position = gfx.create_buffer();
        gfx.upload_vertex_data(position, self.mesh.positions());
        let color = gfx.create_buffer();
        gfx.upload_vertex_data(color, self.mesh.colors());
        self.buffers = Some(ShapeBuffers { position, color });
    }

    /// Bind buffers, upload `view * model` and the projection, and draw
    /// every range of the mesh. Does nothing until buffers are uploaded.
    pub fn draw(
        &self,
        gfx: &mut dyn GraphicsContext,
        shader: &ShaderInfo,
        camera: &CameraMatrices,
        model: Mat4,
    ) {
        let Some(buffers) = self.buffers else {
            tracing::trace!(shape = self.kind.name(), "draw skipped, buffers not uploaded");
            return;
        };
        gfx.bind_attribute(buffers.position, shader.vertex_position, 3);
        gfx.bind_attribute(buffers.color, shader.vertex_color, 4);
        gfx.set_uniform_matrix4(shader.model_view_matrix, &camera.model_view(model));
        gfx.set_uniform_matrix4(shader.projection_matrix, &camera.projection);
        for range in self.mesh.ranges() {
            gfx.draw_primitives(range.kind, range.first, range.count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use minivillage_common::Color;
    use minivillage_render::{GraphicsCommand, PrimitiveKind, RecordingContext};

    fn cube() -> Shape {
        Shape::new(ShapeKind::Cube {
            size: 3.0,
            color: Color::rgb(0.98, 0.78, 0.82),
        })
        .unwrap()
    }

    fn camera() -> CameraMatrices {
        CameraMatrices {
            view: Mat4::from_translation(Vec3::new(0.0, 0.0, -50.0)),
            projection: Mat4::perspective_rh(0.8, 1.5, 0.1, 100.0),
        }
    }

    #[test]
    fn draw_before_upload_is_a_no_op() {
        let mut gfx = RecordingContext::new(ShaderInfo::default(), 960, 640);
        let shader = gfx.shader();
        cube().draw(&mut gfx, &shader, &camera(), Mat4::IDENTITY);
        assert!(gfx.commands().is_empty());
    }

    #[test]
    fn upload_is_idempotent() {
        let mut gfx = RecordingContext::new(ShaderInfo::default(), 960, 640);
        let mut shape = cube();
        shape.upload_buffers(&mut gfx);
        shape.upload_buffers(&mut gfx);
        assert_eq!(gfx.buffer_count(), 2);
        assert!(shape.is_uploaded());
    }

    #[test]
    fn upload_sends_mesh_data() {
        let mut gfx = RecordingContext::new(ShaderInfo::default(), 960, 640);
        let mut shape = cube();
        shape.upload_buffers(&mut gfx);
        let uploaded: Vec<&[f32]> = (0..2)
            .filter_map(|i| gfx.buffer_data(BufferHandle(i)))
            .collect();
        assert_eq!(uploaded[0], shape.mesh().positions());
        assert_eq!(uploaded[1], shape.mesh().colors());
    }

    #[test]
    fn draw_uploads_model_view_and_projection() {
        let mut gfx = RecordingContext::new(ShaderInfo::default(), 960, 640);
        let shader = gfx.shader();
        let mut shape = cube();
        shape.upload_buffers(&mut gfx);
        gfx.take_commands();

        let cam = camera();
        let model = Mat4::from_translation(Vec3::new(-10.0, 0.0, 3.0));
        shape.draw(&mut gfx, &shader, &cam, model);

        let call = gfx.draw_calls().next().copied().unwrap();
        assert_eq!(call.kind, PrimitiveKind::Triangles);
        assert_eq!(call.count, 36);
        assert_eq!(call.model_view, cam.view * model);
        assert_eq!(call.projection, cam.projection);
        let reuploaded = gfx.commands().iter().any(|c| {
            matches!(
                c,
                GraphicsCommand::CreateBuffer(_) | GraphicsCommand::Upload { .. }
            )
        });
        assert!(!reuploaded);
    }

    #[test]
    fn cylinder_issues_one_draw_per_range() {
        let mut gfx = RecordingContext::new(ShaderInfo::default(), 960, 640);
        let shader = gfx.shader();
        let mut post = Shape::new(ShapeKind::fence_post()).unwrap();
        post.upload_buffers(&mut gfx);
        post.draw(&mut gfx, &shader, &camera(), Mat4::IDENTITY);

        let kinds: Vec<PrimitiveKind> = gfx.draw_calls().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PrimitiveKind::TriangleStrip,
                PrimitiveKind::TriangleFan,
                PrimitiveKind::TriangleFan
            ]
        );
    }

    #[test]
    fn invalid_kind_fails_construction() {
        let kind = ShapeKind::Road {
            start: minivillage_common::XzPoint::ZERO,
            end: minivillage_common::XzPoint::ZERO,
            width: 3.0,
            color: Color::default(),
        };
        assert!(matches!(Shape::new(kind), Err(ShapeError::ZeroLengthRoad { .. })));
    }
}
