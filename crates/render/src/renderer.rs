use glam::Mat4;

/// Opaque handle to a vertex buffer owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Opaque handle to a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Vertex attribute slot in the active program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeLocation(pub u32);

/// Uniform slot in the active program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Primitive assembly mode for a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Triangles,
    TriangleStrip,
    TriangleFan,
    Lines,
}

/// Attribute and uniform locations of the vertex-color program.
///
/// `vertex_position` takes 3 floats per vertex, `vertex_color` takes 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderInfo {
    pub program: ProgramHandle,
    pub vertex_position: AttributeLocation,
    pub vertex_color: AttributeLocation,
    pub model_view_matrix: UniformLocation,
    pub projection_matrix: UniformLocation,
}

impl Default for ShaderInfo {
    fn default() -> Self {
        Self {
            program: ProgramHandle(0),
            vertex_position: AttributeLocation(0),
            vertex_color: AttributeLocation(1),
            model_view_matrix: UniformLocation(0),
            projection_matrix: UniformLocation(1),
        }
    }
}

/// Immediate-mode draw interface implemented by every backend.
///
/// Matrices are column-major `glam::Mat4`.
pub trait GraphicsContext {
    fn create_buffer(&mut self) -> BufferHandle;

    fn upload_vertex_data(&mut self, buffer: BufferHandle, data: &[f32]);

    /// Bind `buffer` to attribute `location` with `components` floats per vertex.
    fn bind_attribute(
        &mut self,
        buffer: BufferHandle,
        location: AttributeLocation,
        components: u32,
    );

    /// Draw `count` vertices starting at `first` from the bound attributes.
    fn draw_primitives(&mut self, kind: PrimitiveKind, first: u32, count: u32);

    fn set_uniform_matrix4(&mut self, location: UniformLocation, matrix: &Mat4);

    fn use_program(&mut self, program: ProgramHandle);

    /// Clear color and depth for a new frame.
    fn clear(&mut self, color: [f32; 4]);

    /// Drawable size in pixels.
    fn viewport_size(&self) -> (u32, u32);

    fn aspect_ratio(&self) -> f32 {
        let (w, h) = self.viewport_size();
        w as f32 / h.max(1) as f32
    }
}

/// One call made against a [`RecordingContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicsCommand {
    CreateBuffer(BufferHandle),
    Upload {
        buffer: BufferHandle,
        len: usize,
    },
    BindAttribute {
        buffer: BufferHandle,
        location: AttributeLocation,
        components: u32,
    },
    Draw(DrawCall),
    SetUniform {
        location: UniformLocation,
        matrix: Mat4,
    },
    UseProgram(ProgramHandle),
    Clear([f32; 4]),
}

/// A draw call together with the state it was issued under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub kind: PrimitiveKind,
    pub first: u32,
    pub count: u32,
    pub position_buffer: Option<BufferHandle>,
    pub color_buffer: Option<BufferHandle>,
    pub model_view: Mat4,
    pub projection: Mat4,
}

/// GPU-free backend that records every call in order.
///
/// Uploaded vertex data is kept so callers can inspect what a shape sent.
#[derive(Debug)]
pub struct RecordingContext {
    shader: ShaderInfo,
    viewport: (u32, u32),
    buffers: Vec<Vec<f32>>,
    commands: Vec<GraphicsCommand>,
    bound_position: Option<BufferHandle>,
    bound_color: Option<BufferHandle>,
    model_view: Mat4,
    projection: Mat4,
}

impl RecordingContext {
    pub fn new(shader: ShaderInfo, width: u32, height: u32) -> Self {
        Self {
            shader,
            viewport: (width, height),
            buffers: Vec::new(),
            commands: Vec::new(),
            bound_position: None,
            bound_color: None,
            model_view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        }
    }

    pub fn shader(&self) -> ShaderInfo {
        self.shader
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn commands(&self) -> &[GraphicsCommand] {
        &self.commands
    }

    /// Drain the command log, keeping buffers and bindings.
    pub fn take_commands(&mut self) -> Vec<GraphicsCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn draw_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|c| match c {
            GraphicsCommand::Draw(call) => Some(call),
            _ => None,
        })
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Data last uploaded to `buffer`.
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[f32]> {
        self.buffers.get(buffer.0 as usize).map(Vec::as_slice)
    }

    /// Human-readable digest of the command log.
    pub fn summary(&self) -> String {
        let mut draws = 0usize;
        let mut vertices = 0u64;
        let mut by_kind = [0usize; 4];
        for call in self.draw_calls() {
            draws += 1;
            vertices += call.count as u64;
            by_kind[match call.kind {
                PrimitiveKind::Triangles => 0,
                PrimitiveKind::TriangleStrip => 1,
                PrimitiveKind::TriangleFan => 2,
                PrimitiveKind::Lines => 3,
            }] += 1;
        }
        let clears = self
            .commands
            .iter()
            .filter(|c| matches!(c, GraphicsCommand::Clear(_)))
            .count();

        let mut out = String::new();
        out.push_str(&format!(
            "=== Recorded frame log ({}x{}) ===\n",
            self.viewport.0, self.viewport.1
        ));
        out.push_str(&format!("Buffers: {}\n", self.buffers.len()));
        out.push_str(&format!("Clears: {clears}\n"));
        out.push_str(&format!("Draw calls: {draws} ({vertices} vertices)\n"));
        out.push_str(&format!(
            "  triangles={} strips={} fans={} lines={}\n",
            by_kind[0], by_kind[1], by_kind[2], by_kind[3]
        ));
        out
    }
}

impl GraphicsContext for RecordingContext {
    fn create_buffer(&mut self) -> BufferHandle {
        let handle = BufferHandle(self.buffers.len() as u32);
        self.buffers.push(Vec::new());
        self.commands.push(GraphicsCommand::CreateBuffer(handle));
        handle
    }

    fn upload_vertex_data(&mut self, buffer: BufferHandle, data: &[f32]) {
        match self.buffers.get_mut(buffer.0 as usize) {
            Some(slot) => {
                slot.clear();
                slot.extend_from_slice(data);
            }
            None => tracing::warn!(buffer = buffer.0, "upload to unknown buffer ignored"),
        }
        self.commands.push(GraphicsCommand::Upload {
            buffer,
            len: data.len(),
        });
    }

    fn bind_attribute(
        &mut self,
        buffer: BufferHandle,
        location: AttributeLocation,
        components: u32,
    ) {
        if location == self.shader.vertex_position {
            self.bound_position = Some(buffer);
        } else if location == self.shader.vertex_color {
            self.bound_color = Some(buffer);
        }
        self.commands.push(GraphicsCommand::BindAttribute {
            buffer,
            location,
            components,
        });
    }

    fn draw_primitives(&mut self, kind: PrimitiveKind, first: u32, count: u32) {
        self.commands.push(GraphicsCommand::Draw(DrawCall {
            kind,
            first,
            count,
            position_buffer: self.bound_position,
            color_buffer: self.bound_color,
            model_view: self.model_view,
            projection: self.projection,
        }));
    }

    fn set_uniform_matrix4(&mut self, location: UniformLocation, matrix: &Mat4) {
        if location == self.shader.model_view_matrix {
            self.model_view = *matrix;
        } else if location == self.shader.projection_matrix {
            self.projection = *matrix;
        }
        self.commands.push(GraphicsCommand::SetUniform {
            location,
            matrix: *matrix,
        });
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.commands.push(GraphicsCommand::UseProgram(program));
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.commands.push(GraphicsCommand::Clear(color));
    }

    fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }
}
