use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use minivillage_render::{
    AttributeLocation, BufferHandle, GraphicsContext, PrimitiveKind, ProgramHandle, ShaderInfo,
    UniformLocation,
};
use std::num::NonZeroU64;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const POSITION_STRIDE: u64 = 3 * 4;
const COLOR_STRIDE: u64 = 4 * 4;
const INITIAL_DRAW_SLOTS: u64 = 1024;

/// Failures bringing up or presenting to the GPU surface.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    UnsupportedSurface,
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    model_view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

/// A draw recorded during the frame and replayed in [`WgpuContext::present`].
#[derive(Debug, Clone, Copy)]
struct PendingDraw {
    kind: PrimitiveKind,
    first: u32,
    count: u32,
    position: BufferHandle,
    color: BufferHandle,
    uniform_slot: u32,
    /// Start of this draw's indices in the frame's fan index list.
    fan_start: u32,
}

struct Pipelines {
    triangles: wgpu::RenderPipeline,
    strip: wgpu::RenderPipeline,
    lines: wgpu::RenderPipeline,
}

impl Pipelines {
    fn for_kind(&self, kind: PrimitiveKind) -> &wgpu::RenderPipeline {
        match kind {
            PrimitiveKind::Triangles | PrimitiveKind::TriangleFan => &self.triangles,
            PrimitiveKind::TriangleStrip => &self.strip,
            PrimitiveKind::Lines => &self.lines,
        }
    }
}

/// Indices that expand a fan of `count` vertices into a triangle list.
fn fan_indices(count: u32) -> impl Iterator<Item = u32> {
    (1..count.saturating_sub(1)).flat_map(|i| [0, i, i + 1])
}

fn aligned(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment.max(1)) * alignment.max(1)
}

/// [`GraphicsContext`] backed by a wgpu surface.
///
/// Calls between [`GraphicsContext::clear`] and [`WgpuContext::present`] are
/// recorded; `present` encodes them into one render pass in call order.
pub struct WgpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipelines: Pipelines,
    uniform_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    uniform_slots: u64,
    depth_view: wgpu::TextureView,
    buffers: Vec<Option<wgpu::Buffer>>,
    shader: ShaderInfo,
    bound_position: Option<BufferHandle>,
    bound_color: Option<BufferHandle>,
    model_view: Mat4,
    projection: Mat4,
    clear_color: wgpu::Color,
    pending: Vec<PendingDraw>,
    uniforms: Vec<DrawUniforms>,
    fan_indices: Vec<u32>,
}

impl WgpuContext {
    /// Create a surface on `target`, pick an adapter and build the pipelines.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, ContextError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(ContextError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("minivillage_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let caps = surface.get_capabilities(&adapter);
        // Vertex colors are authored as display values, so prefer a linear target.
        let format = caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or(ContextError::UnsupportedSurface)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .ok_or(ContextError::UnsupportedSurface)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let uniform_size = std::mem::size_of::<DrawUniforms>() as u64;
        let uniform_stride = aligned(
            uniform_size,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_uniform_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(uniform_size),
                },
                count: None,
            }],
        });
        let (uniform_buffer, uniform_bind_group) =
            Self::create_uniforms(&device, &uniform_layout, uniform_stride, INITIAL_DRAW_SLOTS);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("vertex_color_layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("vertex_color_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::VERTEX_COLOR_SHADER.into()),
        });
        let pipeline = |topology, label| {
            Self::create_pipeline(&device, &pipeline_layout, &module, format, topology, label)
        };
        let pipelines = Pipelines {
            triangles: pipeline(wgpu::PrimitiveTopology::TriangleList, "triangles_pipeline"),
            strip: pipeline(wgpu::PrimitiveTopology::TriangleStrip, "strip_pipeline"),
            lines: pipeline(wgpu::PrimitiveTopology::LineList, "lines_pipeline"),
        };

        let depth_view = Self::create_depth_texture(&device, config.width, config.height);

        tracing::info!(
            backend = adapter.get_info().backend.to_str(),
            ?format,
            width = config.width,
            height = config.height,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipelines,
            uniform_layout,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            uniform_slots: INITIAL_DRAW_SLOTS,
            depth_view,
            buffers: Vec::new(),
            shader: ShaderInfo::default(),
            bound_position: None,
            bound_color: None,
            model_view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            clear_color: wgpu::Color::BLACK,
            pending: Vec::new(),
            uniforms: Vec::new(),
            fan_indices: Vec::new(),
        })
    }

    /// Locations understood by [`shaders::VERTEX_COLOR_SHADER`].
    pub fn shader_info(&self) -> ShaderInfo {
        self.shader
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth_view =
            Self::create_depth_texture(&self.device, self.config.width, self.config.height);
    }

    /// Encode the recorded draws into one pass and show the frame.
    ///
    /// A lost or outdated surface is reconfigured and the frame dropped.
    pub fn present(&mut self) -> Result<(), ContextError> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                self.reset_frame();
                return Ok(());
            }
            Err(e) => {
                self.reset_frame();
                return Err(e.into());
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.ensure_uniform_slots(self.uniforms.len() as u64);
        if !self.uniforms.is_empty() {
            let stride = self.uniform_stride as usize;
            let mut bytes = vec![0u8; self.uniforms.len() * stride];
            for (slot, u) in self.uniforms.iter().enumerate() {
                let at = slot * stride;
                bytes[at..at + std::mem::size_of::<DrawUniforms>()]
                    .copy_from_slice(bytemuck::bytes_of(u));
            }
            self.queue.write_buffer(&self.uniform_buffer, 0, &bytes);
        }
        let index_buffer = (!self.fan_indices.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("fan_index_buffer"),
                    contents: bytemuck::cast_slice(&self.fan_indices),
                    usage: wgpu::BufferUsages::INDEX,
                })
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("village_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            for draw in &self.pending {
                let (Some(Some(positions)), Some(Some(colors))) = (
                    self.buffers.get(draw.position.0 as usize),
                    self.buffers.get(draw.color.0 as usize),
                ) else {
                    continue;
                };
                pass.set_pipeline(self.pipelines.for_kind(draw.kind));
                let offset = (draw.uniform_slot as u64 * self.uniform_stride) as u32;
                pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);
                pass.set_vertex_buffer(0, positions.slice(draw.first as u64 * POSITION_STRIDE..));
                pass.set_vertex_buffer(1, colors.slice(draw.first as u64 * COLOR_STRIDE..));

                if draw.kind == PrimitiveKind::TriangleFan {
                    if let Some(indices) = &index_buffer {
                        let len = fan_indices(draw.count).count() as u32;
                        pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        pass.draw_indexed(draw.fan_start..draw.fan_start + len, 0, 0..1);
                    }
                } else {
                    pass.draw(0..draw.count, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        self.reset_frame();
        Ok(())
    }

    fn reset_frame(&mut self) {
        self.pending.clear();
        self.uniforms.clear();
        self.fan_indices.clear();
    }

    fn ensure_uniform_slots(&mut self, needed: u64) {
        if needed <= self.uniform_slots {
            return;
        }
        let slots = needed.next_power_of_two();
        tracing::debug!(slots, "growing draw uniform buffer");
        let (buffer, bind_group) =
            Self::create_uniforms(&self.device, &self.uniform_layout, self.uniform_stride, slots);
        self.uniform_buffer = buffer;
        self.uniform_bind_group = bind_group;
        self.uniform_slots = slots;
    }

    fn create_uniforms(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        slots: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw_uniform_buffer"),
            size: stride * slots,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_uniform_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        module: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
        topology: wgpu::PrimitiveTopology,
        label: &str,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: POSITION_STRIDE,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: COLOR_STRIDE,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![1 => Float32x4],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

impl GraphicsContext for WgpuContext {
    fn create_buffer(&mut self) -> BufferHandle {
        let handle = BufferHandle(self.buffers.len() as u32);
        self.buffers.push(None);
        handle
    }

    fn upload_vertex_data(&mut self, buffer: BufferHandle, data: &[f32]) {
        let Some(slot) = self.buffers.get_mut(buffer.0 as usize) else {
            tracing::warn!(buffer = buffer.0, "upload to unknown buffer ignored");
            return;
        };
        *slot = (!data.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("vertex_buffer"),
                    contents: bytemuck::cast_slice(data),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });
    }

    fn bind_attribute(
        &mut self,
        buffer: BufferHandle,
        location: AttributeLocation,
        _components: u32,
    ) {
        if location == self.shader.vertex_position {
            self.bound_position = Some(buffer);
        } else if location == self.shader.vertex_color {
            self.bound_color = Some(buffer);
        }
    }

    fn draw_primitives(&mut self, kind: PrimitiveKind, first: u32, count: u32) {
        let (Some(position), Some(color)) = (self.bound_position, self.bound_color) else {
            tracing::trace!("draw without bound attributes skipped");
            return;
        };
        if count == 0 {
            return;
        }
        let uniform_slot = self.uniforms.len() as u32;
        self.uniforms.push(DrawUniforms {
            model_view: self.model_view.to_cols_array_2d(),
            projection: self.projection.to_cols_array_2d(),
        });
        let fan_start = self.fan_indices.len() as u32;
        if kind == PrimitiveKind::TriangleFan {
            self.fan_indices.extend(fan_indices(count));
        }
        self.pending.push(PendingDraw {
            kind,
            first,
            count,
            position,
            color,
            uniform_slot,
            fan_start,
        });
    }

    fn set_uniform_matrix4(&mut self, location: UniformLocation, matrix: &Mat4) {
        if location == self.shader.model_view_matrix {
            self.model_view = *matrix;
        } else if location == self.shader.projection_matrix {
            self.projection = *matrix;
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        if program != self.shader.program {
            tracing::warn!(program = program.0, "only the vertex-color program exists");
        }
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.clear_color = wgpu::Color {
            r: color[0] as f64,
            g: color[1] as f64,
            b: color[2] as f64,
            a: color[3] as f64,
        };
        self.reset_frame();
    }

    fn viewport_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}
