use std::collections::HashSet;
use std::num::NonZeroU64;

use glam::Mat4;
use tracing::{debug, warn};
use wgpu::*;

use crate::controller::{CameraUniform, RenderFrame, TransformUniform};
use crate::error::ModelError;
use crate::model::{ModelRegistry, SceneInstance};
use crate::utils::{MeshBuffer, Vertex};

pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

const CLEAR_COLOR: Color = Color { r: 0.4, g: 0.0, b: 0.0, a: 1.0 };

const TRANSFORM_SIZE: u64 = std::mem::size_of::<TransformUniform>() as u64;

/// One instance resolved against the registry
pub struct DrawCall<'a, B> {
    pub buffers: &'a B,
    pub model: Mat4,
}

/// Draws in scene order, plus the instances whose model was not registered
pub struct DrawPlan<'a, B> {
    pub draws: Vec<DrawCall<'a, B>>,
    pub missing: Vec<ModelError>,
}

/// Resolve every instance to its buffers and model matrix. Unknown models
/// are skipped, never fatal.
pub fn plan_draws<'a, B>(instances: &[SceneInstance], registry: &'a ModelRegistry<B>) -> DrawPlan<'a, B> {
    let mut draws = Vec::with_capacity(instances.len());
    let mut missing = Vec::new();
    for instance in instances {
        match registry.get(&instance.model) {
            Ok(buffers) => draws.push(DrawCall { buffers, model: instance.model_matrix() }),
            Err(e) => missing.push(e),
        }
    }
    DrawPlan { draws, missing }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub drawn: usize,
    pub skipped: usize,
}

/// Tessellated egui output ready to be painted over the scene
pub struct OverlayFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

pub fn create_depth_texture(device: &Device, width: u32, height: u32) -> (Texture, TextureView) {
    let depth_texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth_view = depth_texture.create_view(&TextureViewDescriptor::default());
    (depth_texture, depth_view)
}

pub struct CameraResources {
    pub camera_buffer: Buffer,
    pub bind_group_layout: BindGroupLayout,
    pub camera_bind_group: BindGroup,
}

pub fn create_camera_resources(device: &Device) -> CameraResources {
    let camera_buffer = device.create_buffer(&BufferDescriptor {
        label: Some("camera_buffer"),
        size: std::mem::size_of::<CameraUniform>() as u64,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("camera_bgl"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let camera_bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("camera_bind_group"),
        layout: &bind_group_layout,
        entries: &[BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() }],
    });

    CameraResources { camera_buffer, bind_group_layout, camera_bind_group }
}

/// Per-instance model matrices in one uniform buffer, selected with a
/// dynamic offset for each draw
pub struct ModelResources {
    pub buffer: Buffer,
    pub bind_group_layout: BindGroupLayout,
    pub bind_group: BindGroup,
    pub stride: u64,
    pub capacity: usize,
}

impl ModelResources {
    pub fn new(device: &Device, capacity: usize) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("model_bgl"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(TRANSFORM_SIZE),
                },
                count: None,
            }],
        });
        let stride = util::align_to(TRANSFORM_SIZE, device.limits().min_uniform_buffer_offset_alignment as u64);
        let (buffer, bind_group) = Self::allocate(device, &bind_group_layout, stride, capacity);
        Self { buffer, bind_group_layout, bind_group, stride, capacity }
    }

    fn allocate(device: &Device, layout: &BindGroupLayout, stride: u64, capacity: usize) -> (Buffer, BindGroup) {
        let buffer = device.create_buffer(&BufferDescriptor {
            label: Some("model_buffer"),
            size: stride * capacity.max(1) as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("model_bind_group"),
            layout,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: BindingResource::Buffer(BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(TRANSFORM_SIZE),
                }),
            }],
        });
        (buffer, bind_group)
    }

    /// Grow the buffer when the scene outgrows it; bind group is rebuilt
    pub fn ensure_capacity(&mut self, device: &Device, count: usize) {
        if count <= self.capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        debug!(from = self.capacity, to = capacity, "growing model uniform buffer");
        let (buffer, bind_group) = Self::allocate(device, &self.bind_group_layout, self.stride, capacity);
        self.buffer = buffer;
        self.bind_group = bind_group;
        self.capacity = capacity;
    }

    pub fn write(&self, queue: &Queue, models: impl Iterator<Item = Mat4>) {
        let stride = self.stride as usize;
        let mut bytes = Vec::new();
        for (i, model) in models.enumerate() {
            bytes.resize((i + 1) * stride, 0);
            let uniform = TransformUniform::new(model);
            bytes[i * stride..i * stride + TRANSFORM_SIZE as usize].copy_from_slice(bytemuck::bytes_of(&uniform));
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, &bytes);
        }
    }

    pub fn offset(&self, index: usize) -> DynamicOffset {
        (self.stride * index as u64) as DynamicOffset
    }
}

pub fn create_cube_pipeline(
    device: &Device,
    format: TextureFormat,
    camera_bgl: &BindGroupLayout,
    model_bgl: &BindGroupLayout,
) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("cube_shader"),
        source: ShaderSource::Wgsl(include_str!("../shaders/cube.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("pipeline_layout"),
        bind_group_layouts: &[camera_bgl, model_bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("cube_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
                step_mode: VertexStepMode::Vertex,
                attributes: &[
                    VertexAttribute { offset: 0, shader_location: 0, format: VertexFormat::Float32x3 },
                    VertexAttribute { offset: 12, shader_location: 1, format: VertexFormat::Float32x4 },
                ],
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState { format, blend: Some(BlendState::REPLACE), write_mask: ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::LessEqual,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

///////////////////////////////////////////////////////////////////////////////

/// Everything needed to turn a [`RenderFrame`] into pixels
pub struct RenderState {
    pub width: u32,
    pub height: u32,

    pub pipeline: RenderPipeline,
    pub camera: CameraResources,
    pub models: ModelResources,
    pub registry: ModelRegistry<MeshBuffer>,
    pub depth_view: TextureView,

    pub egui_renderer: egui_wgpu::Renderer,

    warned_models: HashSet<String>,
}

impl RenderState {
    pub fn new(
        device: &Device,
        format: TextureFormat,
        width: u32,
        height: u32,
        registry: ModelRegistry<MeshBuffer>,
        initial_instances: usize,
    ) -> Self {
        let camera = create_camera_resources(device);
        let models = ModelResources::new(device, initial_instances);
        let pipeline = create_cube_pipeline(device, format, &camera.bind_group_layout, &models.bind_group_layout);
        let (_, depth_view) = create_depth_texture(device, width, height);
        let egui_renderer = egui_wgpu::Renderer::new(device, format, egui_wgpu::RendererOptions::default());

        Self {
            width,
            height,
            pipeline,
            camera,
            models,
            registry,
            depth_view,
            egui_renderer,
            warned_models: HashSet::new(),
        }
    }

    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.width = width;
        self.height = height;
        let (_, depth_view) = create_depth_texture(device, width, height);
        self.depth_view = depth_view;
    }

    /// Clear, draw one indexed cube per resolvable instance, then the overlay
    pub fn draw_frame(
        &mut self,
        device: &Device,
        queue: &Queue,
        surface: &Surface,
        instances: &[SceneInstance],
        frame: &RenderFrame,
        overlay: Option<OverlayFrame>,
    ) -> Result<DrawStats, SurfaceError> {
        let output = surface.get_current_texture()?;
        let view = output.texture.create_view(&TextureViewDescriptor::default());

        queue.write_buffer(&self.camera.camera_buffer, 0, bytemuck::bytes_of(&CameraUniform::new(frame.view_proj)));

        let plan = plan_draws(instances, &self.registry);
        for ModelError::UnknownModel(name) in &plan.missing {
            if self.warned_models.insert(name.clone()) {
                warn!(model = %name, "skipping scene instance with unknown model");
            }
        }
        let stats = DrawStats { drawn: plan.draws.len(), skipped: plan.missing.len() };

        self.models.ensure_capacity(device, plan.draws.len());
        self.models.write(queue, plan.draws.iter().map(|d| d.model));

        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations { load: LoadOp::Clear(CLEAR_COLOR), store: StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations { load: LoadOp::Clear(1.0), store: StoreOp::Store }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_pipeline(&self.pipeline);
            rp.set_bind_group(0, &self.camera.camera_bind_group, &[]);

            for (i, draw) in plan.draws.iter().enumerate() {
                let mesh = draw.buffers;
                rp.set_bind_group(1, &self.models.bind_group, &[self.models.offset(i)]);
                rp.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                rp.set_index_buffer(mesh.index_buffer.slice(..), IndexFormat::Uint32);
                rp.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        let mut command_buffers = Vec::new();
        if let Some(overlay) = overlay {
            command_buffers = self.paint_overlay(device, queue, &mut encoder, &view, overlay);
        }
        command_buffers.push(encoder.finish());

        queue.submit(command_buffers);
        output.present();

        Ok(stats)
    }

    fn paint_overlay(
        &mut self,
        device: &Device,
        queue: &Queue,
        encoder: &mut CommandEncoder,
        view: &TextureView,
        overlay: OverlayFrame,
    ) -> Vec<CommandBuffer> {
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.width, self.height],
            pixels_per_point: overlay.pixels_per_point,
        };

        for (id, image_delta) in &overlay.textures_delta.set {
            self.egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let extra = self
            .egui_renderer
            .update_buffers(device, queue, encoder, &overlay.primitives, &screen_descriptor);

        {
            let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("egui_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations { load: LoadOp::Load, store: StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui_renderer
                .render(&mut egui_pass.forget_lifetime(), &overlay.primitives, &screen_descriptor);
        }

        for id in &overlay.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
        extra
    }
}
