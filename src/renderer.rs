//! GPU rendering of the clock with wgpu.
//!
//! Pipelines, bind group layouts and the two textures are created once when
//! the widget is first prepared. Geometry is immediate-mode: every frame each
//! shape gets a freshly created vertex buffer and material uniform, and the
//! previous frame's buffers are destroyed before new ones are made.

use std::collections::HashMap;

use iced::widget::shader::wgpu::{self, CommandEncoder, Device, Queue, TextureFormat, TextureView};
use iced::{Rectangle, Size};
use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::camera::FrameUniform;
use crate::error::Error;
use crate::geometry::{Topology, Vertex};
use crate::scene::{Cull, MaterialUniform, Shape};
use crate::texture::{self, ENVIRONMENT_SIZE};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Pipelines are keyed by the primitive state they bake in.
type PipelineKey = (Topology, Cull);

/// GPU renderer for the clock.
#[derive(Debug)]
pub(crate) struct Renderer {
    /// Widget bounds in physical pixels.
    bounds: Rectangle<f32>,
    /// One mesh pipeline per topology and culling mode
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    /// Layout for the per-shape material uniform
    material_layout: wgpu::BindGroupLayout,
    /// Per-frame transforms and light
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    /// Dial texture, environment cube map and their samplers
    texture_bind_group: wgpu::BindGroup,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    background_pipeline: wgpu::RenderPipeline,
    background_vertex_buffer: wgpu::Buffer,
    background_index_buffer: wgpu::Buffer,
    /// Buffers uploaded for the current frame
    draws: Vec<Draw>,
}

/// Resources of one shape, alive for a single frame.
#[derive(Debug)]
struct Draw {
    label: &'static str,
    key: PipelineKey,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    material_buffer: wgpu::Buffer,
    material_bind_group: wgpu::BindGroup,
}

impl Draw {
    fn destroy(self) {
        self.vertex_buffer.destroy();
        self.material_buffer.destroy();
    }
}

impl Renderer {
    /// Creates pipelines and textures for the clock.
    ///
    /// Shader compilation and pipeline validation run inside a validation
    /// error scope; a captured error is returned as [`Error::Shader`].
    ///
    /// # Arguments
    /// * `bounds` - Widget bounds in physical pixels
    /// * `viewport_size` - Size of the whole render target, for the depth buffer
    /// * `dial` - Square image sampled by the face disc
    pub(crate) async fn new(
        device: &Device,
        queue: &Queue,
        format: TextureFormat,
        bounds: Rectangle<f32>,
        viewport_size: Size<u32>,
        dial: &RgbaImage,
    ) -> Result<Self, Error> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let (depth_texture, depth_view) = create_depth_target(device, viewport_size);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Buffer"),
            size: std::mem::size_of::<FrameUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
            label: Some("Frame Bind Group Layout"),
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
            label: Some("Frame Bind Group"),
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
            label: Some("Material Bind Group Layout"),
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2),
                sampler_entry(1),
                texture_entry(2, wgpu::TextureViewDimension::Cube),
                sampler_entry(3),
            ],
            label: Some("Texture Bind Group Layout"),
        });

        let dial_view = upload_dial(device, queue, dial);
        let environment_view = upload_environment(device, queue);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&dial_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&environment_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some("Texture Bind Group"),
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Clock Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Clock Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &material_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipelines: HashMap<_, _> = Topology::ALL
            .iter()
            .flat_map(|&topology| Cull::ALL.iter().map(move |&cull| (topology, cull)))
            .map(|key| {
                let pipeline = create_mesh_pipeline(device, &mesh_layout, &shader, format, key);
                (key, pipeline)
            })
            .collect();

        // Full-bounds quad in NDC for the backdrop
        let background_vertices: &[[f32; 2]] = &[[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
        let background_indices: &[u16] = &[0, 1, 2, 0, 2, 3];

        let background_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Background Vertex Buffer"),
            contents: bytemuck::cast_slice(background_vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let background_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Background Index Buffer"),
            contents: bytemuck::cast_slice(background_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let background_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Background Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("background.wgsl").into()),
        });

        let background_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Background Pipeline Layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let background_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Background Pipeline"),
            layout: Some(&background_layout),
            vertex: wgpu::VertexState {
                module: &background_shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x2],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &background_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        if let Some(error) = device.pop_error_scope().await {
            return Err(Error::Shader(error.to_string()));
        }

        log::info!(
            "renderer ready: {} clock pipelines, dial {}x{}, environment {}px",
            pipelines.len(),
            dial.width(),
            dial.height(),
            ENVIRONMENT_SIZE
        );

        Ok(Self {
            bounds,
            pipelines,
            material_layout,
            frame_buffer,
            frame_bind_group,
            texture_bind_group,
            depth_texture,
            depth_view,
            background_pipeline,
            background_vertex_buffer,
            background_index_buffer,
            draws: Vec::new(),
        })
    }

    /// Tracks the widget bounds and recreates the depth buffer when the
    /// render target changes size.
    pub(crate) fn resize(&mut self, device: &Device, new_bounds: Rectangle<f32>, new_size: Size<u32>) {
        self.bounds = new_bounds;

        if new_size.width > 0
            && new_size.height > 0
            && (self.depth_texture.width() != new_size.width
                || self.depth_texture.height() != new_size.height)
        {
            log::debug!("depth target resized to {}x{}", new_size.width, new_size.height);
            let (depth_texture, depth_view) = create_depth_target(device, new_size);
            self.depth_texture.destroy();
            self.depth_texture = depth_texture;
            self.depth_view = depth_view;
        }
    }

    /// Uploads this frame's transforms and shapes.
    ///
    /// Buffers of the previous frame are destroyed first; nothing is reused.
    pub(crate) fn prepare_frame(
        &mut self,
        device: &Device,
        queue: &Queue,
        frame: &FrameUniform,
        shapes: &[Shape],
    ) {
        for draw in self.draws.drain(..) {
            draw.destroy();
        }

        queue.write_buffer(&self.frame_buffer, 0, bytemuck::cast_slice(&[*frame]));

        for shape in shapes.iter().filter(|shape| !shape.mesh.is_empty()) {
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(shape.label),
                contents: bytemuck::cast_slice(&shape.mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

            let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Material Buffer"),
                contents: bytemuck::cast_slice(&[MaterialUniform::from(&shape.material)]),
                usage: wgpu::BufferUsages::UNIFORM,
            });

            let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.material_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: material_buffer.as_entire_binding(),
                }],
                label: Some("Material Bind Group"),
            });

            self.draws.push(Draw {
                label: shape.label,
                key: (shape.mesh.topology, shape.cull),
                vertex_buffer,
                vertex_count: shape.mesh.len() as u32,
                material_buffer,
                material_bind_group,
            });
        }

        if log::log_enabled!(log::Level::Trace) {
            let triangles: usize = shapes.iter().map(|shape| shape.mesh.triangles().count()).sum();
            log::trace!(
                "frame prepared: {} shapes, {} vertices, {} triangles",
                self.draws.len(),
                self.draws.iter().map(|draw| draw.vertex_count).sum::<u32>(),
                triangles
            );
        }
    }

    /// Draws the backdrop and then every shape of the frame within the bounds.
    pub(crate) fn render(&self, encoder: &mut CommandEncoder, target: &TextureView) {
        if self.bounds.width < 1.0 || self.bounds.height < 1.0 {
            return;
        }

        // First pass: backdrop over the widget bounds only
        {
            let mut background_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Background Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load, // Keep the rest of the UI
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.set_viewport(&mut background_pass);
            background_pass.set_pipeline(&self.background_pipeline);
            background_pass.set_vertex_buffer(0, self.background_vertex_buffer.slice(..));
            background_pass.set_index_buffer(
                self.background_index_buffer.slice(..),
                wgpu::IndexFormat::Uint16,
            );
            background_pass.draw_indexed(0..6, 0, 0..1);
        }

        // Second pass: the clock, one draw call per shape
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clock Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
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
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.set_viewport(&mut render_pass);
            render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
            render_pass.set_bind_group(2, &self.texture_bind_group, &[]);

            for draw in &self.draws {
                let Some(pipeline) = self.pipelines.get(&draw.key) else {
                    log::warn!("no pipeline for {} ({:?})", draw.label, draw.key);
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, &draw.material_bind_group, &[]);
                render_pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
                render_pass.draw(0..draw.vertex_count, 0..1);
            }
        }
    }

    fn set_viewport(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_viewport(
            self.bounds.x,
            self.bounds.y,
            self.bounds.width,
            self.bounds.height,
            0.0,
            1.0,
        );
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32, view_dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn create_depth_target(device: &Device, size: Size<u32>) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn create_mesh_pipeline(
    device: &Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: TextureFormat,
    (topology, cull): PipelineKey,
) -> wgpu::RenderPipeline {
    let label = format!("Clock Pipeline {topology:?}/{cull:?}");
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[Vertex::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: topology.into(),
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: match cull {
                Cull::Back => Some(wgpu::Face::Back),
                Cull::Front => Some(wgpu::Face::Front),
                Cull::None => None,
            },
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

fn write_layer(queue: &Queue, texture: &wgpu::Texture, layer: u32, image: &RgbaImage) {
    let (width, height) = image.dimensions();
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

fn upload_dial(device: &Device, queue: &Queue, dial: &RgbaImage) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Dial Texture"),
        size: wgpu::Extent3d {
            width: dial.width(),
            height: dial.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    write_layer(queue, &texture, 0, dial);
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn upload_environment(device: &Device, queue: &Queue) -> wgpu::TextureView {
    let faces = texture::environment_faces(ENVIRONMENT_SIZE);
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Environment Cube Map"),
        size: wgpu::Extent3d {
            width: ENVIRONMENT_SIZE,
            height: ENVIRONMENT_SIZE,
            depth_or_array_layers: faces.len() as u32,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    for (layer, face) in faces.iter().enumerate() {
        write_layer(queue, &texture, layer as u32, face);
    }
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("Environment View"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    })
}
