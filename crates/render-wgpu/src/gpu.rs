use crate::shaders;
use bytemuck::{Pod, Zeroable};
use cubescene_common::{Color, EntityId};
use cubescene_scene::{EntityKind, LineVertex, Material, MeshVertex, PerspectiveCamera, Scene};
use std::collections::BTreeMap;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INITIAL_INSTANCE_CAPACITY: u32 = 16;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GpuMeshVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

impl From<&MeshVertex> for GpuMeshVertex {
    fn from(v: &MeshVertex) -> Self {
        Self {
            position: v.position,
            normal: v.normal,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GpuLineVertex {
    position: [f32; 3],
    color: [f32; 3],
}

impl From<&LineVertex> for GpuLineVertex {
    fn from(v: &LineVertex) -> Self {
        let c = Color::rgb(v.color[0], v.color[1], v.color[2]).to_linear();
        Self {
            position: v.position,
            color: [c.r, c.g, c.b],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
    params: [f32; 4],
}

const MATERIAL_BASIC: f32 = 0.0;
const MATERIAL_NORMAL: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topology {
    Triangles,
    Lines,
}

/// Vertex (and optional index) buffers for one entity.
struct GpuGeometry {
    topology: Topology,
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    count: u32,
}

impl GpuGeometry {
    fn upload(device: &wgpu::Device, kind: &EntityKind) -> Self {
        match kind {
            EntityKind::Mesh { geometry, .. } => {
                let mesh = geometry.mesh_data();
                let verts: Vec<GpuMeshVertex> = mesh.vertices.iter().map(Into::into).collect();
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_vertex_buffer"),
                    contents: bytemuck::cast_slice(&verts),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("mesh_index_buffer"),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                Self {
                    topology: Topology::Triangles,
                    vertex_buffer,
                    index_buffer: Some(index_buffer),
                    count: mesh.indices.len() as u32,
                }
            }
            EntityKind::Grid(grid) => Self::lines(device, &grid.lines()),
            EntityKind::Axes(axes) => Self::lines(device, &axes.lines()),
        }
    }

    fn lines(device: &wgpu::Device, lines: &[LineVertex]) -> Self {
        let verts: Vec<GpuLineVertex> = lines.iter().map(Into::into).collect();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("line_vertex_buffer"),
            contents: bytemuck::cast_slice(&verts),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            topology: Topology::Lines,
            vertex_buffer,
            index_buffer: None,
            count: verts.len() as u32,
        }
    }
}

fn instance_for(kind: &EntityKind, model: glam::Mat4) -> InstanceData {
    let cols = model.to_cols_array_2d();
    let (color, material) = match kind {
        EntityKind::Mesh {
            material: Material::Basic { color, .. },
            ..
        } => (color.to_linear().to_rgba(1.0), MATERIAL_BASIC),
        EntityKind::Mesh {
            material: Material::Normal,
            ..
        } => ([1.0; 4], MATERIAL_NORMAL),
        EntityKind::Grid(_) | EntityKind::Axes(_) => ([1.0; 4], MATERIAL_BASIC),
    };
    InstanceData {
        model_0: cols[0],
        model_1: cols[1],
        model_2: cols[2],
        model_3: cols[3],
        color,
        params: [material, 0.0, 0.0, 0.0],
    }
}

/// Faces to cull for an entity; single-sided meshes drop their back faces.
fn cull_mode_for(kind: &EntityKind) -> Option<wgpu::Face> {
    if kind.double_sided() {
        None
    } else {
        Some(wgpu::Face::Back)
    }
}

fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
    ];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<InstanceData>() as u64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &ATTRIBUTES,
    }
}

/// Pipelines, per-frame buffers and render targets for drawing a [`Scene`].
pub struct ScenePipelines {
    mesh_pipeline_culled: wgpu::RenderPipeline,
    mesh_pipeline_double: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u32,
    geometry: BTreeMap<EntityId, GpuGeometry>,
    depth_texture: wgpu::TextureView,
    msaa_texture: Option<wgpu::TextureView>,
    surface_format: wgpu::TextureFormat,
    sample_count: u32,
}

impl ScenePipelines {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
                view: glam::Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let color_target = [Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];
        let depth_stencil = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        };
        let multisample = wgpu::MultisampleState {
            count: sample_count,
            ..Default::default()
        };

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });

        let mesh_pipeline = |label: &str, cull_mode: Option<wgpu::Face>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &mesh_shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[
                        wgpu::VertexBufferLayout {
                            array_stride: std::mem::size_of::<GpuMeshVertex>() as u64,
                            step_mode: wgpu::VertexStepMode::Vertex,
                            attributes: &wgpu::vertex_attr_array![
                                0 => Float32x3,
                                1 => Float32x3,
                            ],
                        },
                        instance_layout(),
                    ],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &mesh_shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &color_target,
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode,
                    ..Default::default()
                },
                depth_stencil: Some(depth_stencil.clone()),
                multisample,
                multiview: None,
                cache: None,
            })
        };
        let mesh_pipeline_culled = mesh_pipeline("mesh_pipeline", Some(wgpu::Face::Back));
        let mesh_pipeline_double = mesh_pipeline("mesh_pipeline_double_sided", None);

        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::LINE_SHADER.into()),
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &line_shader,
                entry_point: Some("vs_line"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<GpuLineVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    instance_layout(),
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &line_shader,
                entry_point: Some("fs_line"),
                compilation_options: Default::default(),
                targets: &color_target,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil),
            multisample,
            multiview: None,
            cache: None,
        });

        let instance_buffer = Self::create_instance_buffer(device, INITIAL_INSTANCE_CAPACITY);

        Self {
            mesh_pipeline_culled,
            mesh_pipeline_double,
            line_pipeline,
            uniform_buffer,
            uniform_bind_group,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            geometry: BTreeMap::new(),
            depth_texture: Self::create_depth_texture(device, width, height, sample_count),
            msaa_texture: Self::create_msaa_texture(device, surface_format, width, height, sample_count),
            surface_format,
            sample_count,
        }
    }

    /// Recreate the size-dependent render targets.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height, self.sample_count);
        self.msaa_texture =
            Self::create_msaa_texture(device, self.surface_format, width, height, self.sample_count);
    }

    /// Draw one frame of `scene` into `target`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: camera.view_projection().to_cols_array_2d(),
                view: camera.view_matrix().to_cols_array_2d(),
            }),
        );

        // Geometry is immutable per entity: upload new ones, drop departed ones.
        self.geometry.retain(|id, _| scene.entities().contains_key(id));
        for (id, entity) in scene.entities() {
            self.geometry
                .entry(*id)
                .or_insert_with(|| GpuGeometry::upload(device, &entity.kind));
        }

        let instances: Vec<InstanceData> = scene
            .entities()
            .values()
            .map(|e| instance_for(&e.kind, e.transform.model_matrix()))
            .collect();
        self.ensure_instance_capacity(device, instances.len() as u32);
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let bg = scene.background().to_linear();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let (view, resolve_target) = match &self.msaa_texture {
                Some(msaa) => (msaa, Some(target)),
                None => (target, None),
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: bg.r as f64,
                            g: bg.g as f64,
                            b: bg.b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            for (slot, (id, entity)) in scene.entities().iter().enumerate() {
                let Some(geometry) = self.geometry.get(id) else {
                    continue;
                };
                let instance = slot as u32..slot as u32 + 1;
                let mesh_pipeline = match cull_mode_for(&entity.kind) {
                    Some(_) => &self.mesh_pipeline_culled,
                    None => &self.mesh_pipeline_double,
                };
                pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
                match (geometry.topology, &geometry.index_buffer) {
                    (Topology::Triangles, Some(indices)) => {
                        pass.set_pipeline(mesh_pipeline);
                        pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
                        pass.draw_indexed(0..geometry.count, 0, instance);
                    }
                    (Topology::Triangles, None) => {
                        pass.set_pipeline(mesh_pipeline);
                        pass.draw(0..geometry.count, instance);
                    }
                    (Topology::Lines, _) => {
                        pass.set_pipeline(&self.line_pipeline);
                        pass.draw(0..geometry.count, instance);
                    }
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn ensure_instance_capacity(&mut self, device: &wgpu::Device, needed: u32) {
        if needed <= self.instance_capacity {
            return;
        }
        let capacity = needed.next_power_of_two();
        tracing::debug!(capacity, "growing instance buffer");
        self.instance_buffer = Self::create_instance_buffer(device, capacity);
        self.instance_capacity = capacity;
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: capacity as u64 * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    fn create_msaa_texture(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Option<wgpu::TextureView> {
        if sample_count <= 1 {
            return None;
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa_color_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Some(texture.create_view(&Default::default()))
    }
}
