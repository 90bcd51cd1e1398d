//! Instanced sprite pipelines.
//!
//! Each [`SpriteInstance`] expands to a quad in the vertex shader. The
//! fragment shader turns the quad into a circle, rectangle or rotated ellipse
//! through a signed distance with a one pixel antialiased edge, or samples
//! the glyph atlas. `fs_glow` draws the same shapes as premultiplied glow tint
//! for the blur pass.

use bytemuck::{Pod, Zeroable};

use super::batch::SpriteInstance;
use crate::render::GlyphAtlas;

/// WGSL for the sprite passes.
pub const SPRITE_SHADER: &str = r#"
struct View {
    size: vec2<f32>,
    _pad: vec2<f32>,
};

@group(0) @binding(0) var<uniform> view: View;
@group(0) @binding(1) var atlas: texture_2d<f32>;
@group(0) @binding(2) var atlas_sampler: sampler;

struct Instance {
    @location(0) center: vec2<f32>,
    @location(1) half_size: vec2<f32>,
    @location(2) rotation: f32,
    @location(3) shape: u32,
    @location(4) lod: f32,
    @location(5) color: vec4<f32>,
    @location(6) glow: vec4<f32>,
    @location(7) uv: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local: vec2<f32>,
    @location(1) @interpolate(flat) half_size: vec2<f32>,
    @location(2) @interpolate(flat) shape: u32,
    @location(3) @interpolate(flat) lod: f32,
    @location(4) @interpolate(flat) color: vec4<f32>,
    @location(5) @interpolate(flat) glow: vec4<f32>,
    @location(6) @interpolate(flat) uv: vec4<f32>,
};

// Room for the antialiased edge around every shape.
const MARGIN: f32 = 2.0;
const GLOW_AA: f32 = 2.0;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, instance: Instance) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let local = corners[vertex_index] * (instance.half_size + vec2<f32>(MARGIN));
    let c = cos(instance.rotation);
    let s = sin(instance.rotation);
    let canvas = instance.center + vec2<f32>(local.x * c - local.y * s, local.x * s + local.y * c);

    var out: VertexOutput;
    out.clip_position = vec4<f32>(
        canvas.x / view.size.x * 2.0 - 1.0,
        1.0 - canvas.y / view.size.y * 2.0,
        0.0,
        1.0,
    );
    out.local = local;
    out.half_size = instance.half_size;
    out.shape = instance.shape;
    out.lod = instance.lod;
    out.color = instance.color;
    out.glow = instance.glow;
    out.uv = instance.uv;
    return out;
}

fn glyph_coverage(local: vec2<f32>, half_size: vec2<f32>, uv_rect: vec4<f32>, lod: f32) -> f32 {
    let t = (local + half_size) / max(half_size * 2.0, vec2<f32>(1e-6));
    let uv = mix(uv_rect.xy, uv_rect.zw, clamp(t, vec2<f32>(0.0), vec2<f32>(1.0)));
    let texel = textureSampleLevel(atlas, atlas_sampler, uv, lod).r;
    let inside = all(t >= vec2<f32>(0.0)) && all(t <= vec2<f32>(1.0));
    return select(0.0, texel, inside);
}

fn shape_distance(local: vec2<f32>, half_size: vec2<f32>, shape: u32) -> f32 {
    var d = 0.0;
    switch shape {
        case 0u: {
            d = length(local) - half_size.x;
        }
        case 1u: {
            let q = abs(local) - half_size;
            d = length(max(q, vec2<f32>(0.0))) + min(max(q.x, q.y), 0.0);
        }
        default: {
            let k0 = length(local / half_size);
            let k1 = length(local / (half_size * half_size));
            d = k0 * (k0 - 1.0) / max(k1, 1e-6);
        }
    }
    return d;
}

fn coverage(in: VertexOutput, aa: f32) -> f32 {
    if in.shape == 3u {
        return glyph_coverage(in.local, in.half_size, in.uv, in.lod);
    }
    return clamp(0.5 - shape_distance(in.local, in.half_size, in.shape) / aa, 0.0, 1.0);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color.rgb, in.color.a * coverage(in, 1.0));
}

@fragment
fn fs_glow(in: VertexOutput) -> @location(0) vec4<f32> {
    let a = in.glow.a * coverage(in, GLOW_AA);
    return vec4<f32>(in.glow.rgb * a, a);
}
"#;

/// Uniform block matching `View` in [`SPRITE_SHADER`].
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ViewUniform {
    pub size: [f32; 2],
    pub _pad: [f32; 2],
}

impl ViewUniform {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: [width.max(1.0), height.max(1.0)],
            _pad: [0.0; 2],
        }
    }
}

/// Format of the offscreen targets sprites are drawn into.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const INITIAL_CAPACITY: usize = 4096;

/// Pipelines, atlas texture and instance buffer for drawing sprites.
pub struct SpritePipelines {
    fill: wgpu::RenderPipeline,
    glow: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    view_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    capacity: usize,
    count: usize,
}

impl SpritePipelines {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, atlas: &GlyphAtlas) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let view_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sprite View Buffer"),
            size: std::mem::size_of::<ViewUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let atlas_view = upload_atlas(device, queue, atlas);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Atlas Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: view_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sprite Shader"),
            source: wgpu::ShaderSource::Wgsl(SPRITE_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sprite Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let fill = sprite_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "fs_main",
            wgpu::BlendState::ALPHA_BLENDING,
        );
        let glow = sprite_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "fs_glow",
            wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING,
        );

        Self {
            fill,
            glow,
            bind_group,
            view_buffer,
            instance_buffer: create_instance_buffer(device, INITIAL_CAPACITY),
            capacity: INITIAL_CAPACITY,
            count: 0,
        }
    }

    /// Upload this frame's instances and canvas size.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        instances: &[SpriteInstance],
        canvas: (f32, f32),
    ) {
        if instances.len() > self.capacity {
            self.capacity = instances.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(device, self.capacity);
            log::debug!("sprite buffer grown to {} instances", self.capacity);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
        self.count = instances.len();

        let view = ViewUniform::new(canvas.0, canvas.1);
        queue.write_buffer(&self.view_buffer, 0, bytemuck::bytes_of(&view));
    }

    /// Draw `range` of the uploaded instances with their fill color.
    pub fn draw_fill(&self, pass: &mut wgpu::RenderPass<'_>, range: std::ops::Range<u32>) {
        self.draw_with(pass, &self.fill, range);
    }

    /// Draw `range` of the uploaded instances as glow tint.
    pub fn draw_glow(&self, pass: &mut wgpu::RenderPass<'_>, range: std::ops::Range<u32>) {
        self.draw_with(pass, &self.glow, range);
    }

    fn draw_with(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        pipeline: &wgpu::RenderPipeline,
        range: std::ops::Range<u32>,
    ) {
        let range = range.start..range.end.min(self.count as u32);
        if range.is_empty() {
            return;
        }
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        pass.draw(0..6, range);
    }
}

fn sprite_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fragment: &str,
    blend: wgpu::BlendState,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(fragment),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[SpriteInstance::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment),
            targets: &[Some(wgpu::ColorTargetState {
                format: TARGET_FORMAT,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Instance Buffer"),
        size: (capacity * std::mem::size_of::<SpriteInstance>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Upload every mip level of the atlas into an R8 texture.
fn upload_atlas(device: &wgpu::Device, queue: &wgpu::Queue, atlas: &GlyphAtlas) -> wgpu::TextureView {
    let (width, height) = atlas.dimensions();
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Glyph Atlas"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: atlas.levels().len() as u32,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    for (level, pixels) in atlas.levels().iter().enumerate() {
        let level = level as u32;
        let (w, h) = ((width >> level).max(1), (height >> level).max(1));
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
        );
    }
    log::debug!("glyph atlas {width}x{height} with {} glyphs", atlas.len());

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(source: &str) -> naga::Module {
        let module = naga::front::wgsl::parse_str(source).expect("WGSL parses");
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        );
        validator.validate(&module).expect("WGSL validates");
        module
    }

    #[test]
    fn test_sprite_shader_validates() {
        let module = validate(SPRITE_SHADER);
        for name in ["vs_main", "fs_main", "fs_glow"] {
            assert!(module.entry_points.iter().any(|e| e.name == name), "{name}");
        }
    }

    #[test]
    fn test_shader_inputs_match_instance_layout() {
        let module = validate(SPRITE_SHADER);
        let vs = module
            .entry_points
            .iter()
            .find(|e| e.name == "vs_main")
            .unwrap();
        let naga::TypeInner::Struct { members, .. } =
            &module.types[vs.function.arguments[1].ty].inner
        else {
            panic!("instance input is a struct");
        };
        let locations: Vec<u32> = members
            .iter()
            .filter_map(|m| match m.binding {
                Some(naga::Binding::Location { location, .. }) => Some(location),
                _ => None,
            })
            .collect();
        let expected: Vec<u32> = SpriteInstance::layout()
            .attributes
            .iter()
            .map(|a| a.shader_location)
            .collect();
        assert_eq!(locations, expected);
    }

    #[test]
    fn test_view_uniform_is_sixteen_bytes() {
        assert_eq!(std::mem::size_of::<ViewUniform>(), 16);
        assert_eq!(ViewUniform::new(0.0, 10.0).size, [1.0, 10.0]);
    }
}
