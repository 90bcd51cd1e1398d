//! Offscreen targets and fullscreen passes.
//!
//! Sprites are drawn into a persistent accumulation texture so the
//! translucent fade rectangle leaves trails across frames. Glow is drawn into
//! a half resolution layer, blurred horizontally then vertically, and
//! composited into the accumulation texture. The present pass copies the
//! accumulation texture to the surface.

use bytemuck::{Pod, Zeroable};

use super::sprites::TARGET_FORMAT;

/// WGSL for the fullscreen passes.
pub const POST_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

// One triangle covering the screen; uv (0, 0) is the top-left texel.
@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    let x = f32((vertex_index << 1u) & 2u);
    let y = f32(vertex_index & 2u);
    var out: VertexOutput;
    out.clip_position = vec4<f32>(x * 2.0 - 1.0, 1.0 - y * 2.0, 0.0, 1.0);
    out.uv = vec2<f32>(x, y);
    return out;
}

struct BlurParams {
    direction: vec2<f32>,
    sigma: f32,
    radius: f32,
};

@group(0) @binding(0) var source: texture_2d<f32>;
@group(0) @binding(1) var source_sampler: sampler;
@group(0) @binding(2) var<uniform> params: BlurParams;

@fragment
fn fs_blur(in: VertexOutput) -> @location(0) vec4<f32> {
    let radius = i32(params.radius);
    let denom = 2.0 * params.sigma * params.sigma;
    var total = vec4<f32>(0.0);
    var weights = 0.0;
    for (var i = -radius; i <= radius; i = i + 1) {
        let offset = f32(i);
        let w = exp(-offset * offset / denom);
        total = total + w * textureSampleLevel(source, source_sampler, in.uv + params.direction * offset, 0.0);
        weights = weights + w;
    }
    return total / max(weights, 1e-6);
}

@fragment
fn fs_composite(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSampleLevel(source, source_sampler, in.uv, 0.0);
}

@fragment
fn fs_present(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSampleLevel(source, source_sampler, in.uv, 0.0);
    return vec4<f32>(color.rgb, 1.0);
}

fn srgb_to_linear(c: vec3<f32>) -> vec3<f32> {
    let low = c / 12.92;
    let high = pow((c + vec3<f32>(0.055)) / 1.055, vec3<f32>(2.4));
    return select(high, low, c <= vec3<f32>(0.04045));
}

// The surface re-encodes to sRGB on write; the accumulation texture already holds sRGB values.
@fragment
fn fs_present_srgb(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSampleLevel(source, source_sampler, in.uv, 0.0);
    return vec4<f32>(srgb_to_linear(color.rgb), 1.0);
}
"#;

/// Uniform block matching `BlurParams` in [`POST_SHADER`].
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BlurParams {
    pub direction: [f32; 2],
    pub sigma: f32,
    pub radius: f32,
}

/// Glow is blurred at this fraction of the canvas resolution.
pub const GLOW_DOWNSCALE: u32 = 2;

impl BlurParams {
    /// Blur of a canvas-space `blur` radius along one axis of a glow layer
    /// `texels` wide. Gaussian sigma is half the blur radius, measured in
    /// glow texels.
    pub fn new(blur: f32, horizontal: bool, texels: u32) -> Self {
        let sigma = (blur * 0.5 / GLOW_DOWNSCALE as f32).max(0.5);
        let step = 1.0 / texels.max(1) as f32;
        let direction = if horizontal { [step, 0.0] } else { [0.0, step] };
        Self {
            direction,
            sigma,
            radius: (sigma * 3.0).ceil(),
        }
    }
}

/// Size of the glow layer for a canvas of `width` by `height`.
pub fn glow_size(width: u32, height: u32) -> (u32, u32) {
    (
        width.div_ceil(GLOW_DOWNSCALE).max(1),
        height.div_ceil(GLOW_DOWNSCALE).max(1),
    )
}

struct Target {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Target {
    fn new(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    fn width(&self) -> u32 {
        self.texture.width()
    }

    fn height(&self) -> u32 {
        self.texture.height()
    }
}

/// Trail, glow and present resources for one surface.
pub struct PostProcess {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    blur: wgpu::RenderPipeline,
    composite: wgpu::RenderPipeline,
    present: wgpu::RenderPipeline,
    blur_h: wgpu::Buffer,
    blur_v: wgpu::Buffer,
    no_params: wgpu::Buffer,
    accum: Target,
    glow_a: Target,
    glow_b: Target,
    needs_clear: bool,
}

impl PostProcess {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Post Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Post Shader"),
            source: wgpu::ShaderSource::Wgsl(POST_SHADER.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Post Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let fullscreen = |entry: &str, format: wgpu::TextureFormat, blend: Option<wgpu::BlendState>| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(entry),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend,
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
        };

        let blur = fullscreen("fs_blur", TARGET_FORMAT, Some(wgpu::BlendState::REPLACE));
        let composite = fullscreen(
            "fs_composite",
            TARGET_FORMAT,
            Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
        );
        let present_entry = if surface_format.is_srgb() {
            "fs_present_srgb"
        } else {
            "fs_present"
        };
        let present = fullscreen(present_entry, surface_format, Some(wgpu::BlendState::REPLACE));

        let uniform = |label: &str| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: std::mem::size_of::<BlurParams>() as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };

        let (glow_w, glow_h) = glow_size(width, height);
        Self {
            blur_h: uniform("Blur Horizontal"),
            blur_v: uniform("Blur Vertical"),
            no_params: uniform("Post Params"),
            accum: Target::new(device, "Trail Target", width, height),
            glow_a: Target::new(device, "Glow Target A", glow_w, glow_h),
            glow_b: Target::new(device, "Glow Target B", glow_w, glow_h),
            layout,
            sampler,
            blur,
            composite,
            present,
            needs_clear: true,
        }
    }

    /// Reallocate every target. Trails restart from black.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if (width, height) == (self.accum.width(), self.accum.height()) {
            return;
        }
        let (glow_w, glow_h) = glow_size(width, height);
        self.accum = Target::new(device, "Trail Target", width, height);
        self.glow_a = Target::new(device, "Glow Target A", glow_w, glow_h);
        self.glow_b = Target::new(device, "Glow Target B", glow_w, glow_h);
        self.needs_clear = true;
    }

    pub fn accum_view(&self) -> &wgpu::TextureView {
        &self.accum.view
    }

    pub fn glow_view(&self) -> &wgpu::TextureView {
        &self.glow_a.view
    }

    /// Load op for the accumulation target: black once after (re)allocation,
    /// then whatever the previous frame left.
    pub fn accum_load(&mut self) -> wgpu::LoadOp<wgpu::Color> {
        if std::mem::take(&mut self.needs_clear) {
            wgpu::LoadOp::Clear(wgpu::Color::BLACK)
        } else {
            wgpu::LoadOp::Load
        }
    }

    /// Blur the glow layer in place with a canvas-space radius of `blur`.
    pub fn blur_glow(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        blur: f32,
    ) {
        let h = BlurParams::new(blur, true, self.glow_a.width());
        let v = BlurParams::new(blur, false, self.glow_a.height());
        queue.write_buffer(&self.blur_h, 0, bytemuck::bytes_of(&h));
        queue.write_buffer(&self.blur_v, 0, bytemuck::bytes_of(&v));

        let horizontal = self.bind_group(device, &self.glow_a.view, &self.blur_h);
        self.fullscreen_pass(encoder, "Glow Blur H", &self.glow_b.view, &self.blur, &horizontal);
        let vertical = self.bind_group(device, &self.glow_b.view, &self.blur_v);
        self.fullscreen_pass(encoder, "Glow Blur V", &self.glow_a.view, &self.blur, &vertical);
    }

    /// Blend the blurred glow layer over whatever `pass` has drawn so far.
    pub fn composite_glow(&self, device: &wgpu::Device, pass: &mut wgpu::RenderPass<'_>) {
        let group = self.bind_group(device, &self.glow_a.view, &self.no_params);
        pass.set_pipeline(&self.composite);
        pass.set_bind_group(0, &group, &[]);
        pass.draw(0..3, 0..1);
    }

    /// Copy the accumulation target to `surface`.
    pub fn present(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        surface: &wgpu::TextureView,
    ) {
        let group = self.bind_group(device, &self.accum.view, &self.no_params);
        self.fullscreen_pass(encoder, "Present Pass", surface, &self.present, &group);
    }

    fn bind_group(
        &self,
        device: &wgpu::Device,
        source: &wgpu::TextureView,
        params: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Post Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params.as_entire_binding(),
                },
            ],
        })
    }

    fn fullscreen_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        target: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        group: &wgpu::BindGroup,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, group, &[]);
        pass.draw(0..3, 0..1);
    }
}
