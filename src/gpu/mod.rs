//! Window rendering through wgpu.
//!
//! A frame is recorded into a [`SpriteBatch`] on the CPU, uploaded as one
//! instance buffer and drawn in at most four passes: glow, two blur passes
//! and the trail target, followed by the copy to the surface.

mod batch;
mod post;
mod sprites;

use std::sync::Arc;

use winit::window::Window;

pub use batch::{atlas_lod, SpriteBatch, SpriteInstance, SpriteShape};
pub use post::{glow_size, BlurParams, PostProcess, GLOW_DOWNSCALE, POST_SHADER};
pub use sprites::{SpritePipelines, ViewUniform, SPRITE_SHADER, TARGET_FORMAT};

use crate::error::GpuError;
use crate::render::GlyphAtlas;

/// Surface, device and sprite pipelines for one window.
pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    sprites: SpritePipelines,
    post: PostProcess,
}

impl GpuState {
    pub async fn new(window: Arc<Window>, atlas: &GlyphAtlas) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let info = adapter.get_info();
        log::info!("using {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let sprites = SpritePipelines::new(&device, &queue, atlas);
        let post = PostProcess::new(&device, surface_format, config.width, config.height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            sprites,
            post,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.post
                .resize(&self.device, new_size.width, new_size.height);
        }
    }

    /// Reconfigure the surface at its current size after it was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Draw one recorded frame and present it.
    pub fn render(&mut self, batch: &SpriteBatch) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let canvas = (self.config.width as f32, self.config.height as f32);
        self.sprites
            .upload(&self.device, &self.queue, batch.instances(), canvas);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let glow = batch.glow_blur();
        if glow > 0.0 {
            {
                let mut pass = begin_pass(
                    &mut encoder,
                    "Glow Pass",
                    self.post.glow_view(),
                    wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                );
                self.sprites.draw_glow(&mut pass, batch.from_glow());
            }
            self.post
                .blur_glow(&self.device, &self.queue, &mut encoder, glow);
        }

        let load = self.post.accum_load();
        {
            let mut pass = begin_pass(&mut encoder, "Sprite Pass", self.post.accum_view(), load);
            self.sprites.draw_fill(&mut pass, batch.before_glow());
            if glow > 0.0 {
                self.post.composite_glow(&self.device, &mut pass);
            }
            self.sprites.draw_fill(&mut pass, batch.from_glow());
        }

        self.post.present(&self.device, &mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    label: &str,
    target: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            depth_slice: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}
