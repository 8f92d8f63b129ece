//! WGPU-based frame renderer
//!
//! Draws scenes into an offscreen color target with a fixed per-frame protocol:
//! `begin_frame`, optional `clear`, any number of `render_scene` calls, then
//! `end_frame`. The color target can be read back at any time between frames.

use std::{path::Path, sync::Arc};

use thiserror::Error;

use super::capture::{self, CaptureError};
use crate::gfx::{
    camera::Camera,
    geometry::DrawStats,
    resources::{material::Material, texture_resource::TextureResource},
    scene::Scene,
};
use crate::wgpu_utils::uniform_buffer::DynamicUniformBuffer;

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("render target size {width}x{height} is outside 1..={max}")]
    InvalidSize { width: u32, height: u32, max: u32 },
}

fn check_target_size(width: u32, height: u32, max: u32) -> Result<(), GpuError> {
    if width == 0 || height == 0 || width > max || height > max {
        return Err(GpuError::InvalidSize { width, height, max });
    }
    Ok(())
}

/// Configuration for creating a [`Renderer`]
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub width: u32,
    pub height: u32,
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    pub label: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::default(),
            label: "Renderer".to_string(),
        }
    }
}

impl RendererConfig {
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_backends(mut self, backends: wgpu::Backends) -> Self {
        self.backends = backends;
        self
    }

    pub fn with_power_preference(mut self, power_preference: wgpu::PowerPreference) -> Self {
        self.power_preference = power_preference;
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }
}

/// State of the frame between `begin_frame` and `end_frame`
#[derive(Debug, Default)]
struct FrameState {
    pending_clear: Option<wgpu::Color>,
    stats: DrawStats,
}

/// Offscreen renderer owning the GPU device and the frame's attachments
pub struct Renderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: RendererConfig,
    color_target: TextureResource,
    depth_texture: TextureResource,
    uniforms: DynamicUniformBuffer,
    frame: Option<FrameState>,
    last_frame_stats: DrawStats,
}

impl Renderer {
    pub const DEFAULT_CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

    /// Creates a renderer, blocking until the GPU device is ready
    pub fn new(config: RendererConfig) -> Result<Self, GpuError> {
        pollster::block_on(Self::new_async(config))
    }

    pub async fn new_async(config: RendererConfig) -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: config.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        let max_dimension = adapter.limits().max_texture_dimension_2d;
        check_target_size(config.width, config.height, max_dimension)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some(&format!("{} Device", config.label)),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: max_dimension,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let info = adapter.get_info();
        log::info!(
            "Using adapter '{}' ({:?}), target {}x{}",
            info.name,
            info.backend,
            config.width,
            config.height
        );

        let color_target = TextureResource::create_render_target(
            &device,
            config.width,
            config.height,
            "color_target",
        );
        let depth_texture = TextureResource::create_depth_texture(
            &device,
            config.width,
            config.height,
            "depth_texture",
        );
        let uniforms = DynamicUniformBuffer::new(&device, &config.label);

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            config,
            color_target,
            depth_texture,
            uniforms,
            frame: None,
            last_frame_stats: DrawStats::default(),
        })
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Returns reference to the wgpu device
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// Returns reference to the wgpu queue
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    pub fn color_format(&self) -> wgpu::TextureFormat {
        TextureResource::COLOR_FORMAT
    }

    pub fn depth_format(&self) -> wgpu::TextureFormat {
        TextureResource::DEPTH_FORMAT
    }

    /// Creates an invalid material whose pipelines target this renderer
    pub fn create_material(&self) -> Material {
        Material::new(self.device.clone(), self.color_format(), self.depth_format())
    }

    /// Recreates the color and depth targets at a new size
    ///
    /// Zero sizes and calls inside a frame are ignored. Sizes above the
    /// device's texture limit are rejected and the current targets kept.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), GpuError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        if self.frame.is_some() {
            log::warn!("resize() called inside a frame; ignoring");
            return Ok(());
        }
        check_target_size(width, height, self.device.limits().max_texture_dimension_2d)?;

        self.config.width = width;
        self.config.height = height;
        self.color_target =
            TextureResource::create_render_target(&self.device, width, height, "color_target");
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, width, height, "depth_texture");
        Ok(())
    }

    pub fn is_in_frame(&self) -> bool {
        self.frame.is_some()
    }

    /// Starts a frame. The viewport of every pass covers the whole target.
    pub fn begin_frame(&mut self) {
        if self.frame.is_some() {
            log::warn!("begin_frame() called twice; previous frame state discarded");
        }
        self.frame = Some(FrameState::default());
    }

    /// Clears color to `color` and depth to 1.0
    ///
    /// The clear becomes the load operation of the next recorded pass.
    pub fn clear(&mut self, color: wgpu::Color) {
        match self.frame.as_mut() {
            Some(frame) => frame.pending_clear = Some(color),
            None => log::warn!("clear() called outside a frame; ignoring"),
        }
    }

    /// Draws every object of `scene` in insertion order
    ///
    /// Objects without a mesh or material are skipped, as are objects whose
    /// material is invalid. The recorded pass is submitted before returning,
    /// together with the uniform snapshots it reads.
    pub fn render_scene(&mut self, scene: &Scene, camera: &Camera) {
        let Some(frame) = self.frame.as_mut() else {
            log::warn!("render_scene() called outside a frame; ignoring");
            return;
        };

        let view_proj = camera.view_projection_matrix();

        // Every drawn object takes one uniform slot
        let required: u64 = scene
            .objects()
            .iter()
            .filter(|obj| obj.mesh.is_some())
            .filter_map(|obj| obj.material.as_ref())
            .filter_map(|material| {
                material
                    .borrow()
                    .uniform_layout()
                    .map(|layout| self.uniforms.slot_size(layout.size as u64))
            })
            .sum();
        self.uniforms.reserve(&self.device, required);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });

        {
            let (color_load, depth_load) = match frame.pending_clear.take() {
                Some(color) => (wgpu::LoadOp::Clear(color), wgpu::LoadOp::Clear(1.0)),
                None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_viewport(
                0.0,
                0.0,
                self.config.width as f32,
                self.config.height as f32,
                0.0,
                1.0,
            );

            for (index, object) in scene.objects().iter().enumerate() {
                let (Some(mesh), Some(material)) = (&object.mesh, &object.material) else {
                    continue;
                };

                let mut material = material.borrow_mut();
                if !material.is_valid() {
                    log::warn!(
                        "Skipping object {}: material '{}' is not valid",
                        index,
                        material.label()
                    );
                    continue;
                }

                material.use_program();
                material.set_uniform("model", object.transform);
                material.set_uniform("viewProj", view_proj);
                material.set_uniform("color", object.color);

                if let Some(pipeline) = material.pipeline() {
                    render_pass.set_pipeline(pipeline);
                }

                if let Some(block_size) = material.uniform_layout().map(|l| l.size as u64) {
                    let offset = self.uniforms.push(material.uniform_data());
                    let generation = self.uniforms.generation();
                    match material.uniform_bind_group(self.uniforms.buffer(), block_size, generation) {
                        Some(bind_group) => render_pass.set_bind_group(0, bind_group, &[offset]),
                        None => {
                            material.unuse_program();
                            continue;
                        }
                    }
                }

                match mesh.borrow_mut().render(&self.device, &mut render_pass) {
                    Ok(stats) => frame.stats += stats,
                    Err(e) => log::warn!("Skipping object {}: {}", index, e),
                }

                material.unuse_program();
            }
        }

        self.uniforms.flush(&self.queue);
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Finishes the frame, flushing a clear no pass consumed yet
    pub fn end_frame(&mut self) {
        let Some(mut frame) = self.frame.take() else {
            log::warn!("end_frame() called outside a frame; ignoring");
            return;
        };

        if let Some(color) = frame.pending_clear.take() {
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Clear Encoder"),
                });
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.queue.submit(std::iter::once(encoder.finish()));
        }

        self.last_frame_stats = frame.stats;
    }

    /// Blocks until every submitted command has finished on the GPU
    pub fn wait_idle(&self) {
        if let Err(e) = self.device.poll(wgpu::PollType::Wait) {
            log::warn!("Waiting for the GPU failed: {}", e);
        }
    }

    /// Draw statistics of the last completed frame
    pub fn frame_stats(&self) -> DrawStats {
        self.last_frame_stats
    }

    /// Reads the color target back as tightly packed RGBA8, rows top-down
    pub fn capture_framebuffer(&self) -> Result<Vec<u8>, CaptureError> {
        capture::read_texture_rgba(&self.device, &self.queue, &self.color_target.texture)
    }

    /// Captures the color target and writes it as a PNG file
    pub fn save_framebuffer_to_file(&self, path: impl AsRef<Path>) -> Result<(), CaptureError> {
        let pixels = self.capture_framebuffer()?;
        capture::save_png(path, pixels, self.config.width, self.config.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_overrides_defaults() {
        let config = RendererConfig::default()
            .with_size(320, 240)
            .with_backends(wgpu::Backends::VULKAN)
            .with_label("Test");

        assert_eq!((config.width, config.height), (320, 240));
        assert_eq!(config.backends, wgpu::Backends::VULKAN);
        assert_eq!(config.label, "Test");
        assert_eq!(config.power_preference, wgpu::PowerPreference::default());
    }

    #[test]
    fn default_config_is_720p() {
        let config = RendererConfig::default();
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.backends, wgpu::Backends::all());
    }

    #[test]
    fn target_size_must_fit_device_limit() {
        assert!(check_target_size(1, 1, 16).is_ok());
        assert!(check_target_size(16, 16, 16).is_ok());
        assert!(matches!(
            check_target_size(17, 4, 16),
            Err(GpuError::InvalidSize { width: 17, height: 4, max: 16 })
        ));
        assert!(check_target_size(4, 0, 16).is_err());
    }
}
