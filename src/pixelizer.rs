//! The pixelizer effect owner
//!
//! [`Pixelizer`] replaces an engine-managed component lifecycle with an
//! explicit owning object: construct it once, call [`Pixelizer::tick`] from
//! the externally owned frame loop, draw into the host's main pass, and
//! release everything with [`Pixelizer::shutdown`].
//!
//! The public command surface is three parameterless operations:
//! [`Pixelizer::pixelate`], [`Pixelizer::restore`], and
//! [`Pixelizer::explode`].

use std::sync::Arc;

use crate::effect::explosion::{ExplosionConfig, ExplosionEmitter};
use crate::effect::state::{PixelateStateMachine, RenderState};
use crate::error::{PixelizerError, Result};
use crate::gfx::capture::OffscreenCapture;
use crate::gfx::context::GpuContext;
use crate::gfx::point_cloud::{PointCloudRenderer, Viewpoint};
use crate::gfx::voxel_grid::VoxelGrid;
use crate::host::animation::AnimationRig;
use crate::host::particles::ParticleSink;
use crate::host::scene::Target;

/// Effect configuration with builder-style setters
#[derive(Debug, Clone, Copy)]
pub struct PixelizerConfig {
    /// Edge length of the capture buffer and voxel grid
    pub texture_size: u32,
    /// World-space size and spacing of one voxel
    pub voxel_size: f32,
    /// Launch velocity magnitude for exploded voxels
    pub voxel_force: f32,
    /// Initial angular velocity for exploded voxels
    pub voxel_torque: f32,
    /// Sampling stride over the pixel grid at explosion time (1..=5)
    pub explosion_reduction_rate: u32,
    /// Color format of the host pass the point cloud draws into
    pub output_format: wgpu::TextureFormat,
}

impl Default for PixelizerConfig {
    fn default() -> Self {
        Self {
            texture_size: 32,
            voxel_size: 0.1,
            voxel_force: 5.0,
            voxel_torque: 2.0,
            explosion_reduction_rate: 1,
            output_format: wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

impl PixelizerConfig {
    pub fn with_texture_size(mut self, texture_size: u32) -> Self {
        self.texture_size = texture_size;
        self
    }

    pub fn with_voxel_size(mut self, voxel_size: f32) -> Self {
        self.voxel_size = voxel_size;
        self
    }

    pub fn with_voxel_force(mut self, force: f32) -> Self {
        self.voxel_force = force;
        self
    }

    pub fn with_voxel_torque(mut self, torque: f32) -> Self {
        self.voxel_torque = torque;
        self
    }

    pub fn with_explosion_reduction_rate(mut self, rate: u32) -> Self {
        self.explosion_reduction_rate = rate.clamp(1, 5);
        self
    }

    pub fn with_output_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.output_format = format;
        self
    }
}

/// GPU resources owned by one effect instance
///
/// Created once at construction, never resized, released exactly once.
struct EffectResources {
    capture: OffscreenCapture,
    grid: VoxelGrid,
    point_cloud: PointCloudRenderer,
}

/// Tracks the one-shot teardown so a second shutdown is a safe no-op
#[derive(Debug, Default)]
struct ShutdownGuard {
    released: bool,
}

impl ShutdownGuard {
    /// Returns true exactly once
    fn begin(&mut self) -> bool {
        !std::mem::replace(&mut self.released, true)
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

/// Owner of the pixelization / voxel-explosion effect for one target
pub struct Pixelizer<S: ParticleSink> {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: PixelizerConfig,
    target: Target,
    rig: Box<dyn AnimationRig>,
    sink: S,
    state: PixelateStateMachine,
    emitter: ExplosionEmitter,
    gpu: Option<EffectResources>,
    guard: ShutdownGuard,
    time: f32,
}

impl<S: ParticleSink> Pixelizer<S> {
    /// Builds every GPU resource for the effect up front
    ///
    /// Voxel grid, capture surfaces, and the point pipeline are created
    /// here and never resized afterwards.
    pub fn new(
        context: &GpuContext,
        config: PixelizerConfig,
        target: Target,
        rig: Box<dyn AnimationRig>,
        sink: S,
    ) -> Self {
        let device = context.device.clone();
        let queue = context.queue.clone();

        let grid = VoxelGrid::new(&device, config.texture_size, config.voxel_size);
        let capture = OffscreenCapture::new(&device, config.texture_size, &target);
        let capture_view = capture
            .texture_view()
            .expect("capture surface exists until shutdown");
        let point_cloud =
            PointCloudRenderer::new(&device, &grid, capture_view, config.output_format);

        let emitter = ExplosionEmitter::new(ExplosionConfig::new(
            config.explosion_reduction_rate,
            config.voxel_force,
            config.voxel_torque,
        ));

        Self {
            device,
            queue,
            config,
            target,
            rig,
            sink,
            state: PixelateStateMachine::new(),
            emitter,
            gpu: Some(EffectResources {
                capture,
                grid,
                point_cloud,
            }),
            guard: ShutdownGuard::default(),
            time: 0.0,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state.state()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut Target {
        &mut self.target
    }

    pub fn particles(&self) -> &S {
        &self.sink
    }

    pub fn particles_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn is_released(&self) -> bool {
        self.guard.is_released()
    }

    /// Switches the target to pixelated rendering
    ///
    /// No-op when already pixelated.
    pub fn pixelate(&mut self) {
        self.state
            .pixelate(&mut self.target.parts, self.rig.as_mut(), self.time);
    }

    /// Returns the target to normal rendering
    pub fn restore(&mut self) {
        self.state.restore(&mut self.target.parts, self.rig.as_mut());
    }

    /// Advances the effect by one frame
    ///
    /// While pixelated and processing: re-orients the billboard toward the
    /// viewpoint, replays the capture sequence, and refreshes the point
    /// shader uniforms. Otherwise only advances the clock.
    pub fn tick(&mut self, delta_time: f32, viewpoint: &Viewpoint) -> Result<()> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Err(PixelizerError::Released);
        };

        self.time += delta_time;
        if !self.state.processing_enabled() {
            return Ok(());
        }

        let init_time = self.state.activated_at().unwrap_or(self.time);
        gpu.point_cloud.update(
            &self.queue,
            viewpoint,
            self.target.position,
            self.time,
            init_time,
        );

        let view_proj = gpu
            .capture
            .view_proj(&gpu.point_cloud.world_to_object(), self.config.voxel_size);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pixelizer Frame Encoder"),
            });
        gpu.capture
            .render_frame(&mut encoder, &self.queue, view_proj, &self.target);
        self.queue.submit(std::iter::once(encoder.finish()));

        Ok(())
    }

    /// Draws the point cloud into the host's render pass
    ///
    /// Draws nothing while not pixelated, after an explosion, or after
    /// shutdown.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(gpu) = self.gpu.as_ref() else {
            return;
        };
        if self.state.processing_enabled() {
            gpu.point_cloud.draw(pass);
        }
    }

    /// One-shot explosion of the current capture into particles
    ///
    /// Blocks on the GPU readback, emits one particle per surviving voxel,
    /// and stops per-frame point-cloud processing. The state machine stays
    /// Pixelated; call [`Pixelizer::restore`] to resume normal rendering.
    pub fn explode(&mut self) -> Result<usize> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Err(PixelizerError::Released);
        };
        if !self.state.is_pixelated() {
            log::debug!("explode requested while not pixelated");
        }

        let pixels = gpu.capture.read_pixels(&self.device, &self.queue)?;
        let transform = gpu.point_cloud.transform();
        let mut rng = rand::rng();
        let count = self.emitter.explode(
            &pixels,
            self.config.texture_size,
            self.config.voxel_size,
            &transform,
            gpu.point_cloud.origin(),
            gpu.point_cloud.forward(),
            &mut self.sink,
            &mut rng,
        );

        self.state.stop_processing();
        Ok(count)
    }

    /// Releases every GPU resource exactly once
    ///
    /// Ordering: capture draw sequence, then voxel buffer, then capture
    /// surfaces. A second call is a safe, logged no-op.
    pub fn shutdown(&mut self) {
        if !self.guard.begin() {
            log::debug!("pixelizer shutdown called twice; ignoring");
            return;
        }
        if let Some(mut gpu) = self.gpu.take() {
            gpu.capture.release_sequence();
            gpu.grid.release();
            gpu.capture.release_surfaces();
            log::info!("pixelizer GPU resources released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_guard_fires_exactly_once() {
        let mut guard = ShutdownGuard::default();
        assert!(!guard.is_released());
        assert!(guard.begin());
        assert!(guard.is_released());
        assert!(!guard.begin());
        assert!(!guard.begin());
    }

    #[test]
    fn default_config_matches_effect_defaults() {
        let config = PixelizerConfig::default();
        assert_eq!(config.texture_size, 32);
        assert_eq!(config.explosion_reduction_rate, 1);
    }

    #[test]
    fn reduction_rate_is_clamped_to_valid_range() {
        let config = PixelizerConfig::default().with_explosion_reduction_rate(9);
        assert_eq!(config.explosion_reduction_rate, 5);
        let config = PixelizerConfig::default().with_explosion_reduction_rate(0);
        assert_eq!(config.explosion_reduction_rate, 1);
    }
}
