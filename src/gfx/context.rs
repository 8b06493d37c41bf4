//! Headless GPU context acquisition
//!
//! The pixelizer renders into its own offscreen targets, so no window
//! surface is required. The device and queue are shared via `Arc` with every
//! component that records work.

use std::sync::Arc;

use crate::error::{PixelizerError, Result};

/// Shared wgpu device and queue for the effect's GPU resources
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
}

impl GpuContext {
    /// Acquires an adapter and device without a window surface
    ///
    /// Blocks on the async wgpu acquisition; intended to be called once at
    /// startup by the owner of the frame loop.
    pub fn new() -> Result<Self> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| PixelizerError::AdapterUnavailable)?;

        log::info!("pixelizer adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Pixelizer Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
        })
    }
}
