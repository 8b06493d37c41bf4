//! Texture resource management for the capture pipeline
//!
//! Bundles the texture and view needed for the offscreen capture target.
//! The capture surface is read texel-exact (`textureLoad` in the point
//! shader and the CPU readback), so each texel maps crisply onto one voxel
//! without any sampler in between, and it carries `COPY_SRC` so the
//! explosion path can read it back to the CPU.

/// GPU texture resource containing texture and view
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl TextureResource {
    /// Color format of the capture surface
    pub const CAPTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Depth format used while rendering the target into the capture surface
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates the square RGBA8 capture target
    ///
    /// The surface is `size × size`, never resized, and usable as a render
    /// attachment, a shader input, and a readback source.
    ///
    /// # Arguments
    /// * `device` - WGPU device for creating resources
    /// * `size` - Edge length in texels (the effect's texture size)
    /// * `label` - Debug label, visible in graphics debuggers
    pub fn create_capture_target(device: &wgpu::Device, size: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::CAPTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }

    /// Creates the depth buffer paired with the capture target
    pub fn create_capture_depth(device: &wgpu::Device, size: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[Self::DEPTH_FORMAT],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }
}
