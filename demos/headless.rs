//! Headless end-to-end run of the pixelizer effect
//!
//! Renders a cube target into the capture buffer for a second of simulated
//! frames, draws the voxel point cloud into an offscreen "main view",
//! explodes the voxels into the CPU particle system, and steps the burst
//! for another second.
//!
//! Run with: `cargo run --example headless`

use anyhow::Result;
use cgmath::{InnerSpace, Vector3};
use pixelizer::prelude::*;

const FRAME_DT: f32 = 1.0 / 60.0;

fn main() -> Result<()> {
    env_logger::init();

    let context = GpuContext::new()?;

    let mut target = Target::new(Vector3::new(0.0, 0.0, 0.0));
    let cube = GpuMesh::new(&context.device, &generate_cube(0.6), "Demo Cube");
    target.add_part(
        RenderPart::new("body", Some(cube))
            .skinned()
            .with_tint([0.9, 0.45, 0.2, 1.0]),
    );

    let config = PixelizerConfig::default()
        .with_texture_size(32)
        .with_voxel_size(0.1)
        .with_voxel_force(6.0)
        .with_voxel_torque(3.0);

    let mut pixelizer = Pixelizer::new(
        &context,
        config,
        target,
        Box::new(SimpleRig::new()),
        CpuParticleSystem::new(),
    );

    // Offscreen stand-in for the host's main view.
    let frame = context.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Demo Frame"),
        size: wgpu::Extent3d {
            width: 512,
            height: 512,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let frame_view = frame.create_view(&wgpu::TextureViewDescriptor::default());

    let viewpoint = Viewpoint::perspective(
        Vector3::new(0.0, 1.4, -4.0),
        Vector3::new(0.0, 0.8, 0.0),
        1.0,
    );

    pixelizer.pixelate();
    println!("state after pixelate: {:?}", pixelizer.state());

    for _ in 0..60 {
        pixelizer.tick(FRAME_DT, &viewpoint)?;

        let mut encoder =
            context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Demo Frame Encoder"),
                });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Demo Main Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pixelizer.draw(&mut pass);
        }
        context.queue.submit(std::iter::once(encoder.finish()));
    }

    let emitted = pixelizer.explode()?;
    println!("explosion emitted {emitted} voxel particles");

    for _ in 0..60 {
        pixelizer.particles_mut().update(FRAME_DT);
    }

    let mean_speed = {
        let particles = pixelizer.particles().particles();
        let total: f32 = particles.iter().map(|p| p.velocity.magnitude()).sum();
        total / particles.len().max(1) as f32
    };
    println!("mean particle speed after 1s: {mean_speed:.2}");

    pixelizer.restore();
    pixelizer.shutdown();

    Ok(())
}
