//! Offscreen capture of the target into the pixel buffer
//!
//! Owns the small point-filtered render target and a recorded draw sequence
//! over the target's renderable parts. Every frame the sequence is replayed:
//! clear to transparent, then draw each part with the override material.
//! The capture runs unconditionally while pixelated, independent of whether
//! the main view can see the target.
//!
//! The capture surface is also the explosion's data source: `read_pixels`
//! performs the one blocking GPU→CPU readback in the system.

use cgmath::Matrix4;

use crate::error::{PixelizerError, Result};
use crate::gfx::mesh::Vertex3D;
use crate::gfx::resources::TextureResource;
use crate::host::scene::Target;
use crate::wgpu_utils::uniform_buffer::UniformBuffer;
use crate::wgpu_utils::{binding_types, OPENGL_TO_WGPU_MATRIX};

/// Orthographic view-projection framing the voxel grid
///
/// The capture camera lives in the point-cloud renderer's local frame:
/// x spans the centered grid width, y spans upward from the base. A pure
/// function of its inputs, so replaying the draw sequence with unchanged
/// state writes identical uniforms and produces identical buffers.
pub fn capture_view_proj(
    resolution: u32,
    world_to_object: &Matrix4<f32>,
    spacing: f32,
) -> Matrix4<f32> {
    let half = resolution as f32 * 0.5 * spacing;
    let height = resolution as f32 * spacing;
    OPENGL_TO_WGPU_MATRIX * cgmath::ortho(-half, half, 0.0, height, -height, height)
        * world_to_object
}

/// Per-part uniforms for the override material
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CaptureUniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    tint: [f32; 4],
}

/// One recorded draw: which part, with its own uniform slot
///
/// The per-part uniform buffer is the property-block equivalent: tint and
/// model matrix are written here immediately before the draw, never into
/// any shared material state.
struct CaptureItem {
    part_index: usize,
    uniforms: UniformBuffer<CaptureUniforms>,
    bind_group: wgpu::BindGroup,
}

/// The reusable clear-and-draw sequence replayed once per frame
struct CaptureSequence {
    items: Vec<CaptureItem>,
}

/// Offscreen capture pass for one target
pub struct OffscreenCapture {
    resolution: u32,
    color: Option<TextureResource>,
    depth: Option<TextureResource>,
    pipeline: wgpu::RenderPipeline,
    sequence: Option<CaptureSequence>,
}

impl OffscreenCapture {
    /// Builds the capture surfaces and records the draw sequence
    ///
    /// Enumerates every renderable part of `target` once; a target with no
    /// drawable parts is valid and simply captures transparency.
    pub fn new(device: &wgpu::Device, resolution: u32, target: &Target) -> Self {
        let color = TextureResource::create_capture_target(device, resolution, "Pixelizer Capture");
        let depth =
            TextureResource::create_capture_depth(device, resolution, "Pixelizer Capture Depth");

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Capture Override Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/capture.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Capture Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: binding_types::uniform(),
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Capture Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Capture Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex3D::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TextureResource::CAPTURE_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: TextureResource::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let items: Vec<CaptureItem> = target
            .parts
            .iter()
            .enumerate()
            .filter(|(_, part)| part.mesh.is_some())
            .map(|(part_index, _)| {
                let uniforms = UniformBuffer::<CaptureUniforms>::new(device);
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Capture Part Bind Group"),
                    layout: &bind_group_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.binding_resource(),
                    }],
                });
                CaptureItem {
                    part_index,
                    uniforms,
                    bind_group,
                }
            })
            .collect();

        if items.is_empty() {
            log::warn!("pixelizer target has no drawable parts; capture will stay transparent");
        }

        Self {
            resolution,
            color: Some(color),
            depth: Some(depth),
            pipeline,
            sequence: Some(CaptureSequence { items }),
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Shader view of the capture surface, bound by the point pipeline
    pub fn texture_view(&self) -> Option<&wgpu::TextureView> {
        self.color.as_ref().map(|color| &color.view)
    }

    /// Orthographic view-projection framing the voxel grid
    pub fn view_proj(&self, world_to_object: &Matrix4<f32>, spacing: f32) -> Matrix4<f32> {
        capture_view_proj(self.resolution, world_to_object, spacing)
    }

    /// Replays the recorded sequence once: clear, then draw each part
    ///
    /// Two calls with no state change in between produce bit-identical
    /// buffers; the pass is a pure function of the sequence and uniforms.
    pub fn render_frame(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        view_proj: Matrix4<f32>,
        target: &Target,
    ) {
        let (Some(color), Some(depth)) = (self.color.as_ref(), self.depth.as_ref()) else {
            return;
        };
        let Some(sequence) = self.sequence.as_mut() else {
            return;
        };

        let model = target.model_matrix();
        for item in &mut sequence.items {
            let part = &target.parts[item.part_index];
            item.uniforms.update_content(
                queue,
                CaptureUniforms {
                    view_proj: view_proj.into(),
                    model: model.into(),
                    tint: part.tint,
                },
            );
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Pixelizer Capture Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &color.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        for item in &sequence.items {
            let Some(mesh) = target.parts[item.part_index].mesh.as_ref() else {
                continue;
            };
            pass.set_bind_group(0, &item.bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.draw(0..mesh.vertex_count, 0..1);
        }
    }

    /// Blocking readback of all resolution² RGBA8 texels
    ///
    /// Rows are returned bottom-up so `pixels[(j * resolution + i) * 4]` is
    /// the texel at grid coordinate (i, j) with j growing upward, matching
    /// the voxel grid. This stalls the pipeline and is meant for the rare,
    /// user-triggered explosion, never for per-frame use.
    pub fn read_pixels(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<u8>> {
        let color = self
            .color
            .as_ref()
            .ok_or(PixelizerError::Released)?;

        let unpadded_bytes_per_row = self.resolution * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Readback Staging"),
            size: (padded_bytes_per_row * self.resolution) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Capture Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &color.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(self.resolution),
                },
            },
            wgpu::Extent3d {
                width: self.resolution,
                height: self.resolution,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        let _ = device.poll(wgpu::MaintainBase::Wait);

        match futures::executor::block_on(rx) {
            Ok(Ok(())) => {
                let mapped = slice.get_mapped_range();
                let resolution = self.resolution as usize;
                let mut pixels = vec![0u8; resolution * resolution * 4];
                for row in 0..resolution {
                    // Texture row 0 is the image top; flip so row 0 of the
                    // output is the grid's base.
                    let src = (resolution - 1 - row) * padded_bytes_per_row as usize;
                    let dst = row * resolution * 4;
                    pixels[dst..dst + resolution * 4]
                        .copy_from_slice(&mapped[src..src + resolution * 4]);
                }
                drop(mapped);
                staging.unmap();
                Ok(pixels)
            }
            Ok(Err(error)) => Err(PixelizerError::Readback(error.to_string())),
            Err(_) => Err(PixelizerError::Readback("map callback dropped".into())),
        }
    }

    /// Drops the recorded draw sequence and its per-part uniform buffers
    ///
    /// First step of teardown, before the voxel buffer and the surfaces.
    pub fn release_sequence(&mut self) {
        if let Some(sequence) = self.sequence.take() {
            for item in &sequence.items {
                item.uniforms.buffer().destroy();
            }
            log::debug!("capture sequence released ({} items)", sequence.items.len());
        }
    }

    /// Destroys the capture surfaces; last step of teardown
    pub fn release_surfaces(&mut self) {
        if let Some(color) = self.color.take() {
            color.texture.destroy();
        }
        if let Some(depth) = self.depth.take() {
            depth.texture.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, Vector3, Vector4};

    #[test]
    fn view_proj_is_a_pure_function_of_its_inputs() {
        let world_to_object = Matrix4::from_translation(Vector3::new(2.0, 0.0, -1.0));
        let a = capture_view_proj(32, &world_to_object, 0.1);
        let b = capture_view_proj(32, &world_to_object, 0.1);
        assert_eq!(a, b);
    }

    #[test]
    fn framing_maps_grid_extent_to_clip_corners() {
        let resolution = 8u32;
        let spacing = 0.5f32;
        let half = resolution as f32 * 0.5 * spacing;
        let height = resolution as f32 * spacing;
        let view_proj = capture_view_proj(resolution, &Matrix4::identity(), spacing);

        let bottom_left = view_proj * Vector4::new(-half, 0.0, 0.0, 1.0);
        let top_right = view_proj * Vector4::new(half, height, 0.0, 1.0);

        assert!((bottom_left.x + 1.0).abs() < 1e-6);
        assert!((bottom_left.y + 1.0).abs() < 1e-6);
        assert!((top_right.x - 1.0).abs() < 1e-6);
        assert!((top_right.y - 1.0).abs() < 1e-6);
        // Depth stays inside wgpu's [0, 1] clip range.
        assert!(bottom_left.z >= 0.0 && bottom_left.z <= 1.0);
    }

    #[test]
    fn per_part_uniforms_are_pure_over_target_state() {
        // The sequence replay writes uniforms through a skip-when-unchanged
        // path; identical inputs must produce byte-identical content so two
        // frames with no state change render bit-identical buffers.
        let world_to_object = Matrix4::from_angle_y(cgmath::Deg(30.0));
        let model = Matrix4::from_translation(Vector3::new(1.0, 0.0, 3.0));
        let tint = [0.9f32, 0.45, 0.2, 1.0];

        let build = || CaptureUniforms {
            view_proj: capture_view_proj(32, &world_to_object, 0.1).into(),
            model: model.into(),
            tint,
        };

        assert_eq!(bytemuck::bytes_of(&build()), bytemuck::bytes_of(&build()));
    }
}
