//! Single-draw point-cloud rendering of the captured voxels
//!
//! Every frame while pixelated, the renderer re-orients itself to face the
//! main viewpoint (yaw only, never tilting), triggers the capture, and
//! issues one non-indexed draw covering all resolution² voxels. Per-point
//! position and UV come from the GPU-resident voxel buffer and color from
//! the captured texture, so capture resolution scales without any CPU-side
//! geometry rebuilding.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector3};

use crate::gfx::voxel_grid::{Aabb, VoxelGrid};
use crate::wgpu_utils::uniform_buffer::UniformBuffer;
use crate::wgpu_utils::{binding_types, OPENGL_TO_WGPU_MATRIX};

/// The main viewpoint the billboard faces
///
/// Passed explicitly into the frame tick; the effect never looks up a
/// global camera.
pub struct Viewpoint {
    pub position: Vector3<f32>,
    pub forward: Vector3<f32>,
    pub view: Matrix4<f32>,
    pub proj: Matrix4<f32>,
}

impl Viewpoint {
    /// Perspective viewpoint looking from `eye` toward `target`
    pub fn perspective(eye: Vector3<f32>, target: Vector3<f32>, aspect: f32) -> Self {
        let forward = (target - eye).normalize();
        let view = Matrix4::look_at_rh(
            Point3::from_vec(eye),
            Point3::from_vec(target),
            Vector3::unit_y(),
        );
        let proj =
            OPENGL_TO_WGPU_MATRIX * cgmath::perspective(cgmath::Deg(45.0), aspect, 0.1, 100.0);
        Self {
            position: eye,
            forward,
            view,
            proj,
        }
    }
}

/// Yaw-only billboard rotation facing along `forward`
///
/// Projects `forward` onto the horizontal plane and renormalizes; returns
/// `None` when the flattened vector is degenerate (viewpoint looking
/// straight up or down), in which case the caller keeps its previous
/// orientation. The rotation maps local +Z to the flattened forward with
/// world-up as the up vector, so the grid never tilts.
pub fn billboard_yaw(forward: Vector3<f32>) -> Option<Matrix4<f32>> {
    let flat = Vector3::new(forward.x, 0.0, forward.z);
    if flat.magnitude2() <= f32::EPSILON {
        return None;
    }
    let forward = flat.normalize();
    let up = Vector3::unit_y();
    let right = up.cross(forward).normalize();

    Some(Matrix4::from_cols(
        right.extend(0.0),
        up.extend(0.0),
        forward.extend(0.0),
        cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0),
    ))
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct PointUniforms {
    obj_world: [[f32; 4]; 4],
    world_obj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    voxel_size: f32,
    resolution: f32,
    time: f32,
    init_time: f32,
}

/// Draws the voxel grid as one point-cloud draw call
pub struct PointCloudRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniforms: UniformBuffer<PointUniforms>,
    rotation: Matrix4<f32>,
    transform: Matrix4<f32>,
    inverse: Matrix4<f32>,
    position: Vector3<f32>,
    forward: Vector3<f32>,
    bounds: Aabb,
    resolution: u32,
    voxel_size: f32,
    vertex_count: u32,
}

impl PointCloudRenderer {
    /// Builds the point pipeline and binds the voxel buffer and capture view
    pub fn new(
        device: &wgpu::Device,
        grid: &VoxelGrid,
        capture_view: &wgpu::TextureView,
        output_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Point Cloud Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/points.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Point Cloud Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: binding_types::uniform(),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: binding_types::storage_buffer_read_only(),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: binding_types::texture_2d(),
                    count: None,
                },
            ],
        });

        let uniforms = UniformBuffer::<PointUniforms>::new(device);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Point Cloud Bind Group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.binding_resource(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: grid.binding_resource(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(capture_view),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Point Cloud Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Point Cloud Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: output_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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
        });

        Self {
            pipeline,
            bind_group,
            uniforms,
            rotation: Matrix4::identity(),
            transform: Matrix4::identity(),
            inverse: Matrix4::identity(),
            position: Vector3::new(0.0, 0.0, 0.0),
            forward: Vector3::unit_z(),
            bounds: grid.bounds(),
            resolution: grid.resolution(),
            voxel_size: grid.spacing(),
            vertex_count: grid.sample_count() * 6,
        }
    }

    /// Current object-to-world transform of the billboarded grid
    pub fn transform(&self) -> Matrix4<f32> {
        self.transform
    }

    /// Current world-to-object transform
    pub fn world_to_object(&self) -> Matrix4<f32> {
        self.inverse
    }

    /// Emitter origin in world space
    pub fn origin(&self) -> Vector3<f32> {
        self.position
    }

    /// Billboarded forward axis in world space
    pub fn forward(&self) -> Vector3<f32> {
        self.forward
    }

    /// World-space bounding hint for the draw, from the voxel grid
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Re-orients toward the viewpoint and refreshes the shader uniforms
    pub fn update(
        &mut self,
        queue: &wgpu::Queue,
        viewpoint: &Viewpoint,
        target_position: Vector3<f32>,
        time: f32,
        init_time: f32,
    ) {
        // Degenerate flattened forward keeps the previous yaw.
        if let Some(rotation) = billboard_yaw(viewpoint.forward) {
            self.rotation = rotation;
            self.forward = rotation.z.truncate();
        }
        self.position = target_position;
        self.transform = Matrix4::from_translation(target_position) * self.rotation;
        self.inverse = self.transform.invert().unwrap_or_else(Matrix4::identity);

        self.uniforms.update_content(
            queue,
            PointUniforms {
                obj_world: self.transform.into(),
                world_obj: self.inverse.into(),
                view: viewpoint.view.into(),
                proj: viewpoint.proj.into(),
                voxel_size: self.voxel_size,
                resolution: self.resolution as f32,
                time,
                init_time,
            },
        );
    }

    /// Issues the single non-indexed draw covering all voxels
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..self.vertex_count, 0..1);
    }

    /// Debug-visualization hook: world-space grid line segments
    ///
    /// Cosmetic overlay data matching the voxel grid's footprint; not part
    /// of the rendering contract.
    pub fn grid_lines(&self) -> Vec<(Vector3<f32>, Vector3<f32>)> {
        let right = self.transform.x.truncate();
        let up = Vector3::unit_y();
        let half = self.resolution as f32 * 0.5;
        let size = self.voxel_size;
        let mut lines = Vec::with_capacity((self.resolution as usize + 1) * 2);

        for i in 0..=self.resolution {
            let i = i as f32;
            lines.push((
                self.position + right * (-half * size) + up * i * size,
                self.position + right * (half * size) + up * i * size,
            ));
            lines.push((
                self.position + right * (i - half) * size,
                self.position + right * (i - half) * size + up * self.resolution as f32 * size,
            ));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    fn rotate(matrix: &Matrix4<f32>, vector: Vector3<f32>) -> Vector3<f32> {
        (matrix * Vector4::new(vector.x, vector.y, vector.z, 0.0)).truncate()
    }

    #[test]
    fn billboard_flattens_and_renormalizes_forward() {
        let rotation = billboard_yaw(Vector3::new(0.0, -0.8, 0.6)).unwrap();
        let forward = rotate(&rotation, Vector3::unit_z());
        assert!((forward - Vector3::unit_z()).magnitude() < 1e-6);
    }

    #[test]
    fn billboard_never_tilts() {
        let rotation = billboard_yaw(Vector3::new(0.3, -0.9, 0.3)).unwrap();
        let up = rotate(&rotation, Vector3::unit_y());
        assert!((up - Vector3::unit_y()).magnitude() < 1e-6);
    }

    #[test]
    fn billboard_basis_is_orthonormal() {
        let rotation = billboard_yaw(Vector3::new(0.7, 0.2, -0.7)).unwrap();
        let right = rotate(&rotation, Vector3::unit_x());
        let up = rotate(&rotation, Vector3::unit_y());
        let forward = rotate(&rotation, Vector3::unit_z());
        assert!((right.magnitude() - 1.0).abs() < 1e-6);
        assert!(right.dot(up).abs() < 1e-6);
        assert!((right.cross(up) - forward).magnitude() < 1e-6);
    }

    #[test]
    fn vertical_forward_is_degenerate() {
        assert!(billboard_yaw(Vector3::new(0.0, 1.0, 0.0)).is_none());
        assert!(billboard_yaw(Vector3::new(0.0, -1.0, 0.0)).is_none());
    }
}
