//! Vertex data and GPU mesh handles
//!
//! Renderable parts carry their geometry as a plain vertex-buffer handle;
//! the capture pass draws them with the override material regardless of
//! whatever material they use in the host's main pass.

use wgpu::util::DeviceExt;

/// A 3D vertex with position and normal data
///
/// `#[repr(C)]` guarantees a GPU-compatible memory layout.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    /// 3D position coordinates [x, y, z]
    pub position: [f32; 3],
    /// 3D normal vector [nx, ny, nz]
    pub normal: [f32; 3],
}

impl Vertex3D {
    /// Returns the vertex buffer layout for wgpu rendering
    ///
    /// - Attribute 0: Position (Float32x3) at shader location 0
    /// - Attribute 1: Normal (Float32x3) at shader location 1
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// An uploaded, non-indexed triangle mesh
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub vertex_count: u32,
}

impl GpuMesh {
    /// Uploads a vertex list once; the buffer is never mutated afterwards
    pub fn new(device: &wgpu::Device, vertices: &[Vertex3D], label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
        }
    }
}

/// Generates a non-indexed cube as a vertex list
///
/// Returns a cube spanning `-half..half` on X and Z and `0..2*half` on Y,
/// so it stands on the grid's base plane the way a character stands on the
/// ground. Each face has outward normals.
pub fn generate_cube(half: f32) -> Vec<Vertex3D> {
    // (face normal, four corners counter-clockwise)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        (
            [0.0, 0.0, 1.0],
            [
                [-half, 0.0, half],
                [half, 0.0, half],
                [half, 2.0 * half, half],
                [-half, 2.0 * half, half],
            ],
        ),
        (
            [0.0, 0.0, -1.0],
            [
                [half, 0.0, -half],
                [-half, 0.0, -half],
                [-half, 2.0 * half, -half],
                [half, 2.0 * half, -half],
            ],
        ),
        (
            [-1.0, 0.0, 0.0],
            [
                [-half, 0.0, -half],
                [-half, 0.0, half],
                [-half, 2.0 * half, half],
                [-half, 2.0 * half, -half],
            ],
        ),
        (
            [1.0, 0.0, 0.0],
            [
                [half, 0.0, half],
                [half, 0.0, -half],
                [half, 2.0 * half, -half],
                [half, 2.0 * half, half],
            ],
        ),
        (
            [0.0, 1.0, 0.0],
            [
                [-half, 2.0 * half, half],
                [half, 2.0 * half, half],
                [half, 2.0 * half, -half],
                [-half, 2.0 * half, -half],
            ],
        ),
        (
            [0.0, -1.0, 0.0],
            [
                [-half, 0.0, -half],
                [half, 0.0, -half],
                [half, 0.0, half],
                [-half, 0.0, half],
            ],
        ),
    ];

    let mut vertices = Vec::with_capacity(36);
    for (normal, corners) in faces {
        for index in [0usize, 1, 2, 2, 3, 0] {
            vertices.push(Vertex3D {
                position: corners[index],
                normal,
            });
        }
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_has_36_vertices() {
        let vertices = generate_cube(0.5);
        assert_eq!(vertices.len(), 36);
    }

    #[test]
    fn cube_stands_on_base_plane() {
        let vertices = generate_cube(0.5);
        let min_y = vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::INFINITY, f32::min);
        let max_y = vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(min_y, 0.0);
        assert_eq!(max_y, 1.0);
    }
}
