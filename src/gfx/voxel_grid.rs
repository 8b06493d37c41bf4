//! Voxel grid generation and GPU upload
//!
//! The capture buffer is reinterpreted as a dense 2D grid of voxels: one
//! sample per texel, each carrying a local-space position and the UV it
//! samples its color from. The grid is a pure function of resolution and
//! spacing, generated once, uploaded once, and never mutated.

use cgmath::Vector3;

use crate::wgpu_utils::uniform_buffer::ArrayBuffer;

/// One voxel sample: local position plus the capture-buffer UV it reads
///
/// Laid out as 5 tightly packed floats so the point shader can index the
/// storage buffer as a flat float array.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VoxelSample {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Axis-aligned bounding box enclosing the generated voxel positions
///
/// Used as the bounding hint for the point-cloud draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    /// Creates a degenerate box at a single point
    pub fn at_point(point: Vector3<f32>) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Grows the box to enclose `point`
    pub fn encapsulate(&mut self, point: Vector3<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// Whether `point` lies inside the box (inclusive)
    pub fn contains(&self, point: Vector3<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }
}

/// Generates the voxel samples and their bounding volume
///
/// For row `i`, column `j` in `[0, resolution)`:
/// position = ((i − resolution/2)·spacing, j·spacing, 0),
/// uv = (i/resolution, j/resolution). Deterministic and pure.
pub fn build_samples(resolution: u32, spacing: f32) -> (Vec<VoxelSample>, Aabb) {
    let half = resolution as f32 / 2.0;
    let mut samples = Vec::with_capacity((resolution * resolution) as usize);
    let mut bounds = Aabb::at_point(Vector3::new(0.0, 0.0, 0.0));

    for i in 0..resolution {
        for j in 0..resolution {
            let position = Vector3::new((i as f32 - half) * spacing, j as f32 * spacing, 0.0);
            bounds.encapsulate(position);
            samples.push(VoxelSample {
                position: position.into(),
                uv: [
                    i as f32 / resolution as f32,
                    j as f32 / resolution as f32,
                ],
            });
        }
    }

    (samples, bounds)
}

/// GPU-resident voxel grid
///
/// Owns the read-only storage buffer the point shader sources per-point
/// attributes from. Released exactly once at teardown.
pub struct VoxelGrid {
    buffer: ArrayBuffer<VoxelSample>,
    bounds: Aabb,
    resolution: u32,
    spacing: f32,
}

impl VoxelGrid {
    /// Builds the samples and uploads them once
    pub fn new(device: &wgpu::Device, resolution: u32, spacing: f32) -> Self {
        let (samples, bounds) = build_samples(resolution, spacing);
        let buffer = ArrayBuffer::new_with_data(device, &samples, true);
        log::debug!(
            "voxel grid: {} samples, spacing {}",
            samples.len(),
            spacing
        );

        Self {
            buffer,
            bounds,
            resolution,
            spacing,
        }
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.binding_resource()
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Number of voxels drawn per frame
    pub fn sample_count(&self) -> u32 {
        self.resolution * self.resolution
    }

    /// Explicitly frees the GPU buffer
    ///
    /// Called once during shutdown, after the capture sequence is dropped
    /// and before the capture surface is destroyed.
    pub fn release(&self) {
        self.buffer.buffer().destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_count_is_resolution_squared() {
        for resolution in [1u32, 4, 8, 32] {
            let (samples, _) = build_samples(resolution, 0.1);
            assert_eq!(samples.len(), (resolution * resolution) as usize);
        }
    }

    #[test]
    fn uv_matches_grid_coordinates_and_stays_in_unit_range() {
        let resolution = 8;
        let (samples, _) = build_samples(resolution, 0.25);
        for i in 0..resolution {
            for j in 0..resolution {
                let sample = &samples[(i * resolution + j) as usize];
                assert_eq!(sample.uv[0], i as f32 / resolution as f32);
                assert_eq!(sample.uv[1], j as f32 / resolution as f32);
                assert!(sample.uv[0] >= 0.0 && sample.uv[0] < 1.0);
                assert!(sample.uv[1] >= 0.0 && sample.uv[1] < 1.0);
            }
        }
    }

    #[test]
    fn positions_follow_centered_column_formula() {
        let (samples, _) = build_samples(4, 1.0);
        // i = 1, j = 1 with resolution 4: ((1 - 2) * 1, 1 * 1, 0)
        let sample = &samples[(1 * 4 + 1) as usize];
        assert_eq!(sample.position, [-1.0, 1.0, 0.0]);
    }

    #[test]
    fn bounds_enclose_every_position() {
        for (resolution, spacing) in [(4u32, 1.0f32), (16, 0.1), (32, 0.05)] {
            let (samples, bounds) = build_samples(resolution, spacing);
            for sample in &samples {
                assert!(
                    bounds.contains(Vector3::from(sample.position)),
                    "sample {:?} outside {:?}",
                    sample.position,
                    bounds
                );
            }
        }
    }

    #[test]
    fn grid_is_deterministic() {
        let (a, bounds_a) = build_samples(16, 0.1);
        let (b, bounds_b) = build_samples(16, 0.1);
        assert_eq!(a, b);
        assert_eq!(bounds_a, bounds_b);
    }
}
