//! Voxel explosion emission
//!
//! Converts the captured pixel grid into a burst of simulated particles:
//! texels with nonzero alpha become world-space voxels, each launched with a
//! radial velocity whose vertical component is overridden to a flat upward
//! force, plus independent random jitter along the emitter's forward axis.
//!
//! The planning core is pure over a CPU pixel array so it can be tested
//! without a GPU; the blocking readback lives in the capture module.

use cgmath::{InnerSpace, Matrix4, Vector3, Vector4};
use rand::Rng;

use crate::host::particles::{EmitDefaults, ParticleSink};

/// Tuning for the one-shot explosion
#[derive(Debug, Clone, Copy)]
pub struct ExplosionConfig {
    /// Sampling stride over the pixel grid in both axes; 1 keeps every texel
    pub reduction_rate: u32,
    /// Magnitude of the launch velocity
    pub force: f32,
    /// Initial angular velocity given to every particle
    pub torque: f32,
}

impl ExplosionConfig {
    pub fn new(reduction_rate: u32, force: f32, torque: f32) -> Self {
        Self {
            reduction_rate: reduction_rate.max(1),
            force,
            torque,
        }
    }
}

fn transform_point(transform: &Matrix4<f32>, point: Vector3<f32>) -> Vector3<f32> {
    (transform * Vector4::new(point.x, point.y, point.z, 1.0)).truncate()
}

/// Filters the pixel grid down to the voxels that survive the explosion
///
/// `pixels` is tightly packed RGBA8, indexed `(j * resolution + i) * 4`
/// with `j` growing upward, matching the capture readback convention. For
/// each sampled texel with alpha > 0 the local position
/// (−resolution/2·spacing + i·spacing, j·spacing, 0) is mapped through
/// `transform` to world space.
pub fn surviving_voxels(
    pixels: &[u8],
    resolution: u32,
    reduction_rate: u32,
    spacing: f32,
    transform: &Matrix4<f32>,
) -> (Vec<Vector3<f32>>, Vec<[f32; 4]>) {
    debug_assert_eq!(pixels.len(), (resolution * resolution * 4) as usize);

    let stride = reduction_rate.max(1) as usize;
    let half = resolution as f32 * 0.5;
    let mut positions = Vec::new();
    let mut colors = Vec::new();

    for i in (0..resolution as usize).step_by(stride) {
        for j in (0..resolution as usize).step_by(stride) {
            let offset = (j * resolution as usize + i) * 4;
            let alpha = pixels[offset + 3];
            if alpha == 0 {
                continue;
            }

            let local = Vector3::new(
                -half * spacing + i as f32 * spacing,
                j as f32 * spacing,
                0.0,
            );
            positions.push(transform_point(transform, local));
            colors.push([
                pixels[offset] as f32 / 255.0,
                pixels[offset + 1] as f32 / 255.0,
                pixels[offset + 2] as f32 / 255.0,
                alpha as f32 / 255.0,
            ]);
        }
    }

    (positions, colors)
}

/// Initial velocity for one voxel
///
/// Radial from the emitter origin scaled by `force`, with the vertical
/// component then overridden to a flat `+force` regardless of the radial
/// direction, plus `forward · random(−1, 1) · force` jitter. The flat
/// vertical gives every voxel the same upward kick so the burst reads as
/// one motion.
pub fn launch_velocity<R: Rng + ?Sized>(
    world: Vector3<f32>,
    origin: Vector3<f32>,
    forward: Vector3<f32>,
    force: f32,
    rng: &mut R,
) -> Vector3<f32> {
    let offset = world - origin;
    let mut velocity = if offset.magnitude2() > f32::EPSILON {
        offset.normalize() * force
    } else {
        Vector3::new(0.0, 0.0, 0.0)
    };
    velocity.y = force;
    velocity + forward * rng.random_range(-1.0f32..=1.0) * force
}

/// One-shot converter from captured pixels to launched particles
pub struct ExplosionEmitter {
    config: ExplosionConfig,
}

impl ExplosionEmitter {
    pub fn new(config: ExplosionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> ExplosionConfig {
        self.config
    }

    /// Plans and emits the explosion, returning the emitted particle count
    ///
    /// Capacity is resized before emission; the simulator may still clamp,
    /// in which case only the first surviving voxels are launched. A fully
    /// transparent capture emits nothing beyond the capacity reset.
    #[allow(clippy::too_many_arguments)]
    pub fn explode<R: Rng + ?Sized>(
        &self,
        pixels: &[u8],
        resolution: u32,
        spacing: f32,
        transform: &Matrix4<f32>,
        origin: Vector3<f32>,
        forward: Vector3<f32>,
        sink: &mut dyn ParticleSink,
        rng: &mut R,
    ) -> usize {
        let (positions, colors) = surviving_voxels(
            pixels,
            resolution,
            self.config.reduction_rate,
            spacing,
            transform,
        );

        sink.set_max_particles(positions.len());
        let emitted = sink.emit(
            EmitDefaults {
                start_size: spacing,
                angular_velocity: self.config.torque,
            },
            positions.len(),
        );

        let particles = sink.particles_mut();
        let start = particles.len() - emitted;
        for (voxel, particle) in particles[start..].iter_mut().enumerate() {
            particle.position = positions[voxel];
            particle.color = colors[voxel];
            particle.velocity =
                launch_velocity(positions[voxel], origin, forward, self.config.force, rng);
        }

        log::info!("explosion emitted {emitted} voxels");
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::particles::CpuParticleSystem;
    use cgmath::SquareMatrix;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Builds a transparent RGBA8 grid with the given texels set opaque white
    fn pixel_grid(resolution: u32, opaque: &[(u32, u32)]) -> Vec<u8> {
        let mut pixels = vec![0u8; (resolution * resolution * 4) as usize];
        for &(i, j) in opaque {
            let offset = ((j * resolution + i) * 4) as usize;
            pixels[offset..offset + 4].copy_from_slice(&[255, 255, 255, 255]);
        }
        pixels
    }

    #[test]
    fn survivor_count_matches_opaque_texels() {
        let pixels = pixel_grid(8, &[(0, 0), (3, 5), (7, 7)]);
        let identity = Matrix4::identity();
        let (positions, colors) = surviving_voxels(&pixels, 8, 1, 0.5, &identity);
        assert_eq!(positions.len(), 3);
        assert_eq!(colors.len(), 3);
    }

    #[test]
    fn reduction_rate_limits_sampled_texels() {
        // Everything opaque: survivors = number of sampled texels.
        let resolution = 8u32;
        let all: Vec<(u32, u32)> = (0..resolution)
            .flat_map(|i| (0..resolution).map(move |j| (i, j)))
            .collect();
        let pixels = pixel_grid(resolution, &all);
        let identity = Matrix4::identity();

        for rate in 1..=5u32 {
            let (positions, _) = surviving_voxels(&pixels, resolution, rate, 1.0, &identity);
            let per_axis = resolution.div_ceil(rate) as usize;
            assert_eq!(positions.len(), per_axis * per_axis);
        }
    }

    #[test]
    fn single_texel_lands_at_expected_world_position() {
        // End-to-end scenario: R = 4, spacing = 1, only texel (1, 1) opaque,
        // identity transform, origin at the world origin.
        let pixels = pixel_grid(4, &[(1, 1)]);
        let identity = Matrix4::identity();
        let mut sink = CpuParticleSystem::new();
        let mut rng = StdRng::seed_from_u64(7);

        let emitter = ExplosionEmitter::new(ExplosionConfig::new(1, 5.0, 1.0));
        let emitted = emitter.explode(
            &pixels,
            4,
            1.0,
            &identity,
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            &mut sink,
            &mut rng,
        );

        assert_eq!(emitted, 1);
        let particle = &sink.particles()[0];
        assert_eq!(particle.position, Vector3::new(-1.0, 1.0, 0.0));
        assert_eq!(particle.color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(particle.size, 1.0);
        assert_eq!(particle.angular_velocity, 1.0);
    }

    #[test]
    fn radial_velocity_gets_flat_vertical_override() {
        // No forward axis: the jitter term vanishes and the formula is exact.
        let mut rng = StdRng::seed_from_u64(1);
        let force = 4.0;
        let world = Vector3::new(3.0, -9.0, 4.0);
        let origin = Vector3::new(0.0, 0.0, 0.0);

        let velocity = launch_velocity(world, origin, Vector3::new(0.0, 0.0, 0.0), force, &mut rng);

        let radial = (world - origin).normalize() * force;
        assert!((velocity.x - radial.x).abs() < 1e-6);
        assert!((velocity.z - radial.z).abs() < 1e-6);
        // Vertical component is a flat +force, not the radial one.
        assert_eq!(velocity.y, force);
        assert!(radial.y < 0.0, "override must be independent of d's own y");
    }

    #[test]
    fn forward_jitter_stays_within_force_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let force = 2.0;
        let forward = Vector3::new(0.0, 0.0, 1.0);
        let world = Vector3::new(1.0, 0.0, 0.0);
        let origin = Vector3::new(0.0, 0.0, 0.0);
        let radial_z = 0.0;

        for _ in 0..64 {
            let velocity = launch_velocity(world, origin, forward, force, &mut rng);
            assert!((velocity.z - radial_z).abs() <= force + 1e-6);
        }
    }

    #[test]
    fn voxel_at_origin_gets_pure_vertical_launch() {
        let mut rng = StdRng::seed_from_u64(3);
        let velocity = launch_velocity(
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 0.0),
            6.0,
            &mut rng,
        );
        assert_eq!(velocity, Vector3::new(0.0, 6.0, 0.0));
    }

    #[test]
    fn transparent_capture_is_a_noop_beyond_capacity_reset() {
        let pixels = pixel_grid(4, &[]);
        let identity = Matrix4::identity();
        let mut sink = CpuParticleSystem::new();
        sink.set_max_particles(16);
        let mut rng = StdRng::seed_from_u64(0);

        let emitter = ExplosionEmitter::new(ExplosionConfig::new(1, 5.0, 1.0));
        let emitted = emitter.explode(
            &pixels,
            4,
            1.0,
            &identity,
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            &mut sink,
            &mut rng,
        );

        assert_eq!(emitted, 0);
        assert_eq!(sink.max_particles(), 0);
        assert!(sink.particles().is_empty());
    }

    #[test]
    fn world_transform_is_applied_to_voxel_positions() {
        let pixels = pixel_grid(4, &[(1, 1)]);
        let transform = Matrix4::from_translation(Vector3::new(10.0, 0.0, -2.0));
        let (positions, _) = surviving_voxels(&pixels, 4, 1, 1.0, &transform);
        assert_eq!(positions[0], Vector3::new(9.0, 1.0, -2.0));
    }
}
