//! Particle-simulation handle and a default CPU implementation
//!
//! The explosion hands its voxels to a particle simulation and never touches
//! them again. The [`ParticleSink`] trait mirrors the host surface the
//! effect needs: set capacity, emit a batch with default parameters, then
//! bulk-write position/color/velocity. [`CpuParticleSystem`] is a small
//! gravity-and-damping Euler integrator for hosts without their own
//! simulator.

use cgmath::Vector3;

/// One simulated particle
#[derive(Clone, Debug)]
pub struct SimParticle {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
    pub color: [f32; 4],
    pub size: f32,
    pub angular_velocity: f32,
    pub rotation: f32,
    pub age: f32,
}

/// Default parameters applied to every particle of an emitted batch
#[derive(Clone, Copy, Debug)]
pub struct EmitDefaults {
    pub start_size: f32,
    pub angular_velocity: f32,
}

/// Handle to the host's particle simulation
///
/// Capacity must be set before emission: simulators silently drop or
/// recycle particles emitted past their configured maximum.
pub trait ParticleSink {
    fn max_particles(&self) -> usize;

    /// Resizes the simulator's capacity; may discard existing particles
    fn set_max_particles(&mut self, max: usize);

    /// Emits up to `count` particles with the given defaults, returning how
    /// many were actually created (clamped by capacity)
    fn emit(&mut self, defaults: EmitDefaults, count: usize) -> usize;

    /// Bulk read access to the live particle array
    fn particles(&self) -> &[SimParticle];

    /// Bulk write access to the live particle array
    fn particles_mut(&mut self) -> &mut [SimParticle];
}

/// CPU particle integrator: gravity, damping, forward Euler
pub struct CpuParticleSystem {
    particles: Vec<SimParticle>,
    max_particles: usize,
    gravity: Vector3<f32>,
    damping: f32,
}

impl CpuParticleSystem {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            max_particles: 0,
            gravity: Vector3::new(0.0, -9.81, 0.0),
            damping: 0.99,
        }
    }

    pub fn with_gravity(mut self, gravity: [f32; 3]) -> Self {
        self.gravity = Vector3::from(gravity);
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    /// Advances the simulation by one time step
    pub fn update(&mut self, delta_time: f32) {
        for particle in &mut self.particles {
            particle.velocity += self.gravity * delta_time;
            particle.velocity *= self.damping;
            particle.position += particle.velocity * delta_time;
            particle.rotation += particle.angular_velocity * delta_time;
            particle.age += delta_time;
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

impl Default for CpuParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleSink for CpuParticleSystem {
    fn max_particles(&self) -> usize {
        self.max_particles
    }

    fn set_max_particles(&mut self, max: usize) {
        self.max_particles = max;
        if self.particles.len() > max {
            self.particles.truncate(max);
        }
    }

    fn emit(&mut self, defaults: EmitDefaults, count: usize) -> usize {
        let available = self.max_particles.saturating_sub(self.particles.len());
        let emitted = count.min(available);
        for _ in 0..emitted {
            self.particles.push(SimParticle {
                position: Vector3::new(0.0, 0.0, 0.0),
                velocity: Vector3::new(0.0, 0.0, 0.0),
                color: [1.0, 1.0, 1.0, 1.0],
                size: defaults.start_size,
                angular_velocity: defaults.angular_velocity,
                rotation: 0.0,
                age: 0.0,
            });
        }
        emitted
    }

    fn particles(&self) -> &[SimParticle] {
        &self.particles
    }

    fn particles_mut(&mut self) -> &mut [SimParticle] {
        &mut self.particles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: EmitDefaults = EmitDefaults {
        start_size: 0.1,
        angular_velocity: 2.0,
    };

    #[test]
    fn emit_is_clamped_by_capacity() {
        let mut system = CpuParticleSystem::new();
        system.set_max_particles(10);
        assert_eq!(system.emit(DEFAULTS, 25), 10);
        assert_eq!(system.len(), 10);
        assert_eq!(system.emit(DEFAULTS, 1), 0);
    }

    #[test]
    fn emitted_particles_carry_defaults() {
        let mut system = CpuParticleSystem::new();
        system.set_max_particles(3);
        system.emit(DEFAULTS, 3);
        for particle in system.particles() {
            assert_eq!(particle.size, 0.1);
            assert_eq!(particle.angular_velocity, 2.0);
            assert_eq!(particle.age, 0.0);
        }
    }

    #[test]
    fn shrinking_capacity_truncates_live_particles() {
        let mut system = CpuParticleSystem::new();
        system.set_max_particles(8);
        system.emit(DEFAULTS, 8);
        system.set_max_particles(2);
        assert_eq!(system.len(), 2);
    }

    #[test]
    fn update_integrates_velocity_and_spin() {
        let mut system = CpuParticleSystem::new()
            .with_gravity([0.0, 0.0, 0.0])
            .with_damping(1.0);
        system.set_max_particles(1);
        system.emit(DEFAULTS, 1);
        system.particles_mut()[0].velocity = Vector3::new(1.0, 0.0, 0.0);

        system.update(0.5);

        let particle = &system.particles()[0];
        assert_eq!(particle.position, Vector3::new(0.5, 0.0, 0.0));
        assert_eq!(particle.rotation, 1.0);
        assert_eq!(particle.age, 0.5);
    }
}
