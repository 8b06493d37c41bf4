//! Convenience re-exports for typical effect setup

pub use crate::effect::state::RenderState;
pub use crate::error::{PixelizerError, Result};
pub use crate::gfx::context::GpuContext;
pub use crate::gfx::mesh::{generate_cube, GpuMesh, Vertex3D};
pub use crate::gfx::point_cloud::Viewpoint;
pub use crate::host::animation::{AnimationRig, CullingMode, SimpleRig};
pub use crate::host::particles::{CpuParticleSystem, ParticleSink};
pub use crate::host::scene::{RenderPart, Target};
pub use crate::pixelizer::{Pixelizer, PixelizerConfig};
