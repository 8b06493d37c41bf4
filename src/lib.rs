// src/lib.rs
//! Pixelizer
//!
//! A real-time pixelization / voxel-explosion effect built on wgpu. A target
//! object is rendered every frame into a small point-filtered offscreen
//! buffer, the buffer is reinterpreted as a grid of voxels drawn in a single
//! point-cloud draw call, and on demand the captured pixels are read back
//! and burst into a particle simulation.

pub mod effect;
pub mod error;
pub mod gfx;
pub mod host;
pub mod pixelizer;
pub mod prelude;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use error::{PixelizerError, Result};
pub use gfx::context::GpuContext;
pub use pixelizer::{Pixelizer, PixelizerConfig};
