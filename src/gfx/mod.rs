//! # Graphics Module
//!
//! GPU-facing half of the pixelizer effect:
//!
//! - **Context** ([`context`]) - Headless device and queue acquisition
//! - **Capture** ([`capture`]) - Offscreen override-material capture pass
//! - **Voxel Grid** ([`voxel_grid`]) - Grid generation and GPU upload
//! - **Point Cloud** ([`point_cloud`]) - Billboarded single-draw voxel rendering
//! - **Mesh** ([`mesh`]) - Vertex format and mesh handles for render parts
//! - **Resources** ([`resources`]) - Capture target texture wrappers

pub mod capture;
pub mod context;
pub mod mesh;
pub mod point_cloud;
pub mod resources;
pub mod voxel_grid;

pub use capture::OffscreenCapture;
pub use context::GpuContext;
pub use point_cloud::{PointCloudRenderer, Viewpoint};
pub use voxel_grid::{Aabb, VoxelGrid, VoxelSample};
