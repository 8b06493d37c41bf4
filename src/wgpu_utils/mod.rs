//! Generic wgpu helpers shared by the capture and point-cloud pipelines

pub mod binding_types;
pub mod uniform_buffer;

/// Maps OpenGL-style clip space (z in [-1, 1]) to wgpu's (z in [0, 1])
///
/// cgmath produces OpenGL-convention projection matrices; every projection
/// used for a wgpu draw goes through this correction.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);
