//! Error types for the pixelizer crate
//!
//! Configuration degeneracies (a target with no renderable parts, a fully
//! transparent capture) are deliberately not errors: the effect degrades to
//! an empty draw instead of halting the frame loop. Errors are reserved for
//! GPU acquisition, readback failures, and use after teardown.

use thiserror::Error;

/// Errors produced by pixelizer operations
#[derive(Debug, Error)]
pub enum PixelizerError {
    /// No compatible GPU adapter could be acquired
    #[error("no compatible GPU adapter available")]
    AdapterUnavailable,

    /// Device acquisition failed after an adapter was found
    #[error("failed to acquire GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// The blocking capture-buffer readback did not complete
    #[error("capture readback failed: {0}")]
    Readback(String),

    /// An operation was attempted after `shutdown()` released the GPU resources
    #[error("pixelizer GPU resources already released")]
    Released,
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, PixelizerError>;
