//! Animation-system handle
//!
//! The only thing the effect needs from the host's animation system is its
//! per-instance culling mode: while pixelated, poses must keep updating even
//! though the skinned meshes are invisible to the main view, otherwise the
//! capture would freeze on the last visible pose.

/// Per-instance animation culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullingMode {
    /// Update the pose every frame regardless of visibility
    AlwaysAnimate,
    /// Skip pose updates while the instance is offscreen
    CullWhenOffscreen,
}

/// Handle to the host's animation system for one target instance
pub trait AnimationRig {
    fn culling_mode(&self) -> CullingMode;
    fn set_culling_mode(&mut self, mode: CullingMode);
}

/// Minimal rig implementation holding just the culling mode
pub struct SimpleRig {
    mode: CullingMode,
}

impl SimpleRig {
    pub fn new() -> Self {
        Self {
            mode: CullingMode::CullWhenOffscreen,
        }
    }
}

impl Default for SimpleRig {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationRig for SimpleRig {
    fn culling_mode(&self) -> CullingMode {
        self.mode
    }

    fn set_culling_mode(&mut self, mode: CullingMode) {
        self.mode = mode;
    }
}
