//! Pixelate state machine
//!
//! Exactly two states per target: Normal (skinned meshes visible, host
//! drives animation as usual) and Pixelated (meshes moved to the private
//! pixelator layer, animation forced live, point cloud drawn instead).
//! Transitions are synchronous and atomic from the caller's perspective;
//! same-state transitions are no-ops.

use crate::host::animation::{AnimationRig, CullingMode};
use crate::host::scene::{RenderPart, LAYER_PIXELATOR};

/// Rendering mode of the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Normal,
    Pixelated,
}

/// Pre-transition values recorded for one part, restored on `restore`
#[derive(Debug, Clone, Copy)]
struct SavedPart {
    layer: u32,
    update_when_offscreen: bool,
}

/// Toggles a target between normal and pixelated rendering
pub struct PixelateStateMachine {
    state: RenderState,
    saved_parts: Vec<SavedPart>,
    saved_culling: Option<CullingMode>,
    processing: bool,
    activated_at: Option<f32>,
}

impl PixelateStateMachine {
    pub fn new() -> Self {
        Self {
            state: RenderState::Normal,
            saved_parts: Vec::new(),
            saved_culling: None,
            processing: false,
            activated_at: None,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn is_pixelated(&self) -> bool {
        self.state == RenderState::Pixelated
    }

    /// Whether the point cloud should capture and draw this frame
    pub fn processing_enabled(&self) -> bool {
        self.processing
    }

    /// Timestamp recorded when pixelated rendering was last activated
    pub fn activated_at(&self) -> Option<f32> {
        self.activated_at
    }

    /// Enters pixelated rendering; returns false if already pixelated
    ///
    /// Records every touched value before changing it so `restore` can put
    /// parts back exactly where they were.
    pub fn pixelate(
        &mut self,
        parts: &mut [RenderPart],
        rig: &mut dyn AnimationRig,
        now: f32,
    ) -> bool {
        if self.state == RenderState::Pixelated {
            return false;
        }

        self.saved_parts = parts
            .iter()
            .map(|part| SavedPart {
                layer: part.layer,
                update_when_offscreen: part.update_when_offscreen,
            })
            .collect();
        self.saved_culling = Some(rig.culling_mode());

        for part in parts.iter_mut() {
            part.layer = LAYER_PIXELATOR;
            if part.skinned {
                part.update_when_offscreen = true;
            }
        }
        rig.set_culling_mode(CullingMode::AlwaysAnimate);

        self.state = RenderState::Pixelated;
        self.processing = true;
        self.activated_at = Some(now);
        log::debug!("pixelated rendering enabled at t={now}");
        true
    }

    /// Returns to normal rendering; returns false if already normal
    pub fn restore(&mut self, parts: &mut [RenderPart], rig: &mut dyn AnimationRig) -> bool {
        if self.state == RenderState::Normal {
            return false;
        }

        for (part, saved) in parts.iter_mut().zip(self.saved_parts.drain(..)) {
            part.layer = saved.layer;
            part.update_when_offscreen = saved.update_when_offscreen;
        }
        if let Some(mode) = self.saved_culling.take() {
            rig.set_culling_mode(mode);
        }

        self.state = RenderState::Normal;
        self.processing = false;
        self.activated_at = None;
        log::debug!("pixelated rendering restored to normal");
        true
    }

    /// Stops per-frame capture and drawing without leaving the Pixelated
    /// state; used by the one-shot explosion
    pub fn stop_processing(&mut self) {
        self.processing = false;
    }
}

impl Default for PixelateStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::animation::SimpleRig;
    use crate::host::scene::LAYER_DEFAULT;

    fn test_parts() -> Vec<RenderPart> {
        let mut skinned = RenderPart::new("body", None).skinned();
        skinned.layer = 3;
        let rigid = RenderPart::new("sword", None);
        vec![skinned, rigid]
    }

    #[test]
    fn pixelate_moves_parts_and_forces_animation() {
        let mut parts = test_parts();
        let mut rig = SimpleRig::new();
        let mut machine = PixelateStateMachine::new();

        assert!(machine.pixelate(&mut parts, &mut rig, 1.5));
        assert_eq!(machine.state(), RenderState::Pixelated);
        assert!(machine.processing_enabled());
        assert_eq!(machine.activated_at(), Some(1.5));
        for part in &parts {
            assert_eq!(part.layer, LAYER_PIXELATOR);
        }
        assert!(parts[0].update_when_offscreen, "skinned part must keep posing");
        assert!(!parts[1].update_when_offscreen, "rigid part flag untouched");
        assert_eq!(rig.culling_mode(), CullingMode::AlwaysAnimate);
    }

    #[test]
    fn restore_returns_every_touched_value() {
        let mut parts = test_parts();
        let mut rig = SimpleRig::new();
        rig.set_culling_mode(CullingMode::CullWhenOffscreen);
        let mut machine = PixelateStateMachine::new();

        machine.pixelate(&mut parts, &mut rig, 0.0);
        assert!(machine.restore(&mut parts, &mut rig));

        assert_eq!(parts[0].layer, 3);
        assert_eq!(parts[1].layer, LAYER_DEFAULT);
        assert!(!parts[0].update_when_offscreen);
        assert_eq!(rig.culling_mode(), CullingMode::CullWhenOffscreen);
        assert_eq!(machine.state(), RenderState::Normal);
        assert!(!machine.processing_enabled());
    }

    #[test]
    fn pixelate_is_reentrant_safe() {
        let mut parts = test_parts();
        let mut rig = SimpleRig::new();
        let mut machine = PixelateStateMachine::new();

        assert!(machine.pixelate(&mut parts, &mut rig, 1.0));
        // A second call must not re-save the already-pixelated layers.
        assert!(!machine.pixelate(&mut parts, &mut rig, 2.0));
        assert_eq!(machine.activated_at(), Some(1.0));

        machine.restore(&mut parts, &mut rig);
        assert_eq!(parts[0].layer, 3);
    }

    #[test]
    fn restore_without_pixelate_is_a_noop() {
        let mut parts = test_parts();
        let mut rig = SimpleRig::new();
        let mut machine = PixelateStateMachine::new();
        assert!(!machine.restore(&mut parts, &mut rig));
        assert_eq!(parts[0].layer, 3);
    }

    #[test]
    fn explosion_stops_processing_but_stays_pixelated() {
        let mut parts = test_parts();
        let mut rig = SimpleRig::new();
        let mut machine = PixelateStateMachine::new();

        machine.pixelate(&mut parts, &mut rig, 0.0);
        machine.stop_processing();

        assert!(machine.is_pixelated());
        assert!(!machine.processing_enabled());
    }
}
