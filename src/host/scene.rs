//! Scene-graph handle: the target object and its renderable parts
//!
//! The pixelate transition moves parts between integer render layers; the
//! private pixelator layer excludes them from the host's main view while
//! the offscreen capture keeps drawing them.

use cgmath::{Matrix4, Vector3};

use crate::gfx::mesh::GpuMesh;

/// Default render layer visible to the main view
pub const LAYER_DEFAULT: u32 = 0;

/// Private layer excluded from the main view, drawn only by the capture pass
pub const LAYER_PIXELATOR: u32 = 8;

/// One renderable part of the target subtree
pub struct RenderPart {
    pub name: String,
    /// Integer render layer; the main view culls everything not on its mask
    pub layer: u32,
    /// Skinned parts keep animating offscreen only when this is set
    pub skinned: bool,
    /// Host optimization flag: skip pose updates when not visible
    pub update_when_offscreen: bool,
    /// Per-part tint applied through the override material, property-block
    /// style: written into the part's own uniforms, never into shared state
    pub tint: [f32; 4],
    /// Geometry drawn by the capture pass; parts without a mesh are skipped
    pub mesh: Option<GpuMesh>,
}

impl RenderPart {
    pub fn new(name: impl Into<String>, mesh: Option<GpuMesh>) -> Self {
        Self {
            name: name.into(),
            layer: LAYER_DEFAULT,
            skinned: false,
            update_when_offscreen: false,
            tint: [1.0, 1.0, 1.0, 1.0],
            mesh,
        }
    }

    pub fn skinned(mut self) -> Self {
        self.skinned = true;
        self
    }

    pub fn with_tint(mut self, tint: [f32; 4]) -> Self {
        self.tint = tint;
        self
    }
}

/// The object being pixelized: a world position plus its renderable parts
pub struct Target {
    pub position: Vector3<f32>,
    pub parts: Vec<RenderPart>,
}

impl Target {
    pub fn new(position: Vector3<f32>) -> Self {
        Self {
            position,
            parts: Vec::new(),
        }
    }

    pub fn add_part(&mut self, part: RenderPart) {
        self.parts.push(part);
    }

    /// Model matrix shared by the target's parts
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
    }

    /// Parts the capture pass can actually draw
    pub fn drawable_parts(&self) -> impl Iterator<Item = &RenderPart> {
        self.parts.iter().filter(|part| part.mesh.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_default_to_main_layer() {
        let part = RenderPart::new("torso", None);
        assert_eq!(part.layer, LAYER_DEFAULT);
        assert!(!part.update_when_offscreen);
    }

    #[test]
    fn drawable_parts_skips_meshless_parts() {
        let mut target = Target::new(Vector3::new(0.0, 0.0, 0.0));
        target.add_part(RenderPart::new("empty", None));
        assert_eq!(target.drawable_parts().count(), 0);
    }
}
