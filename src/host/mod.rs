//! Host-environment collaborator interfaces
//!
//! The effect treats the surrounding engine as a set of opaque services:
//! a scene subtree with renderable parts, an animation rig with a culling
//! mode, and a particle simulation that takes ownership of emitted
//! particles. Each seam is a small trait or plain struct so hosts can plug
//! in their own implementations; default CPU implementations are provided.

pub mod animation;
pub mod particles;
pub mod scene;

pub use animation::{AnimationRig, CullingMode, SimpleRig};
pub use particles::{CpuParticleSystem, EmitDefaults, ParticleSink, SimParticle};
pub use scene::{RenderPart, Target, LAYER_DEFAULT, LAYER_PIXELATOR};
