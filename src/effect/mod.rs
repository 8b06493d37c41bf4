//! Effect logic: pixelate state transitions and explosion emission

pub mod explosion;
pub mod state;

pub use explosion::{ExplosionConfig, ExplosionEmitter};
pub use state::{PixelateStateMachine, RenderState};
