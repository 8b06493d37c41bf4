//! GPU resource wrappers used by the capture pipeline

pub mod texture_resource;

pub use texture_resource::TextureResource;
