pub mod camera;
pub mod components;
pub mod geometry;
pub mod loaders;
pub mod shader;
pub mod texture;
