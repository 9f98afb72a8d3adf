pub mod mesh;
pub mod placement;
