pub mod layout;
pub mod pieces;
pub mod scene;
