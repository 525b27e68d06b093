pub mod ease;
pub mod particles;
pub mod placement;
pub mod timeline;
