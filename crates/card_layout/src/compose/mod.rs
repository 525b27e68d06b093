pub mod card;
pub mod overlay;
pub mod paint;
pub mod source;
pub mod text;
