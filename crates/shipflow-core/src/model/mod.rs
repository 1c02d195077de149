//! ビルドユニットのデータモデル

mod image_ref;
mod status;
mod unit;

pub use image_ref::*;
pub use status::*;
pub use unit::*;
