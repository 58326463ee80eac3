//! 파이프라인 공통 타입 정의.

pub mod asset;
pub mod bar;
pub mod interval;

pub use asset::{Asset, FetchDepth, FetchRequest};
pub use bar::Bar;
pub use interval::Interval;
