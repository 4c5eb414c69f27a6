pub mod config;
pub mod dedup;
pub mod error;
pub mod math;
pub mod merge;
pub mod mesh;
pub mod pipeline;
pub mod points;
pub mod sampling;
pub mod tessellation;

pub use error::{Result, SetVoronoiError};
