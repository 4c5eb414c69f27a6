//! Uniform-grid spatial index and epsilon-radius duplicate collapse.
//!
//! Used twice per run: on raw surface samples before tessellation, and on
//! the vertices of all merged boundary faces during mesh consolidation.

mod deduplicator;
mod grid;

pub use deduplicator::{SpatialDeduplicator, SubstitutionMap};
pub use grid::{UniformGrid, DEFAULT_BUCKETS};
