//! Turning raw seed cells into particle boundary faces.

mod cell_merger;
mod decode;
mod unwrap;

pub use cell_merger::{BoundaryFace, CellMerger, Neighbor};
pub use decode::decode_face_vertices;
pub use unwrap::PeriodicUnwrap;
