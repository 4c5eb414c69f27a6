//! Global mesh assembly: collecting boundary faces, merging the vertices
//! that adjacent cells computed independently, and writing the result.

mod alias;
mod assembler;
mod poly;
mod store;

pub use alias::AliasMap;
pub use assembler::{ConsolidatedMesh, ConsolidationReport, DroppedFace, MeshAssembler, MeshFace};
pub use poly::write_poly;
pub use store::{FaceData, FaceKey, MeshStore, VertexData, VertexKey};
