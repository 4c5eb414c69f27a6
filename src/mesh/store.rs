use slotmap::{new_key_type, SlotMap};

use crate::error::ConsolidationError;
use crate::math::Point3;
use crate::merge::Neighbor;
use crate::points::ParticleId;

new_key_type! {
    /// Key of a raw mesh vertex.
    pub struct VertexKey;
    /// Key of a raw mesh face.
    pub struct FaceKey;
}

/// A vertex as ingested, before duplicate collapse.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexData {
    pub position: Point3,
    /// Particle whose face introduced the vertex.
    pub owner: ParticleId,
}

/// A face as ingested.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceData {
    pub vertices: Vec<VertexKey>,
    pub owner: ParticleId,
    pub neighbor: Neighbor,
}

/// Arena holding the raw mesh while faces are collected.
///
/// Vertices and faces keep their insertion order; consolidation walks them
/// in that order, which makes its result reproducible.
#[derive(Debug, Default)]
pub struct MeshStore {
    vertices: SlotMap<VertexKey, VertexData>,
    faces: SlotMap<FaceKey, FaceData>,
    vertex_order: Vec<VertexKey>,
    face_order: Vec<FaceKey>,
}

impl MeshStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a vertex and returns its key.
    pub fn add_vertex(&mut self, data: VertexData) -> VertexKey {
        let key = self.vertices.insert(data);
        self.vertex_order.push(key);
        key
    }

    /// Inserts a face and returns its key.
    ///
    /// # Errors
    ///
    /// Returns [`ConsolidationError::MissingVertex`] if the face references a
    /// key not in the store.
    pub fn add_face(&mut self, data: FaceData) -> Result<FaceKey, ConsolidationError> {
        if data.vertices.iter().any(|&v| !self.vertices.contains_key(v)) {
            return Err(ConsolidationError::MissingVertex);
        }
        Ok(self.insert_face(data))
    }

    /// Inserts a face whose vertex keys are known to be in the store.
    pub(crate) fn insert_face(&mut self, data: FaceData) -> FaceKey {
        let key = self.faces.insert(data);
        self.face_order.push(key);
        key
    }

    /// # Errors
    ///
    /// Returns [`ConsolidationError::MissingVertex`] for an unknown key.
    pub fn vertex(&self, key: VertexKey) -> Result<&VertexData, ConsolidationError> {
        self.vertices.get(key).ok_or(ConsolidationError::MissingVertex)
    }

    #[must_use]
    pub fn face(&self, key: FaceKey) -> Option<&FaceData> {
        self.faces.get(key)
    }

    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertex_order.len()
    }

    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.face_order.len()
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &VertexData)> + '_ {
        self.vertex_order.iter().map(|&k| (k, &self.vertices[k]))
    }

    /// Faces in insertion order.
    pub fn faces(&self) -> impl Iterator<Item = (FaceKey, &FaceData)> + '_ {
        self.face_order.iter().map(|&k| (k, &self.faces[k]))
    }
}
