use std::fmt;

use crate::error::CellError;
use crate::math::Point3;
use crate::points::{ParticleId, ReferenceFrames};
use crate::tessellation::RawCell;

use super::{decode_face_vertices, PeriodicUnwrap};

/// What lies on the other side of a boundary face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Neighbor {
    Particle(ParticleId),
    /// A domain wall, carrying the engine's negative wall id.
    Wall(i32),
}

impl fmt::Display for Neighbor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Particle(id) => write!(f, "particle {id}"),
            Self::Wall(id) => write!(f, "wall {id}"),
        }
    }
}

/// A face of a seed cell that separates its particle from something else.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFace {
    /// Seed whose cell produced the face.
    pub seed: usize,
    pub owner: ParticleId,
    pub neighbor: Neighbor,
    /// Face vertices in the owner's unwrapped frame, in engine order.
    pub vertices: Vec<Point3>,
}

/// Filters and unwraps the faces of single seed cells.
///
/// Holds the seed to particle label table and the particle reference frames
/// by reference; one merger serves every seed and can be shared across
/// threads.
#[derive(Debug, Clone)]
pub struct CellMerger<'a> {
    labels: &'a [ParticleId],
    frames: &'a ReferenceFrames,
    unwrap: PeriodicUnwrap,
}

impl<'a> CellMerger<'a> {
    /// Creates a merger. `labels[seed]` is the particle owning `seed`.
    #[must_use]
    pub fn new(labels: &'a [ParticleId], frames: &'a ReferenceFrames, unwrap: PeriodicUnwrap) -> Self {
        Self {
            labels,
            frames,
            unwrap,
        }
    }

    /// Returns the faces of `cell` that bound its particle.
    ///
    /// Faces towards a seed of the same particle are discarded. The others
    /// are shifted into the particle's reference frame.
    ///
    /// # Errors
    ///
    /// Returns a [`CellError`] if the seed has no label, the adjacency list
    /// is malformed or disagrees with the neighbor list, or a face points at
    /// an unknown vertex or seed.
    pub fn merge(&self, cell: &RawCell) -> Result<Vec<BoundaryFace>, CellError> {
        let seed = cell.seed;
        let owner = *self
            .labels
            .get(seed)
            .ok_or(CellError::UnknownSeed { seed })?;

        let faces = decode_face_vertices(seed, &cell.face_vertices)?;
        if faces.len() != cell.neighbors.len() {
            return Err(CellError::MalformedAdjacency {
                seed,
                message: format!(
                    "{} faces but {} neighbor ids",
                    faces.len(),
                    cell.neighbors.len()
                ),
            });
        }

        let reference = self.frames.anchor(owner).unwrap_or(&cell.position);
        let shift = self.unwrap.shift(&cell.position, reference);

        let mut boundary = Vec::new();
        for (face, &neighbor_id) in faces.iter().zip(&cell.neighbors) {
            let neighbor = self.neighbor(seed, neighbor_id)?;
            if neighbor == Neighbor::Particle(owner) {
                continue;
            }
            let mut vertices = face
                .iter()
                .map(|&i| {
                    cell.vertices.get(i).copied().ok_or_else(|| CellError::MalformedAdjacency {
                        seed,
                        message: format!("vertex index {i} out of range 0..{}", cell.vertices.len()),
                    })
                })
                .collect::<Result<Vec<Point3>, CellError>>()?;
            PeriodicUnwrap::apply(&mut vertices, &shift);
            boundary.push(BoundaryFace {
                seed,
                owner,
                neighbor,
                vertices,
            });
        }
        Ok(boundary)
    }

    fn neighbor(&self, seed: usize, id: i32) -> Result<Neighbor, CellError> {
        if id < 0 {
            return Ok(Neighbor::Wall(id));
        }
        usize::try_from(id)
            .ok()
            .and_then(|n| self.labels.get(n))
            .map(|&label| Neighbor::Particle(label))
            .ok_or(CellError::UnknownNeighbor {
                seed,
                neighbor: i64::from(id),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Domain;
    use crate::tessellation::flatten_faces;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn id(n: u32) -> ParticleId {
        ParticleId::new(n)
    }

    /// Square pyramid: base plus four triangles, neighbors as given.
    fn pyramid(seed: usize, position: Point3, neighbors: Vec<i32>) -> RawCell {
        let vertices = vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(0.5, 0.5, 1.0),
        ];
        let faces = vec![
            vec![0, 3, 2, 1],
            vec![0, 1, 4],
            vec![1, 2, 4],
            vec![2, 3, 4],
            vec![3, 0, 4],
        ];
        RawCell::from_geometry(seed, position, vertices, &faces, neighbors)
    }

    #[test]
    fn drops_faces_shared_with_same_particle() {
        let labels = [id(1), id(1), id(2)];
        let frames = ReferenceFrames::default();
        let merger = CellMerger::new(&labels, &frames, PeriodicUnwrap::disabled());
        let cell = pyramid(0, p(0.5, 0.5, 0.3), vec![1, 2, -1, 2, 1]);
        let faces = merger.merge(&cell).unwrap();
        assert_eq!(faces.len(), 3);
        assert!(faces.iter().all(|f| f.neighbor != Neighbor::Particle(f.owner)));
        assert_eq!(faces[1].neighbor, Neighbor::Wall(-1));
        assert_eq!(faces[0].vertices, vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.5, 0.5, 1.0)]);
    }

    #[test]
    fn isolated_seed_keeps_every_face() {
        let labels = [id(1), id(2)];
        let frames = ReferenceFrames::default();
        let merger = CellMerger::new(&labels, &frames, PeriodicUnwrap::disabled());
        let faces = merger.merge(&pyramid(1, p(0.5, 0.5, 0.3), vec![-1, -2, -3, -4, 0])).unwrap();
        assert_eq!(faces.len(), 5);
        assert!(faces.iter().all(|f| f.owner == id(2) && f.seed == 1));
    }

    #[test]
    fn unknown_neighbor_is_reported() {
        let labels = [id(1)];
        let frames = ReferenceFrames::default();
        let merger = CellMerger::new(&labels, &frames, PeriodicUnwrap::disabled());
        let err = merger.merge(&pyramid(0, p(0.5, 0.5, 0.3), vec![-1, -1, -1, -1, 9])).unwrap_err();
        assert_eq!(err, CellError::UnknownNeighbor { seed: 0, neighbor: 9 });
    }

    #[test]
    fn unlabeled_seed_is_reported() {
        let labels = [id(1)];
        let frames = ReferenceFrames::default();
        let merger = CellMerger::new(&labels, &frames, PeriodicUnwrap::disabled());
        let err = merger.merge(&pyramid(4, p(0.5, 0.5, 0.3), vec![-1; 5])).unwrap_err();
        assert_eq!(err, CellError::UnknownSeed { seed: 4 });
    }

    #[test]
    fn neighbor_count_must_match_faces() {
        let labels = [id(1)];
        let frames = ReferenceFrames::default();
        let merger = CellMerger::new(&labels, &frames, PeriodicUnwrap::disabled());
        let err = merger.merge(&pyramid(0, p(0.5, 0.5, 0.3), vec![-1; 4])).unwrap_err();
        assert!(matches!(err, CellError::MalformedAdjacency { seed: 0, .. }));
    }

    #[test]
    fn vertex_index_out_of_range_is_malformed() {
        let labels = [id(1)];
        let frames = ReferenceFrames::default();
        let merger = CellMerger::new(&labels, &frames, PeriodicUnwrap::disabled());
        let mut cell = pyramid(0, p(0.5, 0.5, 0.3), vec![-1; 5]);
        cell.face_vertices = flatten_faces(&[vec![0, 1, 7]]);
        cell.neighbors = vec![-1];
        assert!(matches!(merger.merge(&cell), Err(CellError::MalformedAdjacency { .. })));
    }

    #[test]
    fn wrapped_seed_faces_move_to_reference_frame() {
        let domain = Domain::new(p(0.0, 0.0, 0.0), p(10.0, 10.0, 10.0), [true, false, false]).unwrap();
        let labels = [id(1), id(2)];
        let mut frames = ReferenceFrames::default();
        frames.insert(id(1), p(10.2, 0.5, 0.5));
        let merger = CellMerger::new(&labels, &frames, PeriodicUnwrap::new(&domain, None).unwrap());
        let faces = merger.merge(&pyramid(0, p(0.2, 0.5, 0.3), vec![1, 1, 1, 1, 1])).unwrap();
        assert_eq!(faces.len(), 5);
        assert_relative_eq!(faces[0].vertices[0], p(10.0, 0.0, 0.0));
    }
}
