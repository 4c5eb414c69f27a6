use std::collections::{BTreeMap, BTreeSet};

use slotmap::SecondaryMap;

use tracing::{debug, info, warn};

use crate::dedup::{SpatialDeduplicator, UniformGrid};
use crate::error::{ConfigError, ConsolidationError, Result};
use crate::math::{Domain, Point3};
use crate::merge::{BoundaryFace, Neighbor};
use crate::points::{LabeledPoint, ParticleId, PointPattern};

use super::{AliasMap, FaceData, MeshStore, VertexData, VertexKey};

/// Collects boundary faces and consolidates them into a shared-vertex mesh.
///
/// Single writer: faces must be ingested from one thread, in a fixed order,
/// for the consolidated numbering to be reproducible.
#[derive(Debug)]
pub struct MeshAssembler {
    store: MeshStore,
    epsilon: f64,
}

impl MeshAssembler {
    /// Creates an empty assembler merging vertices closer than `epsilon`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositive`] if `epsilon` is not positive.
    pub fn new(epsilon: f64) -> std::result::Result<Self, ConfigError> {
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "epsilon",
                value: epsilon,
            });
        }
        Ok(Self {
            store: MeshStore::new(),
            epsilon,
        })
    }

    /// Re-ingests a consolidated mesh with its vertices shared between faces.
    ///
    /// # Errors
    ///
    /// Returns an error if `epsilon` is invalid or a face references a point
    /// outside the mesh.
    pub fn from_mesh(mesh: &ConsolidatedMesh, epsilon: f64) -> Result<Self> {
        let mut assembler = Self::new(epsilon)?;
        let mut owners: Vec<Option<ParticleId>> = vec![None; mesh.points.len()];
        for face in &mesh.faces {
            for &id in &face.vertices {
                let slot = owners
                    .get_mut(id.wrapping_sub(1))
                    .ok_or(ConsolidationError::MissingVertex)?;
                slot.get_or_insert(face.owner);
            }
        }
        let keys: Vec<VertexKey> = mesh
            .points
            .iter()
            .zip(&owners)
            .map(|(&position, owner)| {
                assembler.store.add_vertex(VertexData {
                    position,
                    owner: owner.unwrap_or(ParticleId::new(0)),
                })
            })
            .collect();
        for face in &mesh.faces {
            assembler.store.add_face(FaceData {
                vertices: face.vertices.iter().map(|&id| keys[id - 1]).collect(),
                owner: face.owner,
                neighbor: face.neighbor,
            })?;
        }
        Ok(assembler)
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[must_use]
    pub fn store(&self) -> &MeshStore {
        &self.store
    }

    /// Adds a face, giving each of its vertices a fresh id.
    pub fn ingest(&mut self, face: BoundaryFace) {
        let vertices = face
            .vertices
            .into_iter()
            .map(|position| {
                self.store.add_vertex(VertexData {
                    position,
                    owner: face.owner,
                })
            })
            .collect();
        self.store.insert_face(FaceData {
            vertices,
            owner: face.owner,
            neighbor: face.neighbor,
        });
    }

    pub fn ingest_all(&mut self, faces: impl IntoIterator<Item = BoundaryFace>) {
        for face in faces {
            self.ingest(face);
        }
    }

    /// All ingested vertices tagged with their owning particle.
    #[must_use]
    pub fn raw_points(&self) -> PointPattern {
        self.store
            .vertices()
            .map(|(_, v)| LabeledPoint::new(v.position, v.owner))
            .collect()
    }

    /// Merges duplicate vertices, drops collapsed faces and renumbers
    /// vertices and particles contiguously.
    ///
    /// # Errors
    ///
    /// Returns a [`ConsolidationError`] if alias resolution finds a cycle.
    pub fn consolidate(&self) -> Result<(ConsolidatedMesh, ConsolidationReport)> {
        let positions: Vec<Point3> = self.store.vertices().map(|(_, v)| v.position).collect();
        let dense: SecondaryMap<VertexKey, usize> = self
            .store
            .vertices()
            .enumerate()
            .map(|(i, (k, _))| (k, i))
            .collect();

        let roots = self.merge_vertices(&positions)?;
        let merged_vertices = roots.iter().enumerate().filter(|&(i, &r)| i != r).count();

        let mut report = ConsolidationReport {
            input_vertices: positions.len(),
            merged_vertices,
            dropped_faces: Vec::new(),
        };

        // Substitute, then remove repeats keeping first-seen order
        let mut kept: Vec<(usize, Vec<usize>, &FaceData)> = Vec::new();
        for (index, (_, face)) in self.store.faces().enumerate() {
            let id = index + 1;
            let mut ids: Vec<usize> = Vec::with_capacity(face.vertices.len());
            for key in &face.vertices {
                let raw = dense.get(*key).ok_or(ConsolidationError::MissingVertex)?;
                let root = roots[*raw];
                if !ids.contains(&root) {
                    ids.push(root);
                }
            }
            if ids.len() < 3 {
                warn!(
                    face = id,
                    vertices = ids.len(),
                    owner = %face.owner,
                    "dropping degenerate face"
                );
                report.dropped_faces.push(DroppedFace {
                    face: id,
                    vertex_count: ids.len(),
                    owner: face.owner,
                });
                continue;
            }
            kept.push((id, ids, face));
        }

        // 1..K by first appearance among surviving faces
        let mut number: Vec<usize> = vec![0; positions.len()];
        let mut points = Vec::new();
        for (_, ids, _) in &mut kept {
            for v in ids.iter_mut() {
                if number[*v] == 0 {
                    points.push(positions[*v]);
                    number[*v] = points.len();
                }
                *v = number[*v];
            }
        }

        // Owners take 1..M; particles seen only as neighbors follow from M + 1
        let owners: BTreeSet<ParticleId> = kept.iter().map(|(_, _, face)| face.owner).collect();
        let neighbors_only: BTreeSet<ParticleId> = kept
            .iter()
            .filter_map(|(_, _, face)| match face.neighbor {
                Neighbor::Particle(p) if !owners.contains(&p) => Some(p),
                _ => None,
            })
            .collect();
        let particles: Vec<ParticleId> = owners.into_iter().chain(neighbors_only).collect();
        let labels: BTreeMap<ParticleId, ParticleId> = particles
            .iter()
            .zip(1..)
            .map(|(&old, new)| (old, ParticleId::new(new)))
            .collect();
        let relabel = |id: ParticleId| labels.get(&id).copied().unwrap_or(id);

        let faces = kept
            .into_iter()
            .map(|(id, vertices, face)| MeshFace {
                id,
                vertices,
                owner: relabel(face.owner),
                neighbor: match face.neighbor {
                    Neighbor::Particle(p) => Neighbor::Particle(relabel(p)),
                    wall @ Neighbor::Wall(_) => wall,
                },
            })
            .collect::<Vec<_>>();

        info!(
            vertices = points.len(),
            faces = faces.len(),
            merged = report.merged_vertices,
            dropped = report.dropped_faces.len(),
            "consolidated mesh"
        );
        Ok((
            ConsolidatedMesh {
                points,
                faces,
                particles,
            },
            report,
        ))
    }

    /// Second duplicate pass over every ingested vertex. Returns the final
    /// representative of each dense vertex index.
    fn merge_vertices(&self, positions: &[Point3]) -> Result<Vec<usize>> {
        let Some(domain) = Domain::enclosing(positions.iter().copied(), self.epsilon) else {
            return Ok(Vec::new());
        };
        let grid = UniformGrid::for_point_count(&domain, positions.len(), self.epsilon);
        debug!(dims = ?grid.dims(), "vertex merge grid");
        let mut dedup = SpatialDeduplicator::new(grid, self.epsilon)?;
        for (i, &p) in positions.iter().enumerate() {
            dedup.insert(p, i);
        }
        let substitution = dedup.remove_duplicates();
        Ok(AliasMap::from(&substitution).resolve_all()?)
    }
}

/// A face removed because it collapsed to fewer than three vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroppedFace {
    /// 1-based ingestion id of the face.
    pub face: usize,
    pub vertex_count: usize,
    pub owner: ParticleId,
}

/// Counters describing one consolidation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidationReport {
    pub input_vertices: usize,
    /// Vertices mapped onto another vertex.
    pub merged_vertices: usize,
    pub dropped_faces: Vec<DroppedFace>,
}

/// Face of the consolidated mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshFace {
    /// 1-based ingestion id.
    pub id: usize,
    /// 1-based point ids, in ingestion order.
    pub vertices: Vec<usize>,
    pub owner: ParticleId,
    pub neighbor: Neighbor,
}

/// Final mesh with contiguous point ids and particle labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidatedMesh {
    /// Point `k` is stored at index `k - 1`.
    pub points: Vec<Point3>,
    /// Faces in ascending id order.
    pub faces: Vec<MeshFace>,
    /// Original label of particle `m`, stored at index `m - 1`. Owners come
    /// first; particles that only appear as neighbors are numbered after them.
    pub particles: Vec<ParticleId>,
}

impl ConsolidatedMesh {
    #[must_use]
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Faces owned by the renumbered particle `owner`.
    pub fn faces_of(&self, owner: ParticleId) -> impl Iterator<Item = &MeshFace> + '_ {
        self.faces.iter().filter(move |f| f.owner == owner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn face(owner: u32, neighbor: u32, vertices: Vec<Point3>) -> BoundaryFace {
        BoundaryFace {
            seed: 0,
            owner: ParticleId::new(owner),
            neighbor: Neighbor::Particle(ParticleId::new(neighbor)),
            vertices,
        }
    }

    fn square(z: f64) -> Vec<Point3> {
        vec![p(0.0, 0.0, z), p(1.0, 0.0, z), p(1.0, 1.0, z), p(0.0, 1.0, z)]
    }

    #[test]
    fn rejects_non_positive_epsilon() {
        assert!(MeshAssembler::new(0.0).is_err());
        assert!(MeshAssembler::new(f64::NAN).is_err());
    }

    #[test]
    fn ingestion_never_shares_vertices() {
        let mut assembler = MeshAssembler::new(1e-6).unwrap();
        assembler.ingest(face(1, 2, square(0.0)));
        assembler.ingest(face(2, 1, square(0.0)));
        assert_eq!(assembler.store().num_vertices(), 8);
        assert_eq!(assembler.raw_points().len(), 8);
    }

    #[test]
    fn shared_face_vertices_merge() {
        let mut assembler = MeshAssembler::new(1e-6).unwrap();
        assembler.ingest(face(1, 2, square(0.0)));
        let mut other = square(0.0);
        other.reverse();
        for v in &mut other {
            v.z += 1e-9;
        }
        assembler.ingest(face(2, 1, other));
        let (mesh, report) = assembler.consolidate().unwrap();
        assert_eq!(report.merged_vertices, 4);
        assert_eq!(mesh.num_points(), 4);
        assert_eq!(mesh.faces[0].vertices, vec![1, 2, 3, 4]);
        assert_eq!(mesh.faces[1].vertices, vec![4, 3, 2, 1]);
    }

    #[test]
    fn collapsed_face_is_dropped_and_counted() {
        let mut assembler = MeshAssembler::new(1e-3).unwrap();
        assembler.ingest(face(1, 2, square(0.0)));
        assembler.ingest(face(1, 2, vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 0.0, 1e-4)]));
        let (mesh, report) = assembler.consolidate().unwrap();
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(
            report.dropped_faces,
            vec![DroppedFace {
                face: 2,
                vertex_count: 2,
                owner: ParticleId::new(1)
            }]
        );
    }

    #[test]
    fn unreferenced_points_are_omitted() {
        let mut assembler = MeshAssembler::new(1e-3).unwrap();
        assembler.ingest(face(1, 2, vec![p(5.0, 5.0, 5.0), p(5.0, 5.0, 5.0), p(6.0, 5.0, 5.0)]));
        assembler.ingest(face(1, 2, square(0.0)));
        let (mesh, _) = assembler.consolidate().unwrap();
        assert_eq!(mesh.num_points(), 4);
        assert_eq!(mesh.faces[0].id, 2);
    }

    #[test]
    fn particles_are_renumbered_contiguously() {
        let mut assembler = MeshAssembler::new(1e-6).unwrap();
        assembler.ingest(face(7, 3, square(0.0)));
        assembler.ingest(face(3, 7, square(2.0)));
        assembler.ingest(face(12, 3, square(4.0)));
        let (mesh, _) = assembler.consolidate().unwrap();
        let owners: Vec<u32> = mesh.faces.iter().map(|f| f.owner.get()).collect();
        assert_eq!(owners, vec![2, 1, 3]);
        assert_eq!(mesh.faces[0].neighbor, Neighbor::Particle(ParticleId::new(1)));
        assert_eq!(mesh.particles, vec![ParticleId::new(3), ParticleId::new(7), ParticleId::new(12)]);
        assert_eq!(mesh.faces_of(ParticleId::new(3)).count(), 1);
    }

    #[test]
    fn neighbor_only_particles_get_labels_after_owners() {
        let mut assembler = MeshAssembler::new(1e-6).unwrap();
        // Particle 2 owns no face; its label must not collide with owner 5 -> 2
        assembler.ingest(face(1, 2, square(0.0)));
        assembler.ingest(face(5, 1, square(2.0)));
        let (mesh, _) = assembler.consolidate().unwrap();
        let owners: Vec<u32> = mesh.faces.iter().map(|f| f.owner.get()).collect();
        assert_eq!(owners, vec![1, 2]);
        assert_eq!(mesh.faces[0].neighbor, Neighbor::Particle(ParticleId::new(3)));
        assert_eq!(mesh.faces[1].neighbor, Neighbor::Particle(ParticleId::new(1)));
        assert_eq!(mesh.particles, vec![ParticleId::new(1), ParticleId::new(5), ParticleId::new(2)]);
    }

    #[test]
    fn empty_assembler_gives_empty_mesh() {
        let assembler = MeshAssembler::new(1e-6).unwrap();
        let (mesh, report) = assembler.consolidate().unwrap();
        assert_eq!(mesh, ConsolidatedMesh::default());
        assert_eq!(report.merged_vertices, 0);
    }

    #[test]
    fn consolidation_is_idempotent() {
        let mut assembler = MeshAssembler::new(1e-6).unwrap();
        assembler.ingest(face(1, 2, square(0.0)));
        assembler.ingest(face(2, 1, square(0.0)));
        assembler.ingest(face(2, 1, square(1.0)));
        let (mesh, _) = assembler.consolidate().unwrap();

        let again = MeshAssembler::from_mesh(&mesh, 1e-6).unwrap();
        assert_eq!(again.store().num_vertices(), mesh.num_points());
        let (mesh2, report2) = again.consolidate().unwrap();
        assert_eq!(report2.merged_vertices, 0);
        assert!(report2.dropped_faces.is_empty());
        assert_eq!(mesh2.points, mesh.points);
        let lists = |m: &ConsolidatedMesh| m.faces.iter().map(|f| f.vertices.clone()).collect::<Vec<_>>();
        assert_eq!(lists(&mesh2), lists(&mesh));
    }
}
