use crate::error::ConfigError;
use crate::math::Point3;

use super::UniformGrid;

/// Spatial hash that collapses points closer than a tolerance.
///
/// Points are bucketed on a [`UniformGrid`] as they are inserted. Duplicate
/// collapse visits points in insertion order; each point either joins the
/// earliest representative within `epsilon` in its 27-bucket neighborhood or
/// becomes a representative itself. The result only depends on the
/// insertion order and `epsilon`.
///
/// Single writer: callers running in parallel must funnel inserts through
/// one thread in a fixed order.
#[derive(Debug, Clone)]
pub struct SpatialDeduplicator<T> {
    grid: UniformGrid,
    epsilon: f64,
    points: Vec<Point3>,
    payloads: Vec<T>,
    buckets: Vec<Vec<usize>>,
}

impl<T> SpatialDeduplicator<T> {
    /// Creates an empty deduplicator.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `epsilon` is not positive or the grid
    /// buckets are smaller than `epsilon`.
    pub fn new(grid: UniformGrid, epsilon: f64) -> Result<Self, ConfigError> {
        grid.validate_tolerance(epsilon)?;
        let buckets = vec![Vec::new(); grid.num_buckets()];
        Ok(Self {
            grid,
            epsilon,
            points: Vec::new(),
            payloads: Vec::new(),
            buckets,
        })
    }

    /// Stores a point and returns its id. Ids are dense, starting at 0.
    pub fn insert(&mut self, point: Point3, payload: T) -> usize {
        let id = self.points.len();
        let bucket = self.grid.bucket_of(&point);
        self.points.push(point);
        self.payloads.push(payload);
        self.buckets[bucket].push(id);
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[must_use]
    pub fn point(&self, id: usize) -> &Point3 {
        &self.points[id]
    }

    #[must_use]
    pub fn payload(&self, id: usize) -> &T {
        &self.payloads[id]
    }

    /// Collapses every point within `epsilon` of an earlier representative.
    #[must_use]
    pub fn remove_duplicates(&self) -> SubstitutionMap {
        let eps_sq = self.epsilon * self.epsilon;
        let mut representative: Vec<usize> = Vec::with_capacity(self.points.len());
        let mut neighborhood = Vec::with_capacity(27);

        for (id, point) in self.points.iter().enumerate() {
            let cell = self.grid.cell_of(point);
            self.grid.neighborhood_into(cell, &mut neighborhood);

            let mut best: Option<usize> = None;
            for &bucket in &neighborhood {
                // Buckets hold ids in insertion order
                for &other in &self.buckets[bucket] {
                    if other >= id || best.is_some_and(|b| other >= b) {
                        break;
                    }
                    if representative[other] != other {
                        continue;
                    }
                    if self.grid.separation(point, &self.points[other]).norm_squared() < eps_sq {
                        best = Some(other);
                        break;
                    }
                }
            }
            representative.push(best.unwrap_or(id));
        }

        SubstitutionMap { representative }
    }
}

/// Mapping from every inserted id to the id of its representative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionMap {
    representative: Vec<usize>,
}

impl SubstitutionMap {
    /// Builds a map from raw `id -> target` entries.
    ///
    /// Entries may form chains; see [`AliasMap`](crate::mesh::AliasMap) for
    /// resolution.
    #[must_use]
    pub fn from_targets(representative: Vec<usize>) -> Self {
        Self { representative }
    }

    #[must_use]
    pub fn representative(&self, id: usize) -> usize {
        self.representative[id]
    }

    #[must_use]
    pub fn is_representative(&self, id: usize) -> bool {
        self.representative[id] == id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.representative.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.representative.is_empty()
    }

    /// Number of ids that map to a different id.
    #[must_use]
    pub fn merged_count(&self) -> usize {
        self.representative
            .iter()
            .enumerate()
            .filter(|&(id, &rep)| id != rep)
            .count()
    }

    /// Iterates `(id, representative)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.representative.iter().copied().enumerate()
    }
}
