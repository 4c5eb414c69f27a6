//! Per-seed cell geometry supplied by an external tessellation engine.
//!
//! The crate does not construct Voronoi cells itself. A [`TessellationEngine`]
//! turns a seed set into one [`CellOutcome`] per seed; [`VoroCommand`] drives
//! the `voro++` command-line tool.

mod parse;
mod voro;

pub use parse::parse_cell_line;
pub use voro::VoroCommand;

use std::io::{self, Write};

use crate::error::Result;
use crate::math::polygon_3d::{polygon_area_3d, polyhedron_volume};
use crate::math::{Domain, Point3};

/// Raw geometry of one seed's cell, as reported by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    pub seed: usize,
    pub position: Point3,
    /// Cell vertices in absolute coordinates.
    pub vertices: Vec<Point3>,
    /// Count-prefixed flattened face adjacency: for each face, the number of
    /// vertices followed by that many indices into `vertices`.
    pub face_vertices: Vec<usize>,
    /// Neighbor seed id per face. Negative ids are domain walls.
    pub neighbors: Vec<i32>,
    pub surface_area: f64,
    pub volume: f64,
}

impl RawCell {
    /// Builds a cell from explicit faces, computing its area and volume.
    #[must_use]
    pub fn from_geometry(
        seed: usize,
        position: Point3,
        vertices: Vec<Point3>,
        faces: &[Vec<usize>],
        neighbors: Vec<i32>,
    ) -> Self {
        let polygons: Vec<Vec<Point3>> = faces
            .iter()
            .map(|face| face.iter().filter_map(|&i| vertices.get(i).copied()).collect())
            .collect();
        let surface_area = polygons.iter().map(|poly| polygon_area_3d(poly)).sum();
        let volume = polyhedron_volume(polygons.iter().map(Vec::as_slice));
        Self {
            seed,
            position,
            vertices,
            face_vertices: flatten_faces(faces),
            neighbors,
            surface_area,
            volume,
        }
    }

    /// Number of faces declared by the neighbor list.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.neighbors.len()
    }
}

/// Encodes faces as a count-prefixed index list.
#[must_use]
pub fn flatten_faces(faces: &[Vec<usize>]) -> Vec<usize> {
    let mut flat = Vec::with_capacity(faces.iter().map(|f| f.len() + 1).sum());
    for face in faces {
        flat.push(face.len());
        flat.extend_from_slice(face);
    }
    flat
}

/// Engine result for one seed.
#[derive(Debug, Clone, PartialEq)]
pub enum CellOutcome {
    Computed(RawCell),
    /// The engine could not compute this seed's cell.
    Degenerate { seed: usize },
}

impl CellOutcome {
    #[must_use]
    pub fn seed(&self) -> usize {
        match self {
            Self::Computed(cell) => cell.seed,
            Self::Degenerate { seed } => *seed,
        }
    }
}

/// Capability that computes the Voronoi cell of every seed.
pub trait TessellationEngine {
    /// Tessellates `domain` around `seeds`. Seed ids are indices into
    /// `seeds`; the result holds one outcome per seed, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine as a whole fails. Individual cells
    /// that cannot be computed are reported as [`CellOutcome::Degenerate`].
    fn tessellate(&self, domain: &Domain, seeds: &[Point3]) -> Result<Vec<CellOutcome>>;
}

/// Surface area and volume of one computed cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellStatistics {
    pub seed: usize,
    pub surface_area: f64,
    pub volume: f64,
}

impl From<&RawCell> for CellStatistics {
    fn from(cell: &RawCell) -> Self {
        Self {
            seed: cell.seed,
            surface_area: cell.surface_area,
            volume: cell.volume,
        }
    }
}

/// Statistics of every computed cell, in outcome order.
#[must_use]
pub fn cell_statistics(outcomes: &[CellOutcome]) -> Vec<CellStatistics> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            CellOutcome::Computed(cell) => Some(CellStatistics::from(cell)),
            CellOutcome::Degenerate { .. } => None,
        })
        .collect()
}

/// Writes one `seed area volume` line per cell.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_statistics<W: Write>(out: &mut W, statistics: &[CellStatistics]) -> io::Result<()> {
    for stats in statistics {
        writeln!(out, "{} {} {}", stats.seed, stats.surface_area, stats.volume)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn unit_cube(seed: usize) -> RawCell {
        let vertices = vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(0.0, 0.0, 1.0),
            p(1.0, 0.0, 1.0),
            p(1.0, 1.0, 1.0),
            p(0.0, 1.0, 1.0),
        ];
        let faces = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![2, 3, 7, 6],
            vec![0, 4, 7, 3],
            vec![1, 2, 6, 5],
        ];
        RawCell::from_geometry(seed, p(0.5, 0.5, 0.5), vertices, &faces, vec![-1; 6])
    }

    #[test]
    fn flatten_prefixes_counts() {
        let flat = flatten_faces(&[vec![0, 1, 2], vec![3, 4, 5, 6]]);
        assert_eq!(flat, vec![3, 0, 1, 2, 4, 3, 4, 5, 6]);
    }

    #[test]
    fn from_geometry_measures_cell() {
        let cell = unit_cube(0);
        assert_eq!(cell.face_count(), 6);
        assert_relative_eq!(cell.surface_area, 6.0, epsilon = 1e-12);
        assert_relative_eq!(cell.volume, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn statistics_skip_degenerate_seeds() {
        let outcomes = vec![CellOutcome::Computed(unit_cube(0)), CellOutcome::Degenerate { seed: 1 }];
        let stats = cell_statistics(&outcomes);
        assert_eq!(stats.len(), 1);
        let mut out = Vec::new();
        write_statistics(&mut out, &stats).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 6 1\n");
        assert_eq!(outcomes[1].seed(), 1);
    }
}
