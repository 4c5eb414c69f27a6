use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::dedup::{SpatialDeduplicator, UniformGrid};
use crate::error::ConfigError;
use crate::math::{Domain, Point3};

use super::{LabeledPoint, ParticleId};

/// Ordered collection of labeled points.
///
/// Displays as the plain-text dump format: one `x y z label` line per point
/// with fixed-width coordinate fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointPattern {
    points: Vec<LabeledPoint>,
}

impl PointPattern {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, position: Point3, label: ParticleId) {
        self.points.push(LabeledPoint::new(position, label));
    }

    pub fn extend(&mut self, points: impl IntoIterator<Item = LabeledPoint>) {
        self.points.extend(points);
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
    pub fn points(&self) -> &[LabeledPoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabeledPoint> {
        self.points.iter()
    }

    /// First sample of every particle, used as the periodic unwrap anchor.
    #[must_use]
    pub fn reference_frames(&self) -> ReferenceFrames {
        let mut anchors = BTreeMap::new();
        for point in &self.points {
            anchors.entry(point.label).or_insert(point.position);
        }
        ReferenceFrames { anchors }
    }

    /// Moves every point into `domain`.
    ///
    /// Periodic axes are wrapped; points outside a non-periodic axis are
    /// dropped. Returns the number of dropped points.
    pub fn wrap_into(&mut self, domain: &Domain) -> usize {
        let before = self.points.len();
        self.points = self
            .points
            .iter()
            .filter_map(|p| domain.wrap(&p.position).map(|w| LabeledPoint::new(w, p.label)))
            .collect();
        before - self.points.len()
    }

    /// Removes points within `epsilon` of an earlier point, keeping the
    /// first of each cluster. Returns the number of removed points.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `epsilon` is not positive or larger than
    /// the grid's bucket edge.
    pub fn remove_duplicates(
        &mut self,
        epsilon: f64,
        grid: UniformGrid,
    ) -> Result<usize, ConfigError> {
        let mut dedup = SpatialDeduplicator::new(grid, epsilon)?;
        for (index, point) in self.points.iter().enumerate() {
            dedup.insert(point.position, index);
        }
        let map = dedup.remove_duplicates();
        let before = self.points.len();
        self.points = map
            .iter()
            .filter(|&(id, rep)| id == rep)
            .map(|(id, _)| self.points[*dedup.payload(id)])
            .collect();
        let removed = before - self.points.len();
        debug!(removed, kept = self.points.len(), "removed duplicate samples");
        Ok(removed)
    }
}

impl FromIterator<LabeledPoint> for PointPattern {
    fn from_iter<I: IntoIterator<Item = LabeledPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for PointPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.points {
            writeln!(
                f,
                "{:>15.8} {:>15.8} {:>15.8} {}",
                p.position.x, p.position.y, p.position.z, p.label
            )?;
        }
        Ok(())
    }
}

/// Reference position per particle (its first sample).
#[derive(Debug, Clone, Default)]
pub struct ReferenceFrames {
    anchors: BTreeMap<ParticleId, Point3>,
}

impl ReferenceFrames {
    #[must_use]
    pub fn anchor(&self, particle: ParticleId) -> Option<&Point3> {
        self.anchors.get(&particle)
    }

    pub fn insert(&mut self, particle: ParticleId, anchor: Point3) {
        self.anchors.insert(particle, anchor);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dedup::DEFAULT_BUCKETS;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn domain(periodic: [bool; 3]) -> Domain {
        Domain::new(p(0.0, 0.0, 0.0), p(10.0, 10.0, 10.0), periodic).unwrap()
    }

    #[test]
    fn display_uses_fixed_width_fields() {
        let mut pattern = PointPattern::new();
        pattern.add_point(p(1.0, -2.5, 0.125), ParticleId::new(7));
        let text = pattern.to_string();
        assert_eq!(text, "     1.00000000     -2.50000000      0.12500000 7\n");
    }

    #[test]
    fn reference_frames_keep_first_sample() {
        let mut pattern = PointPattern::new();
        pattern.add_point(p(1.0, 1.0, 1.0), ParticleId::new(1));
        pattern.add_point(p(2.0, 2.0, 2.0), ParticleId::new(2));
        pattern.add_point(p(3.0, 3.0, 3.0), ParticleId::new(1));
        let frames = pattern.reference_frames();
        assert_eq!(frames.len(), 2);
        assert_relative_eq!(*frames.anchor(ParticleId::new(1)).unwrap(), p(1.0, 1.0, 1.0));
        assert!(frames.anchor(ParticleId::new(3)).is_none());
    }

    #[test]
    fn wrap_into_drops_points_outside_closed_axes() {
        let mut pattern = PointPattern::new();
        pattern.add_point(p(-1.0, 5.0, 5.0), ParticleId::new(1));
        pattern.add_point(p(5.0, 11.0, 5.0), ParticleId::new(1));
        let dropped = pattern.wrap_into(&domain([true, false, false]));
        assert_eq!(dropped, 1);
        assert_relative_eq!(pattern.points()[0].position, p(9.0, 5.0, 5.0));
    }

    #[test]
    fn remove_duplicates_keeps_first_of_cluster() {
        let mut pattern = PointPattern::new();
        pattern.add_point(p(1.0, 1.0, 1.0), ParticleId::new(1));
        pattern.add_point(p(1.0, 1.0, 1.0 + 1e-9), ParticleId::new(2));
        pattern.add_point(p(4.0, 1.0, 1.0), ParticleId::new(2));
        let grid = UniformGrid::new(&domain([false; 3]), DEFAULT_BUCKETS).unwrap();
        let removed = pattern.remove_duplicates(1e-6, grid).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(pattern.len(), 2);
        assert_eq!(pattern.points()[0].label, ParticleId::new(1));
        assert_eq!(pattern.points()[1].label, ParticleId::new(2));
    }

    #[test]
    fn wrapped_samples_merge_across_periodic_face() {
        let domain = domain([true; 3]);
        let mut pattern = PointPattern::new();
        pattern.add_point(p(10.001, 5.0, 5.0), ParticleId::new(1));
        pattern.add_point(p(9.9995, 5.0, 5.0), ParticleId::new(2));
        assert_eq!(pattern.wrap_into(&domain), 0);
        let grid = UniformGrid::new(&domain, DEFAULT_BUCKETS).unwrap();
        let removed = pattern.remove_duplicates(0.01, grid).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(pattern.len(), 1);
        assert_relative_eq!(pattern.points()[0].position, p(0.001, 5.0, 5.0), epsilon = 1e-9);
    }
}
