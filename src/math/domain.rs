use crate::error::ConfigError;

use super::{Point3, Vector3, AXES};

/// Axis-aligned simulation box with per-axis periodic flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    min: Point3,
    max: Point3,
    periodic: [bool; 3],
}

impl Domain {
    /// Creates a domain from its corners.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBounds`] if any coordinate is not finite
    /// or `min >= max` on some axis.
    pub fn new(min: Point3, max: Point3, periodic: [bool; 3]) -> Result<Self, ConfigError> {
        for axis in 0..3 {
            let (lo, hi) = (min[axis], max[axis]);
            if !lo.is_finite() || !hi.is_finite() || lo >= hi {
                return Err(ConfigError::InvalidBounds {
                    axis: AXES[axis],
                    min: lo,
                    max: hi,
                });
            }
        }
        Ok(Self { min, max, periodic })
    }

    /// Non-periodic box enclosing `points`, padded by `pad` on every side.
    ///
    /// Returns `None` for an empty point set.
    #[must_use]
    pub fn enclosing(points: impl IntoIterator<Item = Point3>, pad: f64) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min, mut max) = (first, first);
        for p in iter {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        let pad = pad.max(super::TOLERANCE);
        for axis in 0..3 {
            min[axis] -= pad;
            max[axis] += pad;
        }
        Some(Self {
            min,
            max,
            periodic: [false; 3],
        })
    }

    #[must_use]
    pub fn min(&self) -> &Point3 {
        &self.min
    }

    #[must_use]
    pub fn max(&self) -> &Point3 {
        &self.max
    }

    #[must_use]
    pub fn periodic(&self) -> [bool; 3] {
        self.periodic
    }

    #[must_use]
    pub fn is_periodic(&self, axis: usize) -> bool {
        self.periodic[axis]
    }

    /// Returns `true` if any axis is periodic.
    #[must_use]
    pub fn has_periodic_axis(&self) -> bool {
        self.periodic.iter().any(|&p| p)
    }

    /// Edge lengths of the box.
    #[must_use]
    pub fn lengths(&self) -> Vector3 {
        self.max - self.min
    }

    #[must_use]
    pub fn length(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }

    /// Maps `point` into the box.
    ///
    /// Periodic axes are wrapped into `[min, max)`. Returns `None` if the
    /// point lies outside the box on a non-periodic axis.
    #[must_use]
    pub fn wrap(&self, point: &Point3) -> Option<Point3> {
        let mut wrapped = *point;
        for axis in 0..3 {
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if self.periodic[axis] {
                let len = hi - lo;
                let mut v = lo + (point[axis] - lo).rem_euclid(len);
                // rem_euclid can round up to exactly `len`
                if v >= hi {
                    v = lo;
                }
                wrapped[axis] = v;
            } else if point[axis] < lo || point[axis] > hi {
                return None;
            }
        }
        Some(wrapped)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn box10(periodic: [bool; 3]) -> Domain {
        Domain::new(p(0.0, 0.0, 0.0), p(10.0, 10.0, 10.0), periodic).unwrap()
    }

    #[test]
    fn rejects_inverted_bounds() {
        let err = Domain::new(p(0.0, 5.0, 0.0), p(1.0, 1.0, 1.0), [false; 3]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBounds { axis: 'y', .. }));
    }

    #[test]
    fn rejects_non_finite_bounds() {
        let err = Domain::new(p(0.0, 0.0, f64::NAN), p(1.0, 1.0, 1.0), [false; 3]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBounds { axis: 'z', .. }));
    }

    #[test]
    fn lengths_per_axis() {
        let d = Domain::new(p(-1.0, 0.0, 2.0), p(1.0, 3.0, 6.0), [false; 3]).unwrap();
        assert_relative_eq!(d.lengths(), Vector3::new(2.0, 3.0, 4.0));
        assert_relative_eq!(d.length(2), 4.0);
    }

    #[test]
    fn wrap_periodic_axes() {
        let d = box10([true, true, false]);
        let w = d.wrap(&p(-0.5, 12.0, 3.0)).unwrap();
        assert_relative_eq!(w, p(9.5, 2.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn wrap_rejects_outside_non_periodic() {
        let d = box10([true, false, false]);
        assert!(d.wrap(&p(5.0, 10.5, 5.0)).is_none());
        assert!(d.wrap(&p(15.0, 5.0, 5.0)).is_some());
    }

    #[test]
    fn enclosing_box_is_padded() {
        let d = Domain::enclosing([p(0.0, 0.0, 0.0), p(2.0, 1.0, 0.0)], 0.5).unwrap();
        assert_relative_eq!(*d.min(), p(-0.5, -0.5, -0.5));
        assert_relative_eq!(*d.max(), p(2.5, 1.5, 0.5));
        assert!(!d.has_periodic_axis());
        assert!(Domain::enclosing(std::iter::empty(), 1.0).is_none());
    }
}
