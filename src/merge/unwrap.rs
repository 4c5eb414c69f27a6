use crate::error::ConfigError;
use crate::math::{Domain, Point3, Vector3};

/// Minimum-image correction that moves a wrapped seed's faces back into the
/// frame of its particle's reference sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicUnwrap {
    lengths: Vector3,
    periodic: [bool; 3],
    threshold: Vector3,
}

impl PeriodicUnwrap {
    /// Creates the correction for `domain`.
    ///
    /// `threshold` is the per-axis displacement beyond which a seed counts as
    /// wrapped; it defaults to half the domain length.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositive`] for a non-positive threshold.
    pub fn new(domain: &Domain, threshold: Option<[f64; 3]>) -> Result<Self, ConfigError> {
        let lengths = domain.lengths();
        let threshold = match threshold {
            Some(t) => {
                for (axis, &value) in t.iter().enumerate() {
                    if !(value.is_finite() && value > 0.0) {
                        return Err(ConfigError::NonPositive {
                            name: THRESHOLD_NAMES[axis],
                            value,
                        });
                    }
                }
                Vector3::from(t)
            }
            None => lengths * 0.5,
        };
        Ok(Self {
            lengths,
            periodic: domain.periodic(),
            threshold,
        })
    }

    /// Correction that never shifts anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            lengths: Vector3::zeros(),
            periodic: [false; 3],
            threshold: Vector3::zeros(),
        }
    }

    #[must_use]
    pub fn threshold(&self) -> Vector3 {
        self.threshold
    }

    /// Translation to apply to a cell whose seed sits at `seed` when its
    /// particle is anchored at `reference`.
    ///
    /// Each periodic axis with `d^2 > threshold^2`, `d = seed - reference`,
    /// is shifted by the whole number of periods nearest to `-d`, and by at
    /// least one.
    #[must_use]
    pub fn shift(&self, seed: &Point3, reference: &Point3) -> Vector3 {
        let mut shift = Vector3::zeros();
        for axis in 0..3 {
            if !self.periodic[axis] {
                continue;
            }
            let d = seed[axis] - reference[axis];
            let t = self.threshold[axis];
            if d * d > t * t {
                let length = self.lengths[axis];
                let mut periods = (d / length).round();
                if periods == 0.0 {
                    periods = d.signum();
                }
                shift[axis] = -periods * length;
            }
        }
        shift
    }

    /// Shifts `points` in place.
    pub fn apply(points: &mut [Point3], shift: &Vector3) {
        if *shift == Vector3::zeros() {
            return;
        }
        for p in points {
            *p += *shift;
        }
    }
}

const THRESHOLD_NAMES: [&str; 3] = ["wrap_threshold.x", "wrap_threshold.y", "wrap_threshold.z"];
