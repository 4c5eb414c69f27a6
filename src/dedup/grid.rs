use crate::error::ConfigError;
use crate::math::{Domain, Point3, Vector3, AXES};

/// Default number of buckets per axis for the sample-cleaning pass.
pub const DEFAULT_BUCKETS: [usize; 3] = [16, 16, 16];

/// Domain box partitioned into `nx * ny * nz` equal buckets.
///
/// Coordinates outside the box are clamped into the border buckets on
/// non-periodic axes and wrapped modulo the bucket count on periodic axes.
#[derive(Debug, Clone)]
pub struct UniformGrid {
    origin: Point3,
    bucket: Vector3,
    dims: [usize; 3],
    periodic: [bool; 3],
}

impl UniformGrid {
    /// Creates a grid covering `domain` with `dims` buckets per axis.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyGrid`] if any axis has zero buckets.
    pub fn new(domain: &Domain, dims: [usize; 3]) -> Result<Self, ConfigError> {
        if dims.iter().any(|&d| d == 0) {
            return Err(ConfigError::EmptyGrid(dims));
        }
        let lengths = domain.lengths();
        #[allow(clippy::cast_precision_loss)]
        let bucket = Vector3::new(
            lengths.x / dims[0] as f64,
            lengths.y / dims[1] as f64,
            lengths.z / dims[2] as f64,
        );
        Ok(Self {
            origin: *domain.min(),
            bucket,
            dims,
            periodic: domain.periodic(),
        })
    }

    /// Creates a grid sized for `count` points: about `count^(1/3)` buckets
    /// per axis, never so many that a bucket edge drops below `epsilon`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn for_point_count(domain: &Domain, count: usize, epsilon: f64) -> Self {
        let target = (count as f64).cbrt().round().max(1.0) as usize;
        let mut dims = [1; 3];
        for (axis, dim) in dims.iter_mut().enumerate() {
            let length = domain.length(axis);
            let mut max_by_epsilon = if epsilon > 0.0 {
                (length / epsilon).floor().max(1.0) as usize
            } else {
                target
            };
            // The division above can round up to the next integer
            while max_by_epsilon > 1 && length / (max_by_epsilon as f64) < epsilon {
                max_by_epsilon -= 1;
            }
            *dim = target.min(max_by_epsilon).max(1);
        }
        let lengths = domain.lengths();
        Self {
            origin: *domain.min(),
            bucket: Vector3::new(
                lengths.x / dims[0] as f64,
                lengths.y / dims[1] as f64,
                lengths.z / dims[2] as f64,
            ),
            dims,
            periodic: domain.periodic(),
        }
    }

    /// Checks that a 27-bucket scan cannot miss a pair closer than `epsilon`.
    ///
    /// Axes with a single bucket are always safe.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositive`] for a non-positive epsilon and
    /// [`ConfigError::BucketTooSmall`] if a bucket edge is below epsilon.
    pub fn validate_tolerance(&self, epsilon: f64) -> Result<(), ConfigError> {
        if !(epsilon.is_finite() && epsilon > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "epsilon",
                value: epsilon,
            });
        }
        for axis in 0..3 {
            if self.dims[axis] > 1 && self.bucket[axis] < epsilon {
                return Err(ConfigError::BucketTooSmall {
                    axis: AXES[axis],
                    bucket: self.bucket[axis],
                    epsilon,
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    #[must_use]
    pub fn bucket_edge(&self) -> Vector3 {
        self.bucket
    }

    #[must_use]
    pub fn num_buckets(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// Bucket coordinates of `point`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn cell_of(&self, point: &Point3) -> [usize; 3] {
        let mut cell = [0; 3];
        for axis in 0..3 {
            let raw = ((point[axis] - self.origin[axis]) / self.bucket[axis]).floor() as i64;
            cell[axis] = self.fold_index(axis, raw);
        }
        cell
    }

    /// Linear bucket index of `point`.
    #[must_use]
    pub fn bucket_of(&self, point: &Point3) -> usize {
        self.linear(self.cell_of(point))
    }

    #[must_use]
    pub fn linear(&self, cell: [usize; 3]) -> usize {
        (cell[2] * self.dims[1] + cell[1]) * self.dims[0] + cell[0]
    }

    /// Displacement from `from` to `to`, reduced to the minimum image on
    /// periodic axes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn separation(&self, from: &Point3, to: &Point3) -> Vector3 {
        let mut d = to - from;
        for axis in 0..3 {
            if self.periodic[axis] {
                let length = self.bucket[axis] * self.dims[axis] as f64;
                d[axis] -= length * (d[axis] / length).round();
            }
        }
        d
    }

    /// Linear indices of the 3x3x3 block around `cell`, each listed once.
    ///
    /// Periodic axes wrap around; non-periodic axes stop at the border.
    pub fn neighborhood_into(&self, cell: [usize; 3], out: &mut Vec<usize>) {
        out.clear();
        for dz in -1..=1 {
            let Some(z) = self.offset(2, cell[2], dz) else {
                continue;
            };
            for dy in -1..=1 {
                let Some(y) = self.offset(1, cell[1], dy) else {
                    continue;
                };
                for dx in -1..=1 {
                    let Some(x) = self.offset(0, cell[0], dx) else {
                        continue;
                    };
                    out.push(self.linear([x, y, z]));
                }
            }
        }
        // Axes with fewer than three buckets visit the same bucket twice
        out.sort_unstable();
        out.dedup();
    }

    #[allow(clippy::cast_possible_wrap)]
    fn offset(&self, axis: usize, index: usize, delta: i64) -> Option<usize> {
        let raw = index as i64 + delta;
        if !self.periodic[axis] && (raw < 0 || raw >= self.dims[axis] as i64) {
            return None;
        }
        Some(self.fold_index(axis, raw))
    }

    /// Wraps (periodic) or clamps (non-periodic) a raw bucket index.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    fn fold_index(&self, axis: usize, raw: i64) -> usize {
        let n = self.dims[axis] as i64;
        let folded = if self.periodic[axis] {
            raw.rem_euclid(n)
        } else {
            raw.clamp(0, n - 1)
        };
        folded as usize
    }
}
