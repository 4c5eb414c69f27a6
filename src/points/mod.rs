//! Labeled surface samples and per-particle reference positions.

mod pattern;

use std::fmt;

pub use pattern::{PointPattern, ReferenceFrames};

use crate::math::Point3;

/// Label of a particle. Positive, assigned in input order starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(u32);

impl ParticleId {
    #[must_use]
    pub const fn new(label: u32) -> Self {
        Self(label)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A surface sample tagged with its owning particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledPoint {
    pub position: Point3,
    pub label: ParticleId,
}

impl LabeledPoint {
    #[must_use]
    pub fn new(position: Point3, label: ParticleId) -> Self {
        Self { position, label }
    }
}
