pub mod domain;
pub mod polygon_3d;

pub use domain::Domain;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Axis names, indexed like point coordinates.
pub const AXES: [char; 3] = ['x', 'y', 'z'];
