//! # Magnetic fields: sources, maps, and composition
//!
//! A magnetic field in this crate is anything implementing [`MagneticField`]: a read-only
//! capability that returns the field vector (kilogauss) at a point given either in
//! **Cartesian** (x, y, z in cm) or **cylindrical** (φ in degrees, ρ and z in cm) coordinates.
//!
//! Modules
//! -----------------
//! * [`uniform`](crate::magfield::uniform) – Analytic constant field.
//! * [`grid_field`](crate::magfield::grid_field) – Field map on a regular grid, loaded once from a binary file.
//! * [`field_map_reader`](crate::magfield::field_map_reader) – `nom` parser and writer for the binary field-map layout.
//! * [`composite`](crate::magfield::composite) – Vector sum of several sources, itself a source.
//!
//! Readiness
//! -----------------
//! Every source carries a readiness flag ([`MagneticField::is_field_loaded`]). Querying a source that
//! is not loaded is allowed but returns a meaningless value (NaN for grid maps); callers check
//! the flag before trusting results.
//!
//! Concurrency
//! -----------------
//! Sources are `Send + Sync` and immutable once loaded, so an `Arc<dyn MagneticField>` can be
//! queried from any number of threads without locking.
use std::fmt::Debug;

use nalgebra::Vector3;

use crate::constants::{Centimeter, Degree, KiloGauss, RADEG};

pub mod composite;
pub mod field_map_reader;
pub mod grid_field;
pub mod uniform;

/// Coordinate system of a query point, a grid axis set, or stored field components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordFrame {
    Cylindrical,
    Cartesian,
}

/// A query point in one of the two supported coordinate frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldPoint {
    /// x, y, z in cm
    Cartesian { x: Centimeter, y: Centimeter, z: Centimeter },
    /// φ in degrees, ρ and z in cm
    Cylindrical { phi: Degree, rho: Centimeter, z: Centimeter },
}

impl FieldPoint {
    pub fn frame(&self) -> CoordFrame {
        match self {
            FieldPoint::Cartesian { .. } => CoordFrame::Cartesian,
            FieldPoint::Cylindrical { .. } => CoordFrame::Cylindrical,
        }
    }

    /// Express the point in Cartesian coordinates (cm).
    pub fn to_cartesian(&self) -> Vector3<f64> {
        match *self {
            FieldPoint::Cartesian { x, y, z } => Vector3::new(x, y, z),
            FieldPoint::Cylindrical { phi, rho, z } => {
                let phi_rad = phi * RADEG;
                Vector3::new(rho * phi_rad.cos(), rho * phi_rad.sin(), z)
            }
        }
    }

    /// Express the point in cylindrical coordinates `(φ [deg], ρ [cm], z [cm])`.
    /// φ is returned in (-180, 180].
    pub fn to_cylindrical(&self) -> (Degree, Centimeter, Centimeter) {
        match *self {
            FieldPoint::Cartesian { x, y, z } => (y.atan2(x) / RADEG, x.hypot(y), z),
            FieldPoint::Cylindrical { phi, rho, z } => (phi, rho, z),
        }
    }
}

/// Queryable magnetic-field provider.
///
/// Implementors provide the two coordinate forms writing into a caller-owned buffer, so that
/// aggregating callers (see [`CompositeField`](crate::magfield::composite::CompositeField)) can
/// reuse one scratch vector. Magnitude helpers and the [`FieldPoint`] dispatch are provided.
///
/// Units
/// -----------------
/// * Cartesian input in cm, cylindrical input φ in degrees and ρ, z in cm.
/// * Output field components are Cartesian (Bx, By, Bz) in kilogauss.
pub trait MagneticField: Debug + Send + Sync {
    /// Obtain the field at a location expressed in Cartesian coordinates (cm).
    fn field(&self, x: Centimeter, y: Centimeter, z: Centimeter, result: &mut Vector3<KiloGauss>);

    /// Obtain the field at a location expressed in cylindrical coordinates.
    fn field_cylindrical(
        &self,
        phi: Degree,
        rho: Centimeter,
        z: Centimeter,
        result: &mut Vector3<KiloGauss>,
    );

    /// Whether the underlying data finished loading.
    fn is_field_loaded(&self) -> bool;

    /// Upper bound on the field magnitude in kilogauss, used for normalization and step-size
    /// heuristics.
    fn max_field_magnitude(&self) -> KiloGauss;

    /// Short human-readable name for diagnostics.
    fn name(&self) -> &str;

    /// Evaluate the field at a [`FieldPoint`].
    fn field_at(&self, point: FieldPoint) -> Vector3<KiloGauss> {
        let mut result = Vector3::zeros();
        match point {
            FieldPoint::Cartesian { x, y, z } => self.field(x, y, z, &mut result),
            FieldPoint::Cylindrical { phi, rho, z } => {
                self.field_cylindrical(phi, rho, z, &mut result)
            }
        }
        result
    }

    /// Field magnitude in kilogauss at a Cartesian location (cm). NaN/Inf propagate.
    fn field_magnitude(&self, x: Centimeter, y: Centimeter, z: Centimeter) -> KiloGauss {
        self.field_at(FieldPoint::Cartesian { x, y, z }).norm()
    }

    /// Field magnitude in kilogauss at a cylindrical location. NaN/Inf propagate.
    fn field_magnitude_cylindrical(
        &self,
        phi: Degree,
        rho: Centimeter,
        z: Centimeter,
    ) -> KiloGauss {
        self.field_at(FieldPoint::Cylindrical { phi, rho, z })
            .norm()
    }

    /// Field magnitude in kilogauss at a [`FieldPoint`].
    fn magnitude_at(&self, point: FieldPoint) -> KiloGauss {
        self.field_at(point).norm()
    }
}

#[cfg(test)]
mod magfield_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_field_point_conversions() {
        let p = FieldPoint::Cylindrical {
            phi: 90.0,
            rho: 2.0,
            z: -1.0,
        };
        let c = p.to_cartesian();
        assert_relative_eq!(c.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.y, 2.0, epsilon = 1e-12);
        assert_eq!(c.z, -1.0);

        let q = FieldPoint::Cartesian {
            x: -3.0,
            y: 0.0,
            z: 4.0,
        };
        let (phi, rho, z) = q.to_cylindrical();
        assert_relative_eq!(phi, 180.0, epsilon = 1e-12);
        assert_relative_eq!(rho, 3.0);
        assert_eq!(z, 4.0);
        assert_eq!(q.frame(), CoordFrame::Cartesian);
        assert_eq!(p.frame(), CoordFrame::Cylindrical);
    }
}
