//! # Constants and type definitions for magswim
//!
//! This module centralizes the **physical constants**, **unit conversions**, **state-vector
//! layout**, and **common type aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Unit conventions: positions along a trajectory are in **meters**, field-map queries are in
//!   **centimeters**, angles exposed to users are in **degrees**, fields are in **kilogauss**.
//! - Index constants for the 6- and 8-component state vectors.
//! - The coupling constant used by the swimmer to turn a field into a curvature.

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// Curvature coupling for a unit charge: `1/R [1/m] = BENDING_CONSTANT * B[kG] / p[GeV/c]`
pub const BENDING_CONSTANT: f64 = 2.99792458e-2;

/// Meters → centimeters
pub const CM_PER_M: f64 = 100.0;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Gauss → kilogauss
pub const KG_PER_GAUSS: f64 = 1.0e-3;

/// Tesla → kilogauss
pub const KG_PER_TESLA: f64 = 10.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Distance in centimeters
pub type Centimeter = f64;
/// Distance in meters
pub type Meter = f64;
/// Magnetic field in kilogauss
pub type KiloGauss = f64;
/// Momentum in GeV/c
pub type GeVc = f64;

// -------------------------------------------------------------------------------------------------
// State vector layout
// -------------------------------------------------------------------------------------------------

/// index for the x component (m)
pub const X_IDX: usize = 0;
/// index for the y component (m)
pub const Y_IDX: usize = 1;
/// index for the z component (m)
pub const Z_IDX: usize = 2;
/// index for the px/p direction cosine
pub const DIRCOSX_IDX: usize = 3;
/// index for the py/p direction cosine
pub const DIRCOSY_IDX: usize = 4;
/// index for the pz/p direction cosine
pub const DIRCOSZ_IDX: usize = 5;
/// index for the accumulated path length (m)
pub const PATHLEN_IDX: usize = 6;
/// index for the accumulated integral |B x dL| (kG-m)
pub const BXDL_IDX: usize = 7;

/// `[x, y, z, ux, uy, uz]`, position in meters and unit direction cosines.
pub type StateVector = [f64; 6];

/// `[x, y, z, ux, uy, uz, pathlen, bdl]`, a [`StateVector`] with cumulative path length (m)
/// and cumulative integral |B×dl| (kG·m).
pub type AugmentedStateVector = [f64; 8];

/// Build the vertex state vector from a position (m) and polar/azimuthal angles (degrees).
pub fn initial_state_vector(
    xo: Meter,
    yo: Meter,
    zo: Meter,
    theta: Degree,
    phi: Degree,
) -> StateVector {
    let theta_rad = theta * RADEG;
    let phi_rad = phi * RADEG;

    let rho = theta_rad.sin();
    [
        xo,
        yo,
        zo,
        rho * phi_rad.cos(),
        rho * phi_rad.sin(),
        theta_rad.cos(),
    ]
}

#[cfg(test)]
mod constants_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_initial_state_vector_along_z() {
        let q = initial_state_vector(0.1, 0.2, 0.3, 0.0, 45.0);
        assert_eq!(&q[..3], &[0.1, 0.2, 0.3]);
        assert_abs_diff_eq!(q[DIRCOSX_IDX], 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(q[DIRCOSY_IDX], 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(q[DIRCOSZ_IDX], 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_initial_state_vector_is_unit() {
        let q = initial_state_vector(0.0, 0.0, 0.0, 37.0, -112.0);
        let norm = (q[3] * q[3] + q[4] * q[4] + q[5] * q[5]).sqrt();
        assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-14);
        assert!(q[DIRCOSY_IDX] < 0.0);
    }
}
