//! Running totals for the path integral of |B × dl| along a trajectory.

use nalgebra::Vector3;

use crate::{
    constants::{KiloGauss, Meter, CM_PER_M, X_IDX, Y_IDX, Z_IDX},
    magfield::MagneticField,
};

/// Cumulative path length (m) and integral |B × dl| (kG·m) up to some point of a trajectory.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bxdl {
    path_length: Meter,
    integral_bxdl: f64,
}

impl Bxdl {
    pub fn new(path_length: Meter, integral_bxdl: f64) -> Self {
        Bxdl {
            path_length,
            integral_bxdl,
        }
    }

    /// accumulated path length in m
    pub fn path_length(&self) -> Meter {
        self.path_length
    }

    /// accumulated integral |B × dl| in kG·m
    pub fn integral_bxdl(&self) -> f64 {
        self.integral_bxdl
    }

    /// Advance the totals over one segment `p0 → p1`.
    ///
    /// The field is sampled at the midpoint of the segment. Positions are read from the first
    /// three components of each state vector (meters).
    ///
    /// Arguments
    /// -----------------
    /// * `previous`: totals at `p0`.
    /// * `p0`, `p1`: consecutive state vectors (6 or 8 components).
    /// * `field`: the field the trajectory was swum in.
    ///
    /// Return
    /// ----------
    /// * Totals at `p1`.
    pub fn accumulate(
        previous: &Bxdl,
        p0: &[f64],
        p1: &[f64],
        field: &dyn MagneticField,
    ) -> Bxdl {
        let r0 = Vector3::new(p0[X_IDX], p0[Y_IDX], p0[Z_IDX]);
        let r1 = Vector3::new(p1[X_IDX], p1[Y_IDX], p1[Z_IDX]);
        let dl = r1 - r0;

        let mid = (r0 + r1) * (0.5 * CM_PER_M);
        let mut b: Vector3<KiloGauss> = Vector3::zeros();
        field.field(mid.x, mid.y, mid.z, &mut b);

        Bxdl {
            path_length: previous.path_length + dl.norm(),
            integral_bxdl: previous.integral_bxdl + b.cross(&dl).norm(),
        }
    }
}
