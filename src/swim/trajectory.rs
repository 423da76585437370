//! # Swim trajectories
//!
//! A [`SwimTrajectory`] combines a [`GeneratedParticleRecord`] with a path: an ordered,
//! append-only sequence of state vectors where index 0 is the vertex.
//!
//! State vectors
//! -----------------
//! While the trajectory is being stepped each state vector has six components,
//! `[x, y, z, px/p, py/p, pz/p]` (m, direction cosines). [`SwimTrajectory::compute_bdl`] replaces
//! every vector by its eight-component form `[.., pathlen, bdl]` in one go; the path is then
//! finalized and [`SwimTrajectory::push`] is rejected.
//!
//! The two storage forms are separate variants of a private enum, so a path that is only
//! partly augmented cannot exist.
use std::fmt;

use itertools::{Either, Itertools};
use nalgebra::Point3;
use tracing::trace;

use crate::{
    constants::{
        AugmentedStateVector, Degree, Meter, StateVector, BXDL_IDX, PATHLEN_IDX, RADEG, X_IDX,
        Y_IDX, Z_IDX,
    },
    magfield::MagneticField,
    swim::{
        bxdl::Bxdl,
        particle::{GeneratedParticleRecord, LundId},
    },
    swim_errors::SwimError,
};

#[derive(Debug, Clone, PartialEq)]
enum StatePath {
    Plain(Vec<StateVector>),
    Augmented(Vec<AugmentedStateVector>),
}

/// Particle identity plus the ordered state vectors of one swim.
#[derive(Debug, Clone, PartialEq)]
pub struct SwimTrajectory {
    // the particle that we swam
    gen_part_rec: GeneratedParticleRecord,
    // the lund id, if it is known (i.e. from montecarlo truth)
    lund_id: Option<LundId>,
    path: StatePath,
}

impl SwimTrajectory {
    /// Create an empty trajectory for a generated particle.
    ///
    /// Arguments
    /// -----------------
    /// * `gen_part_rec`: the particle that is swum.
    /// * `capacity`: expected number of state vectors.
    pub fn new(gen_part_rec: GeneratedParticleRecord, capacity: usize) -> Self {
        SwimTrajectory {
            gen_part_rec,
            lund_id: None,
            path: StatePath::Plain(Vec::with_capacity(capacity)),
        }
    }

    /// Create a one point trajectory, holding only the vertex state vector.
    /// Used when the initial momentum is lower than some minimum value.
    ///
    /// Arguments
    /// -----------------
    /// * `charge`: the charge of the particle (-1 for electron, +1 for proton, etc.)
    /// * `xo`, `yo`, `zo`: the vertex position in m
    /// * `momentum`: initial momentum in GeV/c
    /// * `theta`: initial polar angle in degrees
    /// * `phi`: initial azimuthal angle in degrees
    pub fn one_point(
        charge: i32,
        xo: Meter,
        yo: Meter,
        zo: Meter,
        momentum: f64,
        theta: Degree,
        phi: Degree,
    ) -> Self {
        let record = GeneratedParticleRecord::new(charge, xo, yo, zo, momentum, theta, phi);
        SwimTrajectory::from_vertex(record)
    }

    /// Create a trajectory seeded with the vertex state vector of `gen_part_rec`.
    pub fn from_vertex(gen_part_rec: GeneratedParticleRecord) -> Self {
        let mut trajectory = SwimTrajectory::new(gen_part_rec, 1);
        trajectory.path = StatePath::Plain(vec![gen_part_rec.initial_state_vector()]);
        trajectory
    }

    /// Set the lund id. This is not needed for swimming, but is useful for display or when
    /// Monte-Carlo truth is known.
    pub fn set_lund_id(&mut self, lund_id: Option<LundId>) {
        self.lund_id = lund_id;
    }

    pub fn with_lund_id(mut self, lund_id: LundId) -> Self {
        self.lund_id = Some(lund_id);
        self
    }

    /// The lund id, absent when the trajectory was produced by swimming alone.
    pub fn lund_id(&self) -> Option<&LundId> {
        self.lund_id.as_ref()
    }

    pub fn generated_particle_record(&self) -> &GeneratedParticleRecord {
        &self.gen_part_rec
    }

    pub fn charge(&self) -> i32 {
        self.gen_part_rec.charge
    }

    /// original polar angle in degrees
    pub fn original_theta(&self) -> Degree {
        self.gen_part_rec.theta
    }

    /// original azimuthal angle in degrees
    pub fn original_phi(&self) -> Degree {
        self.gen_part_rec.phi
    }

    /// Append a state vector.
    ///
    /// Errors
    /// -----------------
    /// * [`SwimError::TrajectoryFinalized`] once the integral bdl has been computed.
    pub fn push(&mut self, state: StateVector) -> Result<(), SwimError> {
        match &mut self.path {
            StatePath::Plain(states) => {
                states.push(state);
                Ok(())
            }
            StatePath::Augmented(_) => Err(SwimError::TrajectoryFinalized),
        }
    }

    pub fn len(&self) -> usize {
        match &self.path {
            StatePath::Plain(states) => states.len(),
            StatePath::Augmented(states) => states.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The state vector at `index`: 6 components, or 8 once bdl was computed.
    pub fn state(&self, index: usize) -> Option<&[f64]> {
        match &self.path {
            StatePath::Plain(states) => states.get(index).map(|q| q.as_slice()),
            StatePath::Augmented(states) => states.get(index).map(|q| q.as_slice()),
        }
    }

    /// Iterate over the state vectors, vertex first.
    pub fn states(&self) -> impl Iterator<Item = &[f64]> + '_ {
        match &self.path {
            StatePath::Plain(states) => Either::Left(states.iter().map(|q| q.as_slice())),
            StatePath::Augmented(states) => Either::Right(states.iter().map(|q| q.as_slice())),
        }
    }

    /// Iterate over the positions (m), vertex first.
    pub fn positions(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.states()
            .map(|q| Point3::new(q[X_IDX], q[Y_IDX], q[Z_IDX]))
    }

    /// Position (m) of the state vector at `index`.
    pub fn position(&self, index: usize) -> Option<Point3<f64>> {
        self.state(index)
            .map(|q| Point3::new(q[X_IDX], q[Y_IDX], q[Z_IDX]))
    }

    /// Cumulative path length (m) at `index`, once bdl was computed.
    pub fn path_length(&self, index: usize) -> Option<Meter> {
        self.augmented(index).map(|q| q[PATHLEN_IDX])
    }

    /// Cumulative integral |B × dl| (kG·m) at `index`, once bdl was computed.
    pub fn bdl(&self, index: usize) -> Option<f64> {
        self.augmented(index).map(|q| q[BXDL_IDX])
    }

    fn augmented(&self, index: usize) -> Option<&AugmentedStateVector> {
        match &self.path {
            StatePath::Plain(_) => None,
            StatePath::Augmented(states) => states.get(index),
        }
    }

    /// Total path length (m), once bdl was computed.
    pub fn total_path_length(&self) -> Option<Meter> {
        self.path_length(self.len().checked_sub(1)?)
    }

    /// Total integral |B × dl| (kG·m), once bdl was computed.
    pub fn total_bdl(&self) -> Option<f64> {
        self.bdl(self.len().checked_sub(1)?)
    }

    pub fn last_state(&self) -> Option<&[f64]> {
        self.state(self.len().checked_sub(1)?)
    }

    /// The final position (m), `None` for an empty trajectory.
    pub fn final_position(&self) -> Option<Point3<f64>> {
        self.position(self.len().checked_sub(1)?)
    }

    /// Distance (m) of the final position from the origin; NaN for an empty trajectory.
    pub fn final_r(&self) -> Meter {
        self.final_position()
            .map_or(f64::NAN, |p| p.coords.norm())
    }

    /// Average azimuth (degrees) of the trajectory based on positions, not directions.
    ///
    /// Every fifth position from index 5 on is sampled. Trajectories with fewer than six points
    /// return the original φ.
    pub fn average_phi(&self) -> Degree {
        if self.len() < 6 {
            return self.original_phi();
        }

        let (sum, count) = self
            .states()
            .skip(5)
            .step_by(5)
            .fold((0.0, 0usize), |(sum, count), q| {
                (sum + q[Y_IDX].atan2(q[X_IDX]), count + 1)
            });

        sum / count as f64 / RADEG
    }

    /// Check whether the accumulated integral bdl has been computed.
    pub fn is_bdl_computed(&self) -> bool {
        matches!(self.path, StatePath::Augmented(_))
    }

    /// Compute the integral |B × dl|.
    ///
    /// Every state vector is replaced by `[x, y, z, px/p, py/p, pz/p, l, bdl]` where `l` is the
    /// cumulative path length in m and `bdl` the cumulative integral in kG·m. The first point
    /// gets `l = bdl = 0`. Calling this again is a no-op.
    ///
    /// Arguments
    /// -----------------
    /// * `field`: the field the particle was swum in.
    pub fn compute_bdl(&mut self, field: &dyn MagneticField) {
        let StatePath::Plain(states) = &self.path else {
            return;
        };

        let mut augmented = Vec::with_capacity(states.len());
        let mut current = Bxdl::default();

        if let Some(first) = states.first() {
            augmented.push(augment(first, &current));
        }

        for (p0, p1) in states.iter().tuple_windows() {
            current = Bxdl::accumulate(&current, p0, p1, field);
            augmented.push(augment(p1, &current));
        }

        trace!(
            points = augmented.len(),
            path_length = current.path_length(),
            bdl = current.integral_bxdl(),
            "integral bdl computed"
        );
        self.path = StatePath::Augmented(augmented);
    }
}

// extend a 6D state vector with path length (m) and integral bdl (kG-m)
fn augment(q: &StateVector, totals: &Bxdl) -> AugmentedStateVector {
    let mut newq = [0.0; 8];
    newq[..6].copy_from_slice(q);
    newq[PATHLEN_IDX] = totals.path_length();
    newq[BXDL_IDX] = totals.integral_bxdl();
    newq
}

impl fmt::Display for SwimTrajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rec = &self.gen_part_rec;
        match &self.lund_id {
            Some(lid) => write!(f, "{lid}")?,
            None => write!(f, "Q {:+}", rec.charge)?,
        }
        write!(
            f,
            " p {:.3} GeV/c θ {:.2}° φ {:.2}°",
            rec.momentum, rec.theta, rec.phi
        )?;
        if let (Some(l), Some(bdl)) = (self.total_path_length(), self.total_bdl()) {
            write!(f, " path {l:.3} m ∫|B×dl| {bdl:.3} kG·m")?;
        }
        Ok(())
    }
}
