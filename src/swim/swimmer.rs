//! # Swimmer: stepping a charged particle through a field
//!
//! The [`Swimmer`] integrates the state vector `Q = [x, y, z, ux, uy, uz]` as a function of the
//! path length `s` (m):
//!
//! ```text
//! dr/ds = u
//! du/ds = (q · κ / p) · (u × B)        κ = 0.0299792458 (GeV/c)/(kG·m)
//! ```
//!
//! with `B` in kilogauss and `p` in GeV/c, using the classical fourth-order Runge–Kutta scheme
//! with a fixed step. The direction is renormalized after each step.
//!
//! Stopping
//! -----------------
//! A swim stops when any of these holds:
//! * the path length reaches [`SwimParams::max_path_length`] (the last step is shortened to land on it),
//! * the distance from the origin reaches [`SwimParams::max_radius`],
//! * [`SwimParams::max_steps`] steps were taken.
//!
//! Particles with momentum below [`SwimParams::min_momentum`] are not stepped: a one-point
//! trajectory holding the vertex is returned.
use std::cmp::Ordering::{Equal, Greater};
use std::sync::Arc;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    constants::{
        Degree, GeVc, Meter, StateVector, BENDING_CONSTANT, CM_PER_M, DIRCOSX_IDX, DIRCOSY_IDX,
        DIRCOSZ_IDX, X_IDX, Y_IDX, Z_IDX,
    },
    magfield::MagneticField,
    swim::{particle::GeneratedParticleRecord, trajectory::SwimTrajectory},
    swim_errors::SwimError,
};

// upper bound on the up-front trajectory allocation, longer swims grow the vector
const MAX_PREALLOCATED_STATES: usize = 1 << 16;

/// Tunable parameters of a swim.
///
/// Defaults
/// -----------------
/// * `step_size = 0.01` m
/// * `max_path_length = 8.0` m
/// * `max_radius = 10.0` m
/// * `min_momentum = 0.0` GeV/c (every particle is swum)
/// * `max_steps = 100_000`
/// * `compute_bdl = true`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwimParams {
    /// Integration step in m.
    pub step_size: Meter,
    /// Maximum path length in m.
    pub max_path_length: Meter,
    /// Stop once the particle is this far from the origin (m).
    pub max_radius: Meter,
    /// Below this momentum (GeV/c) only the vertex is recorded.
    pub min_momentum: GeVc,
    /// Hard cap on the number of steps.
    pub max_steps: usize,
    /// Accumulate the integral |B × dl| on the returned trajectory.
    pub compute_bdl: bool,
}

impl SwimParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> SwimParamsBuilder {
        SwimParamsBuilder::new()
    }
}

impl Default for SwimParams {
    fn default() -> Self {
        SwimParams {
            step_size: 0.01,
            max_path_length: 8.0,
            max_radius: 10.0,
            min_momentum: 0.0,
            max_steps: 100_000,
            compute_bdl: true,
        }
    }
}

/// Builder for [`SwimParams`], with validation.
#[derive(Debug, Clone)]
pub struct SwimParamsBuilder {
    params: SwimParams,
}

impl Default for SwimParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SwimParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: SwimParams::default(),
        }
    }

    pub fn step_size(mut self, v: Meter) -> Self {
        self.params.step_size = v;
        self
    }

    pub fn max_path_length(mut self, v: Meter) -> Self {
        self.params.max_path_length = v;
        self
    }

    pub fn max_radius(mut self, v: Meter) -> Self {
        self.params.max_radius = v;
        self
    }

    pub fn min_momentum(mut self, v: GeVc) -> Self {
        self.params.min_momentum = v;
        self
    }

    pub fn max_steps(mut self, v: usize) -> Self {
        self.params.max_steps = v;
        self
    }

    pub fn compute_bdl(mut self, v: bool) -> Self {
        self.params.compute_bdl = v;
        self
    }

    // NaN is never accepted
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    #[inline]
    fn ge0(x: f64) -> bool {
        matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `step_size`, `max_path_length`, `max_radius` strictly positive and finite,
    /// * `min_momentum >= 0`,
    /// * `max_steps >= 1`.
    pub fn build(self) -> Result<SwimParams, SwimError> {
        let p = &self.params;

        for (name, v) in [
            ("step_size", p.step_size),
            ("max_path_length", p.max_path_length),
            ("max_radius", p.max_radius),
        ] {
            if !Self::gt0(v) || !v.is_finite() {
                return Err(SwimError::InvalidSwimParameter(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if !Self::ge0(p.min_momentum) {
            return Err(SwimError::InvalidSwimParameter(
                "min_momentum must be >= 0".into(),
            ));
        }
        if p.max_steps == 0 {
            return Err(SwimError::InvalidSwimParameter(
                "max_steps must be >= 1".into(),
            ));
        }

        Ok(self.params)
    }
}

/// Steps charged particles through a magnetic field.
#[derive(Debug, Clone)]
pub struct Swimmer {
    field: Arc<dyn MagneticField>,
}

impl Swimmer {
    pub fn new(field: Arc<dyn MagneticField>) -> Self {
        Swimmer { field }
    }

    pub fn field(&self) -> &Arc<dyn MagneticField> {
        &self.field
    }

    /// Swim a particle from its vertex.
    ///
    /// Arguments
    /// -----------------
    /// * `charge`: the charge of the particle (-1 for electron, +1 for proton, etc.)
    /// * `xo`, `yo`, `zo`: vertex position in m
    /// * `momentum`: initial momentum in GeV/c
    /// * `theta`, `phi`: initial polar and azimuthal angles in degrees
    /// * `params`: step and stopping parameters
    ///
    /// Return
    /// ----------
    /// * The trajectory (with bdl accumulated if `params.compute_bdl`), or
    ///   - [`SwimError::FieldNotLoaded`] if the field is not ready,
    ///   - [`SwimError::InvalidMomentum`] for a negative or non-finite momentum.
    #[allow(clippy::too_many_arguments)]
    pub fn swim(
        &self,
        charge: i32,
        xo: Meter,
        yo: Meter,
        zo: Meter,
        momentum: GeVc,
        theta: Degree,
        phi: Degree,
        params: &SwimParams,
    ) -> Result<SwimTrajectory, SwimError> {
        let record = GeneratedParticleRecord::new(charge, xo, yo, zo, momentum, theta, phi);
        self.swim_record(record, params)
    }

    /// Swim the particle described by a [`GeneratedParticleRecord`].
    pub fn swim_record(
        &self,
        record: GeneratedParticleRecord,
        params: &SwimParams,
    ) -> Result<SwimTrajectory, SwimError> {
        if !self.field.is_field_loaded() {
            return Err(SwimError::FieldNotLoaded(self.field.name().to_string()));
        }
        if !record.momentum.is_finite() || record.momentum < 0.0 {
            return Err(SwimError::InvalidMomentum(record.momentum));
        }

        if record.momentum < params.min_momentum {
            debug!(
                momentum = record.momentum,
                min_momentum = params.min_momentum,
                "momentum below threshold, one point trajectory"
            );
            let mut trajectory = SwimTrajectory::from_vertex(record);
            if params.compute_bdl {
                trajectory.compute_bdl(self.field.as_ref());
            }
            return Ok(trajectory);
        }

        let planned = (params.max_path_length / params.step_size).ceil();
        let planned = if planned < MAX_PREALLOCATED_STATES as f64 {
            planned as usize
        } else {
            MAX_PREALLOCATED_STATES
        };
        let capacity = planned
            .min(params.max_steps)
            .saturating_add(1)
            .min(MAX_PREALLOCATED_STATES);
        let mut trajectory = SwimTrajectory::new(record, capacity);

        let mut q = record.initial_state_vector();
        trajectory.push(q)?;

        // q·κ/p, zero for neutral particles
        let alpha = if record.momentum > 0.0 {
            record.charge as f64 * BENDING_CONSTANT / record.momentum
        } else {
            0.0
        };

        // absorbs rounding in the running path length
        let tolerance = 1.0e-9 * params.step_size;
        let mut s = 0.0;
        let mut steps = 0;
        let stop = loop {
            if s >= params.max_path_length - tolerance {
                break "max path length";
            }
            if radius(&q) >= params.max_radius {
                break "max radius";
            }
            if steps >= params.max_steps {
                break "max steps";
            }

            let h = params.step_size.min(params.max_path_length - s);
            q = self.rk4_step(&q, h, alpha);
            s += h;
            steps += 1;
            trajectory.push(q)?;
        };

        trace!(
            steps,
            path_length = s,
            final_r = radius(&q),
            reason = stop,
            "swim stopped"
        );

        if params.compute_bdl {
            trajectory.compute_bdl(self.field.as_ref());
        }
        Ok(trajectory)
    }

    /// dQ/ds at `q`.
    fn derivative(&self, q: &StateVector, alpha: f64) -> StateVector {
        let u = Vector3::new(q[DIRCOSX_IDX], q[DIRCOSY_IDX], q[DIRCOSZ_IDX]);

        let mut b = Vector3::zeros();
        self.field.field(
            q[X_IDX] * CM_PER_M,
            q[Y_IDX] * CM_PER_M,
            q[Z_IDX] * CM_PER_M,
            &mut b,
        );
        let du = u.cross(&b) * alpha;

        [u.x, u.y, u.z, du.x, du.y, du.z]
    }

    fn rk4_step(&self, q: &StateVector, h: Meter, alpha: f64) -> StateVector {
        let k1 = self.derivative(q, alpha);
        let k2 = self.derivative(&offset(q, &k1, 0.5 * h), alpha);
        let k3 = self.derivative(&offset(q, &k2, 0.5 * h), alpha);
        let k4 = self.derivative(&offset(q, &k3, h), alpha);

        let mut next: StateVector =
            std::array::from_fn(|i| q[i] + h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]));

        let norm = Vector3::new(
            next[DIRCOSX_IDX],
            next[DIRCOSY_IDX],
            next[DIRCOSZ_IDX],
        )
        .norm();
        if norm > 0.0 {
            for u in &mut next[DIRCOSX_IDX..=DIRCOSZ_IDX] {
                *u /= norm;
            }
        }
        next
    }
}

fn offset(q: &StateVector, k: &StateVector, h: f64) -> StateVector {
    let mut out = *q;
    for (o, ki) in out.iter_mut().zip(k) {
        *o += h * ki;
    }
    out
}

fn radius(q: &StateVector) -> Meter {
    Vector3::new(q[X_IDX], q[Y_IDX], q[Z_IDX]).norm()
}
