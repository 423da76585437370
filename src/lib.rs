//! Magnetic field sources and charged-particle trajectories.
//!
//! * [`magfield`] – field sources ([`magfield::MagneticField`]), grid maps and composites.
//! * [`swim`] – the stepper, trajectories with their integral |B × dl|, the trajectory registry
//!   and the closest-trajectory query on projected views.
pub mod constants;
pub mod magfield;
pub mod swim;
pub mod swim_errors;

pub use magfield::{composite::CompositeField, MagneticField};
pub use swim::{
    registry::{TrajectoryKind, TrajectoryRegistry},
    swimmer::{SwimParams, Swimmer},
    trajectory::SwimTrajectory,
};
pub use swim_errors::SwimError;
