//! # Swimming charged particles
//!
//! Everything downstream of the field sources:
//!
//! * [`particle`](crate::swim::particle) – Generated particle record and Lund ids.
//! * [`swimmer`](crate::swim::swimmer) – Fixed-step RK4 stepper and its [`SwimParams`](crate::swim::swimmer::SwimParams).
//! * [`trajectory`](crate::swim::trajectory) – Append-only state-vector store of one swim.
//! * [`bxdl`](crate::swim::bxdl) – Running path length and integral |B × dl|.
//! * [`registry`](crate::swim::registry) – Process-wide Monte-Carlo / reconstructed collections with change notification.
//! * [`projection`](crate::swim::projection) – 2D projected trajectories and the closest-trajectory query.
pub mod bxdl;
pub mod particle;
pub mod projection;
pub mod registry;
pub mod swimmer;
pub mod trajectory;
