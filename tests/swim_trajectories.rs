use std::sync::Arc;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use magswim::constants::BENDING_CONSTANT;
use magswim::magfield::{
    field_map_reader::encode_field_map, grid_field::GridField, uniform::UniformField,
};
use magswim::{CompositeField, MagneticField, SwimError, SwimParams, SwimTrajectory, Swimmer};
use nalgebra::Vector3;

mod common;
use common::{planar_trajectory, solenoid_map};

fn loaded_solenoid(bz: f32) -> Arc<GridField> {
    let solenoid = GridField::new("solenoid");
    solenoid
        .load_from_bytes(&encode_field_map(&solenoid_map(bz)))
        .unwrap();
    Arc::new(solenoid)
}

fn assert_bdl_invariants(trajectory: &SwimTrajectory) {
    assert!(trajectory.is_bdl_computed());
    assert_eq!(trajectory.path_length(0), Some(0.0));
    assert_eq!(trajectory.bdl(0), Some(0.0));
    for i in 1..trajectory.len() {
        assert!(trajectory.path_length(i).unwrap() >= trajectory.path_length(i - 1).unwrap());
        assert!(trajectory.bdl(i).unwrap() >= trajectory.bdl(i - 1).unwrap());
    }
}

#[test]
fn test_grid_swim_matches_uniform_swim() {
    let params = SwimParams::builder()
        .step_size(0.005)
        .max_path_length(1.5)
        .build()
        .unwrap();

    let from_map = Swimmer::new(loaded_solenoid(10.0))
        .swim(-1, 0.0, 0.0, 0.0, 1.0, 90.0, 30.0, &params)
        .unwrap();
    let from_uniform = Swimmer::new(Arc::new(UniformField::kilogauss(Vector3::new(
        0.0, 0.0, 10.0,
    ))))
    .swim(-1, 0.0, 0.0, 0.0, 1.0, 90.0, 30.0, &params)
    .unwrap();

    assert_eq!(from_map.len(), from_uniform.len());
    let (a, b) = (
        from_map.final_position().unwrap(),
        from_uniform.final_position().unwrap(),
    );
    assert_relative_eq!(a, b, epsilon = 1e-9);
    assert_relative_eq!(
        from_map.total_bdl().unwrap(),
        from_uniform.total_bdl().unwrap(),
        epsilon = 1e-9
    );
    assert_bdl_invariants(&from_map);
}

#[test]
fn test_helix_in_solenoid() {
    // θ = 60°: transverse momentum p·sin θ sets the radius, z advances with cos θ
    let bz = 8.0;
    let (p, theta) = (0.8_f64, 60.0_f64);
    let params = SwimParams::builder()
        .step_size(0.002)
        .max_path_length(2.0)
        .build()
        .unwrap();
    let trajectory = Swimmer::new(loaded_solenoid(bz as f32))
        .swim(1, 0.0, 0.0, 0.0, p, theta, 0.0, &params)
        .unwrap();

    let pt = p * theta.to_radians().sin();
    let radius = pt / (BENDING_CONSTANT * bz);
    for q in trajectory.states() {
        // circle centred on (0, -R) for a positive track leaving along +x
        let d = (q[0].powi(2) + (q[1] + radius).powi(2)).sqrt();
        assert_abs_diff_eq!(d, radius, epsilon = 1e-8);
    }

    let end = trajectory.final_position().unwrap();
    assert_relative_eq!(end.z, 2.0 * theta.to_radians().cos(), epsilon = 1e-9);
    assert_relative_eq!(trajectory.total_path_length().unwrap(), 2.0, epsilon = 1e-6);
    // |B × dl| only sees the transverse part of the step
    assert_relative_eq!(
        trajectory.total_bdl().unwrap(),
        bz * 2.0 * theta.to_radians().sin(),
        epsilon = 1e-5
    );
}

#[test]
fn test_swim_in_composite_waits_for_every_member() {
    let pending = Arc::new(GridField::new("torus"));
    let mut composite = CompositeField::new().with_name("clas");
    composite.add(Arc::new(UniformField::kilogauss(Vector3::new(0.0, 0.0, 2.0))));
    composite.add(pending.clone());
    let swimmer = Swimmer::new(Arc::new(composite));

    let params = SwimParams::default();
    assert_eq!(
        swimmer
            .swim(1, 0.0, 0.0, 0.0, 1.0, 45.0, 0.0, &params)
            .unwrap_err(),
        SwimError::FieldNotLoaded("clas".into())
    );

    pending
        .load_from_bytes(&encode_field_map(&solenoid_map(3.0)))
        .unwrap();
    assert!(swimmer.field().is_field_loaded());
    let trajectory = swimmer
        .swim(1, 0.0, 0.0, 0.0, 1.0, 45.0, 0.0, &params)
        .unwrap();
    assert!(trajectory.len() > 1);
    assert_bdl_invariants(&trajectory);
}

#[test]
fn test_bdl_is_idempotent() {
    let field = UniformField::kilogauss(Vector3::new(0.0, 3.0, 1.0));
    let trajectory = planar_trajectory(1, &[(0.0, 0.0), (0.1, 0.05), (0.25, 0.1), (0.3, 0.3)]);
    let mut trajectory = Arc::try_unwrap(trajectory).unwrap();

    trajectory.compute_bdl(&field);
    let first = trajectory.clone();
    trajectory.compute_bdl(&field);
    assert_eq!(trajectory, first);
    assert_bdl_invariants(&trajectory);

    assert_eq!(
        trajectory.push([0.0; 6]),
        Err(SwimError::TrajectoryFinalized)
    );
}

#[test]
fn test_degenerate_trajectories() {
    let field = UniformField::kilogauss(Vector3::new(0.0, 0.0, 5.0));

    let mut single = SwimTrajectory::one_point(-1, 0.1, 0.2, 0.3, 0.02, 40.0, 10.0);
    single.compute_bdl(&field);
    assert!(single.is_bdl_computed());
    assert_eq!(single.len(), 1);
    assert_eq!(single.path_length(0), Some(0.0));
    assert_eq!(single.bdl(0), Some(0.0));
    assert_eq!(single.average_phi(), 10.0);

    let record = *single.generated_particle_record();
    let mut empty = SwimTrajectory::new(record, 0);
    empty.compute_bdl(&field);
    assert!(empty.is_bdl_computed());
    assert!(empty.is_empty());
    assert_eq!(empty.total_bdl(), None);
    assert!(empty.final_r().is_nan());
}
