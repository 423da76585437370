use std::sync::Arc;

use approx::assert_relative_eq;
use magswim::magfield::{
    field_map_reader::encode_field_map, grid_field::GridField, uniform::UniformField, FieldPoint,
};
use magswim::{CompositeField, MagneticField, SwimError};
use nalgebra::Vector3;

mod common;
use common::{gradient_map_si, solenoid_map, utf8_tempdir, write_map};

#[test]
fn test_load_solenoid_map_from_file() {
    let (_guard, dir) = utf8_tempdir();
    let path = write_map(&dir, "solenoid.dat", &solenoid_map(5.0));

    let solenoid = GridField::new("solenoid");
    assert!(!solenoid.is_field_loaded());
    solenoid.read_binary_magnetic_field(&path).unwrap();
    assert!(solenoid.is_field_loaded());
    assert_relative_eq!(solenoid.max_field_magnitude(), 5.0);

    for (x, y, z) in [(0.0, 0.0, 0.0), (-120.0, 30.0, 250.0), (10.0, -300.0, -40.0)] {
        let mut b = Vector3::zeros();
        solenoid.field(x, y, z, &mut b);
        assert_relative_eq!(b, Vector3::new(0.0, 0.0, 5.0), epsilon = 1e-12);
    }

    // outside the grid
    assert_eq!(solenoid.field_magnitude(0.0, 0.0, 600.0), 0.0);

    assert_eq!(
        solenoid.read_binary_magnetic_field(&path),
        Err(SwimError::FieldAlreadyLoaded("solenoid".into()))
    );
}

#[test]
fn test_units_are_normalized() {
    let (_guard, dir) = utf8_tempdir();
    let path = write_map(&dir, "gradient.dat", &gradient_map_si());

    let gradient = GridField::new("gradient").with_scale_factor(2.0);
    gradient.read_binary_magnetic_field(&path).unwrap();

    // 1 m → 100 cm, 1 T → 10 kG, times the scale factor
    let b = gradient.field_at(FieldPoint::Cartesian {
        x: 25.0,
        y: 50.0,
        z: 50.0,
    });
    assert_relative_eq!(b.x, 0.25 * 20.0, epsilon = 1e-12);
    assert_relative_eq!(gradient.max_field_magnitude(), 20.0);
}

#[test]
fn test_missing_or_corrupt_file_leaves_source_unloaded() {
    let (_guard, dir) = utf8_tempdir();

    let missing = GridField::new("torus");
    let err = missing
        .read_binary_magnetic_field(&dir.join("nope.dat"))
        .unwrap_err();
    assert!(matches!(err, SwimError::FieldMapNotFound(_)));
    assert!(!missing.is_field_loaded());

    let bytes = encode_field_map(&solenoid_map(5.0));
    let truncated = dir.join("truncated.dat");
    std::fs::write(&truncated, &bytes[..bytes.len() - 7]).unwrap();

    let partial = GridField::new("solenoid");
    assert!(partial.read_binary_magnetic_field(&truncated).is_err());
    assert!(!partial.is_field_loaded());
    assert!(partial.field_magnitude(0.0, 0.0, 0.0).is_nan());

    let mut garbage = bytes.clone();
    garbage[3] = 0x00;
    let bad_magic = dir.join("garbage.dat");
    std::fs::write(&bad_magic, garbage).unwrap();
    assert!(partial.read_binary_magnetic_field(&bad_magic).is_err());
    assert!(!partial.is_field_loaded());

    // the full file still loads afterwards
    let good = dir.join("good.dat");
    std::fs::write(&good, &bytes).unwrap();
    partial.read_binary_magnetic_field(&good).unwrap();
    assert!(partial.is_field_loaded());
}

#[test]
fn test_write_then_read_back() {
    let (_guard, dir) = utf8_tempdir();
    let source = GridField::new("gradient");
    source
        .load_from_bytes(&encode_field_map(&gradient_map_si()))
        .unwrap();

    let out = dir.join("normalized.dat");
    source.write_binary_magnetic_field(&out).unwrap();

    let copy = GridField::new("copy");
    copy.read_binary_magnetic_field(&out).unwrap();
    for x in [0.0, 33.0, 70.0, 100.0] {
        assert_relative_eq!(
            copy.field_magnitude(x, 10.0, 90.0),
            source.field_magnitude(x, 10.0, 90.0),
            epsilon = 1e-6
        );
    }

    let unloaded = GridField::new("empty");
    assert_eq!(
        unloaded.write_binary_magnetic_field(&out),
        Err(SwimError::FieldNotLoaded("empty".into()))
    );
}

#[test]
fn test_composite_of_map_and_uniform() {
    let solenoid = Arc::new(GridField::new("solenoid"));
    let uniform: Arc<dyn MagneticField> =
        Arc::new(UniformField::kilogauss(Vector3::new(1.0, 0.0, 0.0)));

    let mut composite = CompositeField::new();
    composite.add(solenoid.clone());
    composite.add(uniform.clone());
    assert!(!composite.is_field_loaded());

    solenoid
        .load_from_bytes(&encode_field_map(&solenoid_map(5.0)))
        .unwrap();
    assert!(composite.is_field_loaded());

    let point = FieldPoint::Cylindrical {
        phi: -45.0,
        rho: 100.0,
        z: 20.0,
    };
    assert_relative_eq!(
        composite.field_at(point),
        solenoid.field_at(point) + uniform.field_at(point),
        epsilon = 1e-12
    );
    assert_relative_eq!(
        composite.field_at(point),
        Vector3::new(1.0, 0.0, 5.0),
        epsilon = 1e-12
    );
    // max of members, not the bound on the sum
    assert_relative_eq!(composite.max_field_magnitude(), 5.0);
}
