#![allow(dead_code)]

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use magswim::magfield::{
    field_map_reader::{
        encode_field_map, AngularUnits, FieldMapFile, FieldMapHeader, FieldUnits, LengthUnits,
        RawAxis,
    },
    CoordFrame,
};
use magswim::swim::particle::GeneratedParticleRecord;
use magswim::SwimTrajectory;

/// A solenoid-like map: constant Bz (kG) on a cylindrical grid, ρ < 5 m and |z| < 5 m.
pub fn solenoid_map(bz: f32) -> FieldMapFile {
    FieldMapFile {
        header: FieldMapHeader {
            grid_frame: CoordFrame::Cylindrical,
            field_frame: CoordFrame::Cylindrical,
            length_units: LengthUnits::Centimeter,
            angular_units: AngularUnits::Degree,
            field_units: FieldUnits::KiloGauss,
            axes: [
                RawAxis {
                    min: 0.0,
                    max: 360.0,
                    n: 3,
                },
                RawAxis {
                    min: 0.0,
                    max: 500.0,
                    n: 2,
                },
                RawAxis {
                    min: -500.0,
                    max: 500.0,
                    n: 2,
                },
            ],
        },
        samples: vec![[0.0, 0.0, bz]; 12],
    }
}

/// A Cartesian map in meters and tesla whose Bx grows linearly with x.
pub fn gradient_map_si() -> FieldMapFile {
    let axis = RawAxis {
        min: 0.0,
        max: 1.0,
        n: 2,
    };
    FieldMapFile {
        header: FieldMapHeader {
            grid_frame: CoordFrame::Cartesian,
            field_frame: CoordFrame::Cartesian,
            length_units: LengthUnits::Meter,
            angular_units: AngularUnits::Degree,
            field_units: FieldUnits::Tesla,
            axes: [axis; 3],
        },
        // q3 (z) fastest, then y, then x
        samples: (0..8)
            .map(|i| if i < 4 { [0.0, 0.0, 0.0] } else { [1.0, 0.0, 0.0] })
            .collect(),
    }
}

pub fn write_map(dir: &Utf8Path, name: &str, map: &FieldMapFile) -> Utf8PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, encode_field_map(map)).unwrap();
    path
}

pub fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    (dir, path)
}

/// A trajectory through the given (x, y) points at z = 0, moving along +x.
pub fn planar_trajectory(charge: i32, points: &[(f64, f64)]) -> Arc<SwimTrajectory> {
    let record = GeneratedParticleRecord::new(charge, 0.0, 0.0, 0.0, 1.0, 90.0, 0.0);
    let mut trajectory = SwimTrajectory::new(record, points.len());
    for &(x, y) in points {
        trajectory.push([x, y, 0.0, 1.0, 0.0, 0.0]).unwrap();
    }
    Arc::new(trajectory)
}
