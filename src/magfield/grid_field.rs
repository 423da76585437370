//! # Grid field maps
//!
//! [`GridField`] is a field source backed by a regular three-dimensional grid of field samples,
//! read once from a binary file (see [`field_map_reader`](crate::magfield::field_map_reader))
//! and interpolated trilinearly at query time.
//!
//! Lifecycle
//! -----------------
//! A `GridField` is created empty (not loaded). [`GridField::read_binary_magnetic_field`] reads and
//! validates the whole file, builds a [`FieldGrid`] in memory and only then publishes it through
//! a write-once cell. A failed or partial read therefore always leaves the source "not loaded";
//! there is no "ready with garbage" state.
//!
//! Before loading, queries return a NaN vector. Outside the grid, queries return a zero field.
//!
//! Internal units
//! -----------------
//! Grids are normalized on load to **cm**, **degrees** and **kilogauss**, whatever the file units.
use std::fmt::Debug;

use camino::Utf8Path;
use nalgebra::Vector3;
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::{
    constants::{Centimeter, Degree, KiloGauss, CM_PER_M, KG_PER_GAUSS, KG_PER_TESLA, RADEG},
    magfield::{
        field_map_reader::{
            decode_field_map, encode_field_map, AngularUnits, FieldMapFile, FieldMapHeader,
            FieldUnits, LengthUnits, RawAxis,
        },
        CoordFrame, FieldPoint, MagneticField,
    },
    swim_errors::SwimError,
};

/// One regularly spaced grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridAxis {
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl GridAxis {
    pub fn new(min: f64, max: f64, n: usize) -> Self {
        GridAxis { min, max, n }
    }

    /// Grid spacing. An axis with fewer than two points has no spacing and reports its full range.
    pub fn delta(&self) -> f64 {
        (self.max - self.min) / self.n.saturating_sub(1).max(1) as f64
    }

    /// Value of the coordinate at grid index `i`.
    pub fn value(&self, i: usize) -> f64 {
        self.min + i as f64 * self.delta()
    }

    /// Locate `v` on the axis.
    ///
    /// Return
    /// ----------
    /// * `Some((i, f))` with `i` the lower cell index in `0..n-1` and `f ∈ [0, 1]` the fractional
    ///   position inside the cell, or `None` if `v` is outside `[min, max]` (or NaN) or the
    ///   axis has fewer than two points.
    pub fn locate(&self, v: f64) -> Option<(usize, f64)> {
        if self.n < 2 || !(v >= self.min && v <= self.max) {
            return None;
        }
        let t = (v - self.min) / self.delta();
        let i = (t.floor() as usize).min(self.n - 2);
        Some((i, t - i as f64))
    }
}

/// In-memory grid of field samples, normalized to cm, degrees and kilogauss.
///
/// Samples are stored in the file order (q3 fastest, q1 slowest). Their components are expressed
/// in `field_frame`: `(Bφ, Bρ, Bz)` for cylindrical, `(Bx, By, Bz)` for Cartesian.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGrid {
    grid_frame: CoordFrame,
    field_frame: CoordFrame,
    axes: [GridAxis; 3],
    samples: Vec<Vector3<f64>>,
    max_magnitude: KiloGauss,
}

impl FieldGrid {
    /// Build a grid from normalized axes and samples.
    ///
    /// Arguments
    /// -----------------
    /// * `grid_frame`: frame of the grid coordinates (cylindrical means φ in degrees, ρ, z in cm).
    /// * `field_frame`: frame of the stored field components.
    /// * `axes`: the three grid coordinates, each with at least two points.
    /// * `samples`: one field vector (kG) per grid point, q3 fastest.
    ///
    /// Return
    /// ----------
    /// * The grid, or [`SwimError::InvalidFieldMap`] if the axes or the sample count are inconsistent.
    pub fn new(
        grid_frame: CoordFrame,
        field_frame: CoordFrame,
        axes: [GridAxis; 3],
        samples: Vec<Vector3<f64>>,
    ) -> Result<Self, SwimError> {
        if let Some(axis) = axes
            .iter()
            .find(|a| a.n < 2 || !a.min.is_finite() || !a.max.is_finite() || a.max <= a.min)
        {
            return Err(SwimError::InvalidFieldMap(format!(
                "invalid grid axis {axis:?}"
            )));
        }

        let expected = axes[0]
            .n
            .checked_mul(axes[1].n)
            .and_then(|n| n.checked_mul(axes[2].n))
            .ok_or_else(|| SwimError::InvalidFieldMap("grid size overflows".into()))?;
        if samples.len() != expected {
            return Err(SwimError::InvalidFieldMap(format!(
                "expected {expected} field samples, found {}",
                samples.len()
            )));
        }

        let max_magnitude = samples
            .iter()
            .map(|b| b.norm())
            .filter(|m| m.is_finite())
            .fold(0.0, f64::max);

        Ok(FieldGrid {
            grid_frame,
            field_frame,
            axes,
            samples,
            max_magnitude,
        })
    }

    /// Convert a decoded file into a normalized grid, multiplying every sample by `scale_factor`.
    pub fn from_field_map(map: FieldMapFile, scale_factor: f64) -> Result<Self, SwimError> {
        let header = &map.header;

        let length_scale = match header.length_units {
            LengthUnits::Centimeter => 1.0,
            LengthUnits::Meter => CM_PER_M,
        };
        let angle_scale = match header.angular_units {
            AngularUnits::Degree => 1.0,
            AngularUnits::Radian => 1.0 / RADEG,
        };
        let field_scale = scale_factor
            * match header.field_units {
                FieldUnits::KiloGauss => 1.0,
                FieldUnits::Gauss => KG_PER_GAUSS,
                FieldUnits::Tesla => KG_PER_TESLA,
            };

        let mut axes = [GridAxis::new(0.0, 0.0, 0); 3];
        for (i, raw) in header.axes.iter().enumerate() {
            // the first cylindrical coordinate is the azimuth
            let s = if header.grid_frame == CoordFrame::Cylindrical && i == 0 {
                angle_scale
            } else {
                length_scale
            };
            axes[i] = GridAxis::new(raw.min as f64 * s, raw.max as f64 * s, raw.n as usize);
        }

        let samples = map
            .samples
            .iter()
            .map(|b| Vector3::new(b[0] as f64, b[1] as f64, b[2] as f64) * field_scale)
            .collect();

        FieldGrid::new(header.grid_frame, header.field_frame, axes, samples)
    }

    /// Express the grid as a field map file in cm, degrees and kG.
    pub fn to_field_map(&self) -> FieldMapFile {
        let raw_axis = |a: &GridAxis| RawAxis {
            min: a.min as f32,
            max: a.max as f32,
            n: a.n as i32,
        };
        FieldMapFile {
            header: FieldMapHeader {
                grid_frame: self.grid_frame,
                field_frame: self.field_frame,
                length_units: LengthUnits::Centimeter,
                angular_units: AngularUnits::Degree,
                field_units: FieldUnits::KiloGauss,
                axes: [
                    raw_axis(&self.axes[0]),
                    raw_axis(&self.axes[1]),
                    raw_axis(&self.axes[2]),
                ],
            },
            samples: self
                .samples
                .iter()
                .map(|b| [b.x as f32, b.y as f32, b.z as f32])
                .collect(),
        }
    }

    pub fn grid_frame(&self) -> CoordFrame {
        self.grid_frame
    }

    pub fn field_frame(&self) -> CoordFrame {
        self.field_frame
    }

    pub fn axes(&self) -> &[GridAxis; 3] {
        &self.axes
    }

    pub fn max_magnitude(&self) -> KiloGauss {
        self.max_magnitude
    }

    fn index(&self, i1: usize, i2: usize, i3: usize) -> usize {
        (i1 * self.axes[1].n + i2) * self.axes[2].n + i3
    }

    /// Trilinear interpolation in grid coordinates. `None` outside the grid.
    fn interpolate(&self, q1: f64, q2: f64, q3: f64) -> Option<Vector3<f64>> {
        let (i1, f1) = self.axes[0].locate(q1)?;
        let (i2, f2) = self.axes[1].locate(q2)?;
        let (i3, f3) = self.axes[2].locate(q3)?;

        let mut b = Vector3::zeros();
        for (d1, w1) in [(0, 1.0 - f1), (1, f1)] {
            for (d2, w2) in [(0, 1.0 - f2), (1, f2)] {
                for (d3, w3) in [(0, 1.0 - f3), (1, f3)] {
                    let w = w1 * w2 * w3;
                    if w != 0.0 {
                        b += self.samples[self.index(i1 + d1, i2 + d2, i3 + d3)] * w;
                    }
                }
            }
        }
        Some(b)
    }

    /// Bring an azimuth into the grid's φ range, by any number of turns, if that is possible.
    fn wrap_phi(&self, phi: Degree) -> Degree {
        let axis = &self.axes[0];
        if (axis.min..=axis.max).contains(&phi) {
            return phi;
        }
        let wrapped = axis.min + (phi - axis.min).rem_euclid(360.0);
        if wrapped <= axis.max {
            wrapped
        } else {
            phi
        }
    }

    /// Field in Cartesian components (kG) at a point; zero outside the grid.
    pub fn field_at(&self, point: FieldPoint) -> Vector3<KiloGauss> {
        let (phi, rho, z) = point.to_cylindrical();

        let sample = match self.grid_frame {
            CoordFrame::Cylindrical => self.interpolate(self.wrap_phi(phi), rho, z),
            CoordFrame::Cartesian => {
                let c = point.to_cartesian();
                self.interpolate(c.x, c.y, c.z)
            }
        };

        let Some(b) = sample else {
            return Vector3::zeros();
        };

        match self.field_frame {
            CoordFrame::Cartesian => b,
            CoordFrame::Cylindrical => {
                // b = (Bφ, Bρ, Bz)
                let (sin, cos) = (phi * RADEG).sin_cos();
                Vector3::new(b.y * cos - b.x * sin, b.y * sin + b.x * cos, b.z)
            }
        }
    }
}

/// A field source backed by a [`FieldGrid`] loaded from a binary field map.
pub struct GridField {
    name: String,
    scale_factor: f64,
    grid: OnceCell<FieldGrid>,
}

impl Debug for GridField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridField")
            .field("name", &self.name)
            .field("scale_factor", &self.scale_factor)
            .field("loaded", &self.is_field_loaded())
            .finish()
    }
}

impl GridField {
    /// Create an empty (not loaded) grid field.
    pub fn new(name: impl Into<String>) -> Self {
        GridField {
            name: name.into(),
            scale_factor: 1.0,
            grid: OnceCell::new(),
        }
    }

    /// Create an already loaded grid field from an in-memory grid.
    pub fn from_grid(name: impl Into<String>, grid: FieldGrid) -> Self {
        GridField {
            name: name.into(),
            scale_factor: 1.0,
            grid: OnceCell::with_value(grid),
        }
    }

    /// Scale factor applied to every sample at load time (e.g. `-1.0` to reverse a torus).
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// The loaded grid, if any.
    pub fn grid(&self) -> Option<&FieldGrid> {
        self.grid.get()
    }

    /// Load the field from the binary content of a field map.
    ///
    /// The grid becomes visible only after the whole content was decoded and validated.
    ///
    /// Errors
    /// -----------------
    /// * [`SwimError::FieldAlreadyLoaded`] if this source already holds a grid.
    /// * [`SwimError::FieldMapParsingError`] / [`SwimError::InvalidFieldMap`] on corrupt content.
    pub fn load_from_bytes(&self, bytes: &[u8]) -> Result<(), SwimError> {
        if self.is_field_loaded() {
            return Err(SwimError::FieldAlreadyLoaded(self.name.clone()));
        }

        let grid = FieldGrid::from_field_map(decode_field_map(bytes)?, self.scale_factor)?;
        let max_magnitude = grid.max_magnitude();
        let axes = *grid.axes();

        self.grid
            .set(grid)
            .map_err(|_| SwimError::FieldAlreadyLoaded(self.name.clone()))?;

        debug!(
            field = %self.name,
            n1 = axes[0].n,
            n2 = axes[1].n,
            n3 = axes[2].n,
            max_magnitude,
            "field map loaded"
        );
        Ok(())
    }

    /// Read a magnetic field from a binary file.
    ///
    /// On any failure the source stays not loaded and a warning is logged.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: location of the binary field map.
    ///
    /// Return
    /// ----------
    /// * `Ok(())` once the field is ready, or
    ///   - [`SwimError::FieldMapNotFound`] if the file does not exist,
    ///   - [`SwimError::IoError`] if it cannot be read,
    ///   - a parsing/validation error if the content is corrupt.
    pub fn read_binary_magnetic_field(&self, path: &Utf8Path) -> Result<(), SwimError> {
        let result = std::fs::read(path)
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => SwimError::FieldMapNotFound(path.to_string()),
                _ => SwimError::IoError(err),
            })
            .and_then(|bytes| self.load_from_bytes(&bytes));

        if let Err(err) = &result {
            warn!(field = %self.name, %path, %err, "unable to load field map");
        }
        result
    }

    /// Write the loaded grid to a binary file (cm, degrees, kG; scale factor already applied).
    pub fn write_binary_magnetic_field(&self, path: &Utf8Path) -> Result<(), SwimError> {
        let grid = self
            .grid()
            .ok_or_else(|| SwimError::FieldNotLoaded(self.name.clone()))?;
        std::fs::write(path, encode_field_map(&grid.to_field_map()))?;
        Ok(())
    }
}

impl MagneticField for GridField {
    fn field(&self, x: Centimeter, y: Centimeter, z: Centimeter, result: &mut Vector3<f64>) {
        *result = match self.grid.get() {
            Some(grid) => grid.field_at(FieldPoint::Cartesian { x, y, z }),
            None => Vector3::repeat(f64::NAN),
        };
    }

    fn field_cylindrical(
        &self,
        phi: Degree,
        rho: Centimeter,
        z: Centimeter,
        result: &mut Vector3<f64>,
    ) {
        *result = match self.grid.get() {
            Some(grid) => grid.field_at(FieldPoint::Cylindrical { phi, rho, z }),
            None => Vector3::repeat(f64::NAN),
        };
    }

    fn is_field_loaded(&self) -> bool {
        self.grid.get().is_some()
    }

    fn max_field_magnitude(&self) -> KiloGauss {
        self.grid.get().map_or(0.0, FieldGrid::max_magnitude)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
