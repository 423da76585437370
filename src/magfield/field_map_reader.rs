//! # Binary field-map reader and writer
//!
//! Field maps are stored as a fixed header followed by one field triplet per grid point.
//! All numbers are **big-endian**.
//!
//! ```text
//! i32  magic word (0xced)
//! i32  grid coordinate system     0 = cylindrical (φ, ρ, z), 1 = Cartesian (x, y, z)
//! i32  field coordinate system    0 = cylindrical (Bφ, Bρ, Bz), 1 = Cartesian (Bx, By, Bz)
//! i32  length units               0 = cm, 1 = m
//! i32  angular units              0 = degrees, 1 = radians
//! i32  field units                0 = kG, 1 = G, 2 = T
//! f32 f32 i32                     q1 min, max, n
//! f32 f32 i32                     q2 min, max, n
//! f32 f32 i32                     q3 min, max, n
//! 5 × i32                         reserved
//! n1·n2·n3 × (f32 f32 f32)        field samples, q3 fastest, q1 slowest
//! ```
//!
//! Parsing is done with `nom` on the whole file content, so a truncated file is detected
//! before anything is handed to the caller.
use nom::{
    multi::count,
    number::complete::{be_f32, be_i32},
    IResult, Parser,
};

use crate::{magfield::CoordFrame, swim_errors::SwimError};

/// Magic word at the start of every field map.
pub const MAGIC_WORD: i32 = 0xced;

/// Size in bytes of the fixed header.
pub const HEADER_SIZE: usize = 6 * 4 + 3 * 12 + 5 * 4;

const RESERVED_WORDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnits {
    Centimeter,
    Meter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngularUnits {
    Degree,
    Radian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUnits {
    KiloGauss,
    Gauss,
    Tesla,
}

impl TryFrom<i32> for LengthUnits {
    type Error = SwimError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(LengthUnits::Centimeter),
            1 => Ok(LengthUnits::Meter),
            _ => Err(SwimError::InvalidFieldMap(format!(
                "unknown length units code {code}"
            ))),
        }
    }
}

impl TryFrom<i32> for AngularUnits {
    type Error = SwimError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(AngularUnits::Degree),
            1 => Ok(AngularUnits::Radian),
            _ => Err(SwimError::InvalidFieldMap(format!(
                "unknown angular units code {code}"
            ))),
        }
    }
}

impl TryFrom<i32> for FieldUnits {
    type Error = SwimError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(FieldUnits::KiloGauss),
            1 => Ok(FieldUnits::Gauss),
            2 => Ok(FieldUnits::Tesla),
            _ => Err(SwimError::InvalidFieldMap(format!(
                "unknown field units code {code}"
            ))),
        }
    }
}

fn frame_from_code(code: i32, what: &str) -> Result<CoordFrame, SwimError> {
    match code {
        0 => Ok(CoordFrame::Cylindrical),
        1 => Ok(CoordFrame::Cartesian),
        _ => Err(SwimError::InvalidFieldMap(format!(
            "unknown {what} coordinate system code {code}"
        ))),
    }
}

fn frame_code(frame: CoordFrame) -> i32 {
    match frame {
        CoordFrame::Cylindrical => 0,
        CoordFrame::Cartesian => 1,
    }
}

/// One grid coordinate as stored in the file: `min`, `max` and number of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawAxis {
    pub min: f32,
    pub max: f32,
    pub n: i32,
}

/// Header words, undecoded.
#[derive(Debug, Clone, PartialEq)]
struct RawHeader {
    magic: i32,
    grid_cs: i32,
    field_cs: i32,
    length_units: i32,
    angular_units: i32,
    field_units: i32,
    axes: [RawAxis; 3],
}

/// Decoded header of a field map.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapHeader {
    pub grid_frame: CoordFrame,
    pub field_frame: CoordFrame,
    pub length_units: LengthUnits,
    pub angular_units: AngularUnits,
    pub field_units: FieldUnits,
    pub axes: [RawAxis; 3],
}

impl FieldMapHeader {
    /// Number of grid points, or `None` on overflow.
    pub fn sample_count(&self) -> Option<usize> {
        self.axes
            .iter()
            .try_fold(1usize, |acc, axis| acc.checked_mul(axis.n as usize))
    }
}

/// A complete field map in file units.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapFile {
    pub header: FieldMapHeader,
    pub samples: Vec<[f32; 3]>,
}

fn parse_axis(input: &[u8]) -> IResult<&[u8], RawAxis> {
    let (input, min) = be_f32(input)?;
    let (input, max) = be_f32(input)?;
    let (input, n) = be_i32(input)?;
    Ok((input, RawAxis { min, max, n }))
}

fn parse_header(input: &[u8]) -> IResult<&[u8], RawHeader> {
    let (input, magic) = be_i32(input)?;
    let (input, grid_cs) = be_i32(input)?;
    let (input, field_cs) = be_i32(input)?;
    let (input, length_units) = be_i32(input)?;
    let (input, angular_units) = be_i32(input)?;
    let (input, field_units) = be_i32(input)?;
    let (input, q1) = parse_axis(input)?;
    let (input, q2) = parse_axis(input)?;
    let (input, q3) = parse_axis(input)?;
    let (input, _reserved) =
        count(be_i32::<_, nom::error::Error<_>>, RESERVED_WORDS).parse(input)?;

    Ok((
        input,
        RawHeader {
            magic,
            grid_cs,
            field_cs,
            length_units,
            angular_units,
            field_units,
            axes: [q1, q2, q3],
        },
    ))
}

fn parse_triplet(input: &[u8]) -> IResult<&[u8], [f32; 3]> {
    let (input, b1) = be_f32(input)?;
    let (input, b2) = be_f32(input)?;
    let (input, b3) = be_f32(input)?;
    Ok((input, [b1, b2, b3]))
}

fn decode_header(raw: RawHeader) -> Result<FieldMapHeader, SwimError> {
    if raw.magic != MAGIC_WORD {
        return Err(SwimError::InvalidFieldMap(format!(
            "bad magic word {:#x}, expected {MAGIC_WORD:#x}",
            raw.magic
        )));
    }

    for (i, axis) in raw.axes.iter().enumerate() {
        if axis.n < 2 {
            return Err(SwimError::InvalidFieldMap(format!(
                "grid coordinate q{} has {} points, at least 2 are required",
                i + 1,
                axis.n
            )));
        }
        if !axis.min.is_finite() || !axis.max.is_finite() || axis.max <= axis.min {
            return Err(SwimError::InvalidFieldMap(format!(
                "grid coordinate q{} has an invalid range [{}, {}]",
                i + 1,
                axis.min,
                axis.max
            )));
        }
    }

    Ok(FieldMapHeader {
        grid_frame: frame_from_code(raw.grid_cs, "grid")?,
        field_frame: frame_from_code(raw.field_cs, "field")?,
        length_units: raw.length_units.try_into()?,
        angular_units: raw.angular_units.try_into()?,
        field_units: raw.field_units.try_into()?,
        axes: raw.axes,
    })
}

/// Decode a complete field map from its binary content.
///
/// Arguments
/// -----------------
/// * `bytes`: the whole file content.
///
/// Return
/// ----------
/// * The decoded [`FieldMapFile`], or
///   - [`SwimError::FieldMapParsingError`] if the content is truncated,
///   - [`SwimError::InvalidFieldMap`] if the header is inconsistent or trailing bytes remain.
pub fn decode_field_map(bytes: &[u8]) -> Result<FieldMapFile, SwimError> {
    let (input, raw) = parse_header(bytes).map_err(|_| {
        SwimError::FieldMapParsingError(format!(
            "header needs {HEADER_SIZE} bytes, found {}",
            bytes.len()
        ))
    })?;
    let header = decode_header(raw)?;

    let n_samples = header
        .sample_count()
        .ok_or_else(|| SwimError::InvalidFieldMap("grid size overflows".into()))?;

    let expected = n_samples.checked_mul(12).ok_or_else(|| {
        SwimError::InvalidFieldMap("field sample block size overflows".into())
    })?;
    if input.len() < expected {
        return Err(SwimError::FieldMapParsingError(format!(
            "expected {expected} bytes of field samples, found {}",
            input.len()
        )));
    }

    let (rest, samples) = count(parse_triplet, n_samples)
        .parse(input)
        .map_err(|_| SwimError::FieldMapParsingError("failed to parse field samples".into()))?;

    if !rest.is_empty() {
        return Err(SwimError::InvalidFieldMap(format!(
            "{} trailing bytes after the field samples",
            rest.len()
        )));
    }

    Ok(FieldMapFile { header, samples })
}

/// Encode a field map into its binary layout.
pub fn encode_field_map(map: &FieldMapFile) -> Vec<u8> {
    let header = &map.header;
    let mut out = Vec::with_capacity(HEADER_SIZE + 12 * map.samples.len());

    let length_code = match header.length_units {
        LengthUnits::Centimeter => 0,
        LengthUnits::Meter => 1,
    };
    let angular_code = match header.angular_units {
        AngularUnits::Degree => 0,
        AngularUnits::Radian => 1,
    };
    let field_code = match header.field_units {
        FieldUnits::KiloGauss => 0,
        FieldUnits::Gauss => 1,
        FieldUnits::Tesla => 2,
    };

    for word in [
        MAGIC_WORD,
        frame_code(header.grid_frame),
        frame_code(header.field_frame),
        length_code,
        angular_code,
        field_code,
    ] {
        out.extend_from_slice(&word.to_be_bytes());
    }

    for axis in &header.axes {
        out.extend_from_slice(&axis.min.to_be_bytes());
        out.extend_from_slice(&axis.max.to_be_bytes());
        out.extend_from_slice(&axis.n.to_be_bytes());
    }

    for _ in 0..RESERVED_WORDS {
        out.extend_from_slice(&0i32.to_be_bytes());
    }

    for sample in &map.samples {
        for b in sample {
            out.extend_from_slice(&b.to_be_bytes());
        }
    }

    out
}
