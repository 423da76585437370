use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwimError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Field map not found at: {0}")]
    FieldMapNotFound(String),

    #[error("Error during the field map parsing: {0}")]
    FieldMapParsingError(String),

    #[error("Invalid field map: {0}")]
    InvalidFieldMap(String),

    #[error("Field map already loaded: {0}")]
    FieldAlreadyLoaded(String),

    #[error("Magnetic field is not loaded: {0}")]
    FieldNotLoaded(String),

    #[error("Invalid swim parameter: {0}")]
    InvalidSwimParameter(String),

    #[error("Invalid momentum: {0} GeV/c")]
    InvalidMomentum(f64),

    #[error("Trajectory is finalized, the integral bdl has already been computed")]
    TrajectoryFinalized,
}

impl PartialEq for SwimError {
    fn eq(&self, other: &Self) -> bool {
        use SwimError::*;
        match (self, other) {
            // io errors are not comparable: equal if same kind
            (IoError(a), IoError(b)) => a.kind() == b.kind(),

            (FieldMapNotFound(a), FieldMapNotFound(b)) => a == b,
            (FieldMapParsingError(a), FieldMapParsingError(b)) => a == b,
            (InvalidFieldMap(a), InvalidFieldMap(b)) => a == b,
            (FieldAlreadyLoaded(a), FieldAlreadyLoaded(b)) => a == b,
            (FieldNotLoaded(a), FieldNotLoaded(b)) => a == b,
            (InvalidSwimParameter(a), InvalidSwimParameter(b)) => a == b,
            (InvalidMomentum(a), InvalidMomentum(b)) => a.to_bits() == b.to_bits(),

            (TrajectoryFinalized, TrajectoryFinalized) => true,

            _ => false,
        }
    }
}
