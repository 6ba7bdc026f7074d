// Error kinds raised by the matrix codec and transforms

/// Errors raised by the core codec and matrix transforms.
///
/// Every variant names the operation that detected the problem so the
/// caller can locate the bad input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatrixError {
    #[error("{operation}: malformed event at index {index}: {reason}")]
    MalformedEvent {
        operation: &'static str,
        index: usize,
        reason: String,
    },

    #[error("{operation}: matrix has no frames")]
    EmptyMatrix { operation: &'static str },

    #[error("{operation}: matrix has no nonzero velocities")]
    NoNonzeroVelocity { operation: &'static str },

    #[error("{operation}: dimension mismatch: {reason}")]
    DimensionMismatch {
        operation: &'static str,
        reason: String,
    },

    #[error("{operation}: frame {index} has width {width}, expected 128")]
    ShapeMismatch {
        operation: &'static str,
        index: usize,
        width: usize,
    },

    #[error("{operation}: velocity {value} at frame {index}, pitch {pitch} exceeds 127")]
    VelocityOutOfRange {
        operation: &'static str,
        index: usize,
        pitch: usize,
        value: u8,
    },

    #[error("{operation}: batch size must be positive")]
    InvalidBatchSize { operation: &'static str },

    #[error("{operation}: resolution must be positive")]
    InvalidResolution { operation: &'static str },

    #[error("{operation}: matrix was row-averaged with batch size {batch_size} and cannot be inverted")]
    NotInvertible {
        operation: &'static str,
        batch_size: usize,
    },
}

pub type Result<T> = std::result::Result<T, MatrixError>;
