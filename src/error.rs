use std::fs::File;
use std::io::BufReader;
use thiserror::Error;

/// Error types that can occur while training or evaluating the LSTM model
///
/// # Variants
///
/// - `InputValidationError` - A hyperparameter or input batch does not meet the expected format or range
/// - `ShapeMismatch` - A weight and its gradient/moment counterpart (or a batch and the model) disagree in shape.
///   This is a fatal precondition violation and is always reported before any state is mutated
/// - `DivergenceFault` - NaN or infinite values were found in activations, loss, or gradients
/// - `NumericUnderflowFault` - The probability product used for perplexity underflowed to exactly zero
/// - `ProcessingError` - Something went wrong while processing (e.g. caches of inconsistent length)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Input validation error: {0}")]
    InputValidationError(String),

    #[error("Shape mismatch for `{name}`: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        name: String,
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("Divergence fault: {0}")]
    DivergenceFault(String),

    #[error("Numeric underflow fault: {0}")]
    NumericUnderflowFault(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),
}

impl ModelError {
    /// Returns a `ShapeMismatch` error if `got` differs from `expected`
    ///
    /// # Parameters
    ///
    /// - `name` - Name of the tensor being checked, used in the error message
    /// - `expected` - Required (rows, columns)
    /// - `got` - Actual (rows, columns)
    pub fn check_shape(
        name: &str,
        expected: (usize, usize),
        got: (usize, usize),
    ) -> Result<(), ModelError> {
        if expected != got {
            return Err(ModelError::ShapeMismatch {
                name: name.to_string(),
                expected,
                got,
            });
        }
        Ok(())
    }
}

/// Input/Output error types that can occur during checkpoint and configuration file operations
///
/// # Variants
///
/// - `StdIoError` - Wraps standard I/O errors from file system operations (reading, writing, file access)
/// - `JsonError` - Wraps JSON serialization/deserialization errors
/// - `StructureMismatch` - The file content does not describe a model with consistent dimensions
#[derive(Debug, Error)]
pub enum IoError {
    #[error("IO error: {0}")]
    StdIoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Structure mismatch: {0}")]
    StructureMismatch(String),
}

impl IoError {
    pub fn load_in_buf_reader(path: &str) -> Result<BufReader<File>, IoError> {
        let file = File::open(path)?;
        Ok(BufReader::new(file))
    }
}
