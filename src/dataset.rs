use crate::Matrix;
use crate::error::ModelError;

/// Deterministic synthetic gesture-like symbol sequences
pub mod synthetic;

/// Creates a one-hot matrix with one row per index.
///
/// # Parameters
///
/// - `indices` - Symbol index of each row
/// - `depth` - Number of columns
///
/// # Errors
///
/// - `ModelError::InputValidationError` - If an index is not below `depth`
pub fn one_hot(indices: &[usize], depth: usize) -> Result<Matrix, ModelError> {
    let mut encoded = Matrix::zeros((indices.len(), depth));
    for (row, &index) in indices.iter().enumerate() {
        if index >= depth {
            return Err(ModelError::InputValidationError(format!(
                "symbol {} is out of range for vocabulary of size {}",
                index, depth
            )));
        }
        encoded[[row, index]] = 1.0;
    }
    Ok(encoded)
}

/// One training sequence: T input batches and T label batches.
///
/// `inputs[t]` is a (batch, vocab_size) one-hot or soft symbol matrix and
/// `labels[t]` a (batch, output_dim) one-hot or soft class matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceBatch {
    inputs: Vec<Matrix>,
    labels: Vec<Matrix>,
}

impl SequenceBatch {
    /// Creates a sequence after checking it is non-empty and consistently shaped.
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If the sequence is empty, the lengths differ,
    ///   or batches disagree on batch size or width
    pub fn new(inputs: Vec<Matrix>, labels: Vec<Matrix>) -> Result<Self, ModelError> {
        if inputs.is_empty() {
            return Err(ModelError::InputValidationError(
                "a sequence needs at least one step".to_string(),
            ));
        }
        if inputs.len() != labels.len() {
            return Err(ModelError::InputValidationError(format!(
                "got {} input batches but {} label batches",
                inputs.len(),
                labels.len()
            )));
        }

        let batch_size = inputs[0].nrows();
        let input_width = inputs[0].ncols();
        let label_width = labels[0].ncols();
        if batch_size == 0 {
            return Err(ModelError::InputValidationError(
                "batches must contain at least one example".to_string(),
            ));
        }

        for (t, (x, y)) in inputs.iter().zip(&labels).enumerate() {
            if x.dim() != (batch_size, input_width) || y.dim() != (batch_size, label_width) {
                return Err(ModelError::InputValidationError(format!(
                    "step {} has inputs {:?} and labels {:?}, expected ({}, {}) and ({}, {})",
                    t,
                    x.dim(),
                    y.dim(),
                    batch_size,
                    input_width,
                    batch_size,
                    label_width
                )));
            }
        }

        Ok(Self { inputs, labels })
    }

    /// Builds a next-symbol prediction sequence.
    ///
    /// Each row of the batch is one symbol sequence of length L. Step t feeds
    /// symbol t and is labelled with symbol t + 1, giving T = L - 1 steps with
    /// both inputs and labels one-hot over `vocab_size`.
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If there are no sequences, lengths differ,
    ///   a sequence is shorter than 2, or a symbol is out of range
    pub fn from_symbol_sequences(
        sequences: &[Vec<usize>],
        vocab_size: usize,
    ) -> Result<Self, ModelError> {
        let length = sequences
            .first()
            .map(|s| s.len())
            .ok_or_else(|| ModelError::InputValidationError("no sequences given".to_string()))?;
        if length < 2 {
            return Err(ModelError::InputValidationError(format!(
                "sequences need at least 2 symbols, got {}",
                length
            )));
        }
        if let Some(bad) = sequences.iter().find(|s| s.len() != length) {
            return Err(ModelError::InputValidationError(format!(
                "all sequences must have length {}, found one of length {}",
                length,
                bad.len()
            )));
        }

        let encoded = (0..length)
            .map(|t| {
                let column: Vec<usize> = sequences.iter().map(|s| s[t]).collect();
                one_hot(&column, vocab_size)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let inputs = encoded[..length - 1].to_vec();
        let labels = encoded[1..].to_vec();
        Self::new(inputs, labels)
    }

    pub fn inputs(&self) -> &[Matrix] {
        &self.inputs
    }

    pub fn labels(&self) -> &[Matrix] {
        &self.labels
    }

    /// Number of steps T
    pub fn timesteps(&self) -> usize {
        self.inputs.len()
    }

    pub fn batch_size(&self) -> usize {
        self.inputs[0].nrows()
    }

    pub fn input_width(&self) -> usize {
        self.inputs[0].ncols()
    }

    pub fn label_width(&self) -> usize {
        self.labels[0].ncols()
    }
}

/// Splits symbol sequences into next-symbol batches of `batch_size` rows.
///
/// Trailing sequences that do not fill a whole batch are dropped.
pub fn symbol_batches(
    sequences: &[Vec<usize>],
    batch_size: usize,
    vocab_size: usize,
) -> Result<Vec<SequenceBatch>, ModelError> {
    if batch_size == 0 {
        return Err(ModelError::InputValidationError(
            "batch_size must be greater than 0".to_string(),
        ));
    }
    sequences
        .chunks_exact(batch_size)
        .map(|chunk| SequenceBatch::from_symbol_sequences(chunk, vocab_size))
        .collect()
}
