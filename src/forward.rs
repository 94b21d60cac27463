use crate::Matrix;
use crate::cell::{GateActivations, lstm_cell_forward, output_cell_forward};
use crate::error::ModelError;
use crate::parameters::{EmbeddingTable, ModelDims, Parameters};

/// Activations recorded by one forward pass over an unrolled sequence.
///
/// Produced by [`forward_propagation`] and only read afterwards; the backward
/// pass borrows it immutably.
///
/// Indexing: embeddings, gates and outputs hold one entry per step `t` in
/// `0..T`. Hidden and cell states hold `T + 1` entries: index 0 is the
/// zero-initialised state before the first step and index `t + 1` is the state
/// produced by step `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestepCache {
    embeddings: Vec<Matrix>,
    hidden: Vec<Matrix>,
    cell: Vec<Matrix>,
    gates: Vec<GateActivations>,
    outputs: Vec<Matrix>,
}

impl TimestepCache {
    /// Number of unrolled steps T
    pub fn timesteps(&self) -> usize {
        self.outputs.len()
    }

    pub fn batch_size(&self) -> usize {
        self.hidden[0].nrows()
    }

    /// Embedded input of step `t`, shape (batch, input_dim)
    pub fn embedding(&self, t: usize) -> &Matrix {
        &self.embeddings[t]
    }

    /// Hidden state before step `t` (zeros for t = 0)
    pub fn prev_hidden(&self, t: usize) -> &Matrix {
        &self.hidden[t]
    }

    /// Hidden state produced by step `t`
    pub fn hidden(&self, t: usize) -> &Matrix {
        &self.hidden[t + 1]
    }

    /// Cell state before step `t` (zeros for t = 0)
    pub fn prev_cell(&self, t: usize) -> &Matrix {
        &self.cell[t]
    }

    /// Cell state produced by step `t`
    pub fn cell(&self, t: usize) -> &Matrix {
        &self.cell[t + 1]
    }

    pub fn gates(&self, t: usize) -> &GateActivations {
        &self.gates[t]
    }

    /// Class distribution predicted at step `t`, shape (batch, output_dim)
    pub fn output(&self, t: usize) -> &Matrix {
        &self.outputs[t]
    }

    pub fn outputs(&self) -> &[Matrix] {
        &self.outputs
    }

    /// All hidden states including the initial one (length T + 1)
    pub fn hidden_states(&self) -> &[Matrix] {
        &self.hidden
    }

    /// All cell states including the initial one (length T + 1)
    pub fn cell_states(&self) -> &[Matrix] {
        &self.cell
    }

    /// Checks gates, states and outputs for NaN or infinite values.
    ///
    /// # Errors
    ///
    /// - `ModelError::DivergenceFault` - Naming the first step that is not finite
    pub fn check_finite(&self) -> Result<(), ModelError> {
        let finite = |m: &Matrix| m.iter().all(|v| v.is_finite());
        for t in 0..self.timesteps() {
            if !self.gates[t].is_finite() {
                return Err(ModelError::DivergenceFault(format!(
                    "non-finite gate activation at step {}",
                    t
                )));
            }
            if !finite(self.cell(t)) || !finite(self.hidden(t)) {
                return Err(ModelError::DivergenceFault(format!(
                    "non-finite LSTM state at step {}",
                    t
                )));
            }
            if !finite(&self.outputs[t]) {
                return Err(ModelError::DivergenceFault(format!(
                    "non-finite output distribution at step {}",
                    t
                )));
            }
        }
        Ok(())
    }
}

/// Checks that a sequence of input batches is usable: non-empty, a single
/// batch size, and `expected_width` columns in every batch.
pub(crate) fn validate_sequence(
    batches: &[Matrix],
    expected_width: usize,
    what: &str,
) -> Result<usize, ModelError> {
    let first = batches.first().ok_or_else(|| {
        ModelError::InputValidationError(format!("{} sequence must contain at least one step", what))
    })?;
    let batch_size = first.nrows();
    if batch_size == 0 {
        return Err(ModelError::InputValidationError(format!(
            "{} batches must contain at least one example",
            what
        )));
    }
    for (t, batch) in batches.iter().enumerate() {
        ModelError::check_shape(
            &format!("{}[{}]", what, t),
            (batch_size, expected_width),
            batch.dim(),
        )?;
    }
    Ok(batch_size)
}

/// Unrolls the LSTM cell and the output cell over a sequence.
///
/// Hidden and cell states start at zero; for each step the input batch is
/// embedded, passed through the LSTM cell and the output cell, and every
/// intermediate value is recorded. Deterministic for fixed weights and inputs.
///
/// # Parameters
///
/// - `inputs` - T input batches, each (batch, vocab_size)
/// - `parameters` - Current weights
/// - `embeddings` - Current embedding table
///
/// # Returns
///
/// - `Ok(TimestepCache)` - Every activation needed by the backward pass
/// - `Err(ModelError)` - If the inputs are empty or do not match the model shapes
pub fn forward_propagation(
    inputs: &[Matrix],
    parameters: &Parameters,
    embeddings: &EmbeddingTable,
) -> Result<TimestepCache, ModelError> {
    let batch_size = validate_sequence(inputs, embeddings.vocab_size(), "inputs")?;
    let hidden_dim = parameters.hidden_dim();
    parameters.validate_shapes(&ModelDims {
        vocab_size: embeddings.vocab_size(),
        input_dim: embeddings.input_dim(),
        hidden_dim,
        output_dim: parameters.output_dim(),
    })?;

    let timesteps = inputs.len();

    let mut embedding_cache = Vec::with_capacity(timesteps);
    let mut hidden_cache = Vec::with_capacity(timesteps + 1);
    let mut cell_cache = Vec::with_capacity(timesteps + 1);
    let mut gate_cache = Vec::with_capacity(timesteps);
    let mut output_cache = Vec::with_capacity(timesteps);

    hidden_cache.push(Matrix::zeros((batch_size, hidden_dim)));
    cell_cache.push(Matrix::zeros((batch_size, hidden_dim)));

    for (t, batch) in inputs.iter().enumerate() {
        let embedding = embeddings.embed(batch);
        let step = lstm_cell_forward(&embedding, &hidden_cache[t], &cell_cache[t], parameters)?;
        let output = output_cell_forward(&step.hidden, parameters)?;

        embedding_cache.push(embedding);
        gate_cache.push(step.gates);
        hidden_cache.push(step.hidden);
        cell_cache.push(step.cell);
        output_cache.push(output);
    }

    Ok(TimestepCache {
        embeddings: embedding_cache,
        hidden: hidden_cache,
        cell: cell_cache,
        gates: gate_cache,
        outputs: output_cache,
    })
}
