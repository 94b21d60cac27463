use crate::Matrix;
use crate::activation::{sigmoid_derivative, tanh, tanh_derivative};
use crate::cell::{GateActivations, concat_input_hidden};
use crate::error::ModelError;
use crate::forward::TimestepCache;
use crate::parameters::{Parameters, WeightName};
use ndarray::s;

/// Gradient of the loss with respect to every weight matrix.
///
/// Each field has the same shape as the matching field of [`Parameters`].
/// Values are summed over all steps and divided by the batch size.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub forget_gate: Matrix,
    pub input_gate: Matrix,
    pub output_gate: Matrix,
    pub candidate_gate: Matrix,
    pub output_projection: Matrix,
}

impl Gradients {
    /// Zero gradients shaped like `parameters`
    pub fn zeros_like(parameters: &Parameters) -> Self {
        Self {
            forget_gate: Matrix::zeros(parameters.forget_gate.raw_dim()),
            input_gate: Matrix::zeros(parameters.input_gate.raw_dim()),
            output_gate: Matrix::zeros(parameters.output_gate.raw_dim()),
            candidate_gate: Matrix::zeros(parameters.candidate_gate.raw_dim()),
            output_projection: Matrix::zeros(parameters.output_projection.raw_dim()),
        }
    }

    pub fn get(&self, name: WeightName) -> &Matrix {
        match name {
            WeightName::ForgetGate => &self.forget_gate,
            WeightName::InputGate => &self.input_gate,
            WeightName::OutputGate => &self.output_gate,
            WeightName::CandidateGate => &self.candidate_gate,
            WeightName::OutputProjection => &self.output_projection,
        }
    }

    /// Checks every gradient for NaN or infinite values.
    ///
    /// # Errors
    ///
    /// - `ModelError::DivergenceFault` - Naming the first non-finite gradient
    pub fn check_finite(&self) -> Result<(), ModelError> {
        for name in WeightName::ALL {
            if !self.get(name).iter().all(|v| v.is_finite()) {
                return Err(ModelError::DivergenceFault(format!(
                    "non-finite gradient for `{}`",
                    name.as_str()
                )));
            }
        }
        Ok(())
    }
}

/// Errors at the output cell of every step.
///
/// # Fields
///
/// - `output_errors` - `pred[t] - y[t]`, shape (batch, output_dim)
/// - `hidden_errors` - `output_errors[t] @ output_projection^T`, shape (batch, hidden_dim)
#[derive(Debug, Clone, PartialEq)]
pub struct OutputCellErrors {
    pub output_errors: Vec<Matrix>,
    pub hidden_errors: Vec<Matrix>,
}

/// Errors at the pre-activation of each gate for one step, shape (batch, hidden_dim)
#[derive(Debug, Clone, PartialEq)]
pub struct GateErrors {
    pub forget: Matrix,
    pub input: Matrix,
    pub output: Matrix,
    pub candidate: Matrix,
}

/// Everything the reverse pass derives for one LSTM cell.
///
/// # Fields
///
/// - `gate_errors` - Pre-activation gate errors
/// - `prev_hidden_error` - Error flowing into the previous hidden state
/// - `prev_cell_error` - Error flowing into the previous cell state
/// - `embedding_error` - Error at the input embedding, shape (batch, input_dim)
#[derive(Debug, Clone, PartialEq)]
pub struct LstmCellError {
    pub gate_errors: GateErrors,
    pub prev_hidden_error: Matrix,
    pub prev_cell_error: Matrix,
    pub embedding_error: Matrix,
}

/// Output of a full backward pass.
///
/// # Fields
///
/// - `gradients` - Weight gradients, ready for the Adam update
/// - `embedding_errors` - One (batch, input_dim) embedding error per step, in forward order
#[derive(Debug, Clone, PartialEq)]
pub struct BackwardResult {
    pub gradients: Gradients,
    pub embedding_errors: Vec<Matrix>,
}

/// Computes the output-cell errors of every step.
///
/// Softmax followed by cross-entropy gives `pred - y` at the logits; that
/// error is sent back through the output projection to the hidden state.
pub fn calculate_output_cell_error(
    labels: &[Matrix],
    cache: &TimestepCache,
    parameters: &Parameters,
) -> Result<OutputCellErrors, ModelError> {
    if labels.len() != cache.timesteps() {
        return Err(ModelError::ProcessingError(format!(
            "got {} label batches for {} unrolled steps",
            labels.len(),
            cache.timesteps()
        )));
    }

    let projection_t = parameters.output_projection.t();
    let mut output_errors = Vec::with_capacity(labels.len());
    let mut hidden_errors = Vec::with_capacity(labels.len());

    for (t, y) in labels.iter().enumerate() {
        let pred = cache.output(t);
        ModelError::check_shape(&format!("labels[{}]", t), pred.dim(), y.dim())?;

        let error_output = pred - y;
        hidden_errors.push(error_output.dot(&projection_t));
        output_errors.push(error_output);
    }

    Ok(OutputCellErrors {
        output_errors,
        hidden_errors,
    })
}

/// Derives the errors of a single LSTM cell.
///
/// With `dh` the total hidden error (output cell + next step) and `dc` the
/// total cell error:
///
/// - e_o = dh ⊙ tanh(C_t) ⊙ o(1 - o)
/// - dc = dh ⊙ o ⊙ (1 - tanh²(C_t)) + next_cell_error
/// - e_i = dc ⊙ g ⊙ i(1 - i)
/// - e_g = dc ⊙ i ⊙ (1 - g²)
/// - e_f = dc ⊙ C_{t-1} ⊙ f(1 - f)
/// - prev_cell_error = dc ⊙ f
///
/// The gate errors are sent back through the transposed gate matrices; the
/// first input_dim columns of the sum are the embedding error and the
/// remaining hidden_dim columns the error of the previous hidden state.
///
/// # Parameters
///
/// - `hidden_error_from_output` - Error reaching h_t from the output cell
/// - `next_hidden_error` - Error reaching h_t from step t + 1 (zeros for the last step)
/// - `next_cell_error` - Error reaching C_t from step t + 1 (zeros for the last step)
/// - `gates` - Gate activations of step t
/// - `cell` - C_t
/// - `prev_cell` - C_{t-1} (zeros for the first step)
/// - `parameters` - Current weights
pub fn calculate_lstm_cell_error(
    hidden_error_from_output: &Matrix,
    next_hidden_error: &Matrix,
    next_cell_error: &Matrix,
    gates: &GateActivations,
    cell: &Matrix,
    prev_cell: &Matrix,
    parameters: &Parameters,
) -> LstmCellError {
    let hidden_error = hidden_error_from_output + next_hidden_error;
    let cell_activated = tanh(cell);

    let output = &hidden_error * &cell_activated * sigmoid_derivative(&gates.output);

    let cell_error =
        &hidden_error * &gates.output * tanh_derivative(&cell_activated) + next_cell_error;

    let input = &cell_error * &gates.candidate * sigmoid_derivative(&gates.input);
    let candidate = &cell_error * &gates.input * tanh_derivative(&gates.candidate);
    let forget = &cell_error * prev_cell * sigmoid_derivative(&gates.forget);

    let prev_cell_error = &cell_error * &gates.forget;

    let combined = forget.dot(&parameters.forget_gate.t())
        + input.dot(&parameters.input_gate.t())
        + output.dot(&parameters.output_gate.t())
        + candidate.dot(&parameters.candidate_gate.t());

    let input_dim = parameters.input_dim();
    let embedding_error = combined.slice(s![.., ..input_dim]).to_owned();
    let prev_hidden_error = combined.slice(s![.., input_dim..]).to_owned();

    LstmCellError {
        gate_errors: GateErrors {
            forget,
            input,
            output,
            candidate,
        },
        prev_hidden_error,
        prev_cell_error,
        embedding_error,
    }
}

/// Sums `hidden[t]^T @ output_errors[t] / batch` over every step.
pub fn calculate_output_cell_derivatives(
    output_errors: &[Matrix],
    cache: &TimestepCache,
    parameters: &Parameters,
) -> Matrix {
    let batch_size = cache.batch_size() as f64;
    let mut d_output_projection = Matrix::zeros(parameters.output_projection.raw_dim());
    for (t, error) in output_errors.iter().enumerate() {
        d_output_projection += &(cache.hidden(t).t().dot(error) / batch_size);
    }
    d_output_projection
}

/// Adds one step's gate-weight derivatives to `gradients`:
/// `concat(embedding, prev_hidden)^T @ e_X / batch` for every gate X.
pub fn accumulate_lstm_cell_derivatives(
    gradients: &mut Gradients,
    gate_errors: &GateErrors,
    embedding: &Matrix,
    prev_hidden: &Matrix,
) -> Result<(), ModelError> {
    let concat = concat_input_hidden(embedding, prev_hidden)?;
    let concat_t = concat.t();
    let batch_size = embedding.nrows() as f64;

    gradients.forget_gate += &(concat_t.dot(&gate_errors.forget) / batch_size);
    gradients.input_gate += &(concat_t.dot(&gate_errors.input) / batch_size);
    gradients.output_gate += &(concat_t.dot(&gate_errors.output) / batch_size);
    gradients.candidate_gate += &(concat_t.dot(&gate_errors.candidate) / batch_size);
    Ok(())
}

/// Backpropagation through time over a cached forward pass.
///
/// Output-cell errors are computed for every step first. The reverse pass then
/// walks t = T-1 down to 0, carrying the hidden and cell errors (zeros before
/// the last step) into the previous step. The errors produced at t = 0 target
/// the zero initial state and are dropped. Weight derivatives are summed over
/// all steps in forward order.
///
/// The cache is only read.
///
/// # Parameters
///
/// - `labels` - T label batches, each (batch, output_dim)
/// - `cache` - Forward pass over the same sequence
/// - `parameters` - Weights used by that forward pass
///
/// # Returns
///
/// - `Ok(BackwardResult)` - Weight gradients and per-step embedding errors
/// - `Err(ModelError)` - If labels do not line up with the cache
pub fn backward_propagation(
    labels: &[Matrix],
    cache: &TimestepCache,
    parameters: &Parameters,
) -> Result<BackwardResult, ModelError> {
    let output_cell_errors = calculate_output_cell_error(labels, cache, parameters)?;

    let timesteps = cache.timesteps();
    let state_shape = (cache.batch_size(), parameters.hidden_dim());

    let mut next_hidden_error = Matrix::zeros(state_shape);
    let mut next_cell_error = Matrix::zeros(state_shape);

    let mut gate_error_cache = Vec::with_capacity(timesteps);
    let mut embedding_errors = Vec::with_capacity(timesteps);

    for t in (0..timesteps).rev() {
        let step = calculate_lstm_cell_error(
            &output_cell_errors.hidden_errors[t],
            &next_hidden_error,
            &next_cell_error,
            cache.gates(t),
            cache.cell(t),
            cache.prev_cell(t),
            parameters,
        );

        gate_error_cache.push(step.gate_errors);
        embedding_errors.push(step.embedding_error);

        next_hidden_error = step.prev_hidden_error;
        next_cell_error = step.prev_cell_error;
    }

    // collected in reverse time order
    gate_error_cache.reverse();
    embedding_errors.reverse();

    let mut gradients = Gradients::zeros_like(parameters);
    gradients.output_projection =
        calculate_output_cell_derivatives(&output_cell_errors.output_errors, cache, parameters);

    for (t, gate_errors) in gate_error_cache.iter().enumerate() {
        accumulate_lstm_cell_derivatives(
            &mut gradients,
            gate_errors,
            cache.embedding(t),
            cache.prev_hidden(t),
        )?;
    }

    Ok(BackwardResult {
        gradients,
        embedding_errors,
    })
}
