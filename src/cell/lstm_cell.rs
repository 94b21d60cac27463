use super::*;

/// Gate values of a single time-step, all with shape (batch, hidden_dim).
///
/// # Fields
///
/// - `forget` - sigmoid(concat @ forget_gate)
/// - `input` - sigmoid(concat @ input_gate)
/// - `output` - sigmoid(concat @ output_gate)
/// - `candidate` - tanh(concat @ candidate_gate)
#[derive(Debug, Clone, PartialEq)]
pub struct GateActivations {
    pub forget: Matrix,
    pub input: Matrix,
    pub output: Matrix,
    pub candidate: Matrix,
}

impl GateActivations {
    /// Returns true if every gate value is finite
    pub fn is_finite(&self) -> bool {
        [&self.forget, &self.input, &self.output, &self.candidate]
            .iter()
            .all(|gate| gate.iter().all(|v| v.is_finite()))
    }
}

/// Result of one forward transition of the LSTM cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellStep {
    pub gates: GateActivations,
    pub cell: Matrix,
    pub hidden: Matrix,
}

/// Runs one time-step of the LSTM cell.
///
/// For the concatenation `z = [x_t, h_{t-1}]`:
///
/// 1. f_t = σ(z · W_f)
/// 2. i_t = σ(z · W_i)
/// 3. o_t = σ(z · W_o)
/// 4. g_t = tanh(z · W_g)
/// 5. C_t = f_t ⊙ C_{t-1} + i_t ⊙ g_t
/// 6. h_t = o_t ⊙ tanh(C_t)
///
/// Pure function of its inputs; nothing is cached here.
///
/// # Parameters
///
/// - `input_embedding` - Embedded input with shape (batch, input_dim)
/// - `prev_hidden` - Previous hidden state with shape (batch, hidden_dim)
/// - `prev_cell` - Previous cell state with shape (batch, hidden_dim)
/// - `parameters` - Current weights
///
/// # Returns
///
/// - `Ok(CellStep)` - Gate activations, new cell state and new hidden state
/// - `Err(ModelError)` - If the inputs do not match the weight shapes
pub fn lstm_cell_forward(
    input_embedding: &Matrix,
    prev_hidden: &Matrix,
    prev_cell: &Matrix,
    parameters: &Parameters,
) -> Result<CellStep, ModelError> {
    let concat = concat_input_hidden(input_embedding, prev_hidden)?;
    ModelError::check_shape(
        "concat(input_embedding, prev_hidden)",
        (concat.nrows(), parameters.forget_gate.nrows()),
        concat.dim(),
    )?;
    ModelError::check_shape("prev_cell", prev_hidden.dim(), prev_cell.dim())?;

    let gates = GateActivations {
        forget: sigmoid(&concat.dot(&parameters.forget_gate)),
        input: sigmoid(&concat.dot(&parameters.input_gate)),
        output: sigmoid(&concat.dot(&parameters.output_gate)),
        candidate: tanh(&concat.dot(&parameters.candidate_gate)),
    };

    let cell = &gates.forget * prev_cell + &gates.input * &gates.candidate;
    let hidden = &gates.output * &tanh(&cell);

    Ok(CellStep {
        gates,
        cell,
        hidden,
    })
}
