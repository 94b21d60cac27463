use crate::Matrix;
use crate::activation::{sigmoid, softmax, tanh};
use crate::error::ModelError;
use crate::parameters::Parameters;
use ndarray::{Axis, concatenate};

/// One time-step of the LSTM recurrence
pub mod lstm_cell;
/// Hidden-state to class-distribution projection
pub mod output_cell;

pub use lstm_cell::{CellStep, GateActivations, lstm_cell_forward};
pub use output_cell::output_cell_forward;

/// Concatenates an embedding batch and a hidden-state batch along the feature axis.
///
/// # Parameters
///
/// - `embedding` - Input embedding with shape (batch, input_dim)
/// - `hidden` - Hidden state with shape (batch, hidden_dim)
///
/// # Returns
///
/// - `Ok(Matrix)` - Concatenated matrix with shape (batch, input_dim + hidden_dim)
/// - `Err(ModelError::InputValidationError)` - If the batch sizes differ
pub fn concat_input_hidden(embedding: &Matrix, hidden: &Matrix) -> Result<Matrix, ModelError> {
    concatenate(Axis(1), &[embedding.view(), hidden.view()]).map_err(|e| {
        ModelError::InputValidationError(format!(
            "cannot concatenate embedding {:?} with hidden state {:?}: {}",
            embedding.dim(),
            hidden.dim(),
            e
        ))
    })
}
