use super::*;

/// Projects a hidden state onto a class-probability distribution:
/// `softmax(hidden @ output_projection)`.
///
/// # Parameters
///
/// - `hidden` - Hidden state with shape (batch, hidden_dim)
/// - `parameters` - Current weights
///
/// # Returns
///
/// - `Ok(Matrix)` - Distribution with shape (batch, output_dim); each row sums to 1
/// - `Err(ModelError::ShapeMismatch)` - If `hidden` is not hidden_dim wide
pub fn output_cell_forward(hidden: &Matrix, parameters: &Parameters) -> Result<Matrix, ModelError> {
    ModelError::check_shape(
        "hidden",
        (hidden.nrows(), parameters.output_projection.nrows()),
        hidden.dim(),
    )?;
    Ok(softmax(&hidden.dot(&parameters.output_projection)))
}
