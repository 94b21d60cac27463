use super::*;

/// Gradient of the loss with respect to the embedding table.
///
/// Since step t embeds its inputs as `inputs[t] @ table`, the gradient is
/// `sum_t inputs[t]^T @ embedding_errors[t] / batch`.
///
/// # Parameters
///
/// - `table` - Current embedding table, used for its shape
/// - `inputs` - T input batches, each (batch, vocab_size)
/// - `embedding_errors` - T embedding errors from the backward pass, each (batch, input_dim)
///
/// # Errors
///
/// - `ModelError::ProcessingError` - If the two sequences differ in length
/// - `ModelError::ShapeMismatch` - If a batch does not line up with the table
pub fn embedding_gradient(
    table: &EmbeddingTable,
    inputs: &[Matrix],
    embedding_errors: &[Matrix],
) -> Result<Matrix, ModelError> {
    if inputs.len() != embedding_errors.len() {
        return Err(ModelError::ProcessingError(format!(
            "got {} input batches for {} embedding errors",
            inputs.len(),
            embedding_errors.len()
        )));
    }

    let mut gradient = Matrix::zeros(table.table.raw_dim());
    for (t, (x, error)) in inputs.iter().zip(embedding_errors).enumerate() {
        ModelError::check_shape(
            &format!("inputs[{}]", t),
            (x.nrows(), table.vocab_size()),
            x.dim(),
        )?;
        ModelError::check_shape(
            &format!("embedding_errors[{}]", t),
            (x.nrows(), table.input_dim()),
            error.dim(),
        )?;
        gradient += &(x.t().dot(error) / x.nrows() as f64);
    }
    Ok(gradient)
}

/// Plain gradient descent on the embedding table: `table -= lr * gradient`.
///
/// Independent of the Adam state used for the other weights. The gradient is
/// fully computed (and validated) before the table is written.
///
/// # Parameters
///
/// - `table` - Embedding table to update in place
/// - `inputs` - T input batches of the step
/// - `embedding_errors` - T embedding errors from the backward pass
/// - `learning_rate` - Step size
///
/// # Errors
///
/// - `ModelError::InputValidationError` - If `learning_rate` is not positive and finite
/// - `ModelError::ProcessingError` / `ModelError::ShapeMismatch` - See [`embedding_gradient`]
pub fn embedding_update(
    table: &mut EmbeddingTable,
    inputs: &[Matrix],
    embedding_errors: &[Matrix],
    learning_rate: f64,
) -> Result<(), ModelError> {
    validate_learning_rate(learning_rate)?;
    let gradient = embedding_gradient(table, inputs, embedding_errors)?;
    table.table.scaled_add(-learning_rate, &gradient);
    Ok(())
}
