use crate::error::ModelError;

/// Step size shared by Adam and the embedding update
pub(crate) fn validate_learning_rate(learning_rate: f64) -> Result<(), ModelError> {
    validate_positive_finite(learning_rate, "learning_rate")
}

/// Adam moment decay (`beta1`, `beta2`): finite and in [0, 1).
///
/// A decay of 1 would freeze the moments at their zero initial value.
pub(crate) fn validate_decay_rate(value: f64, name: &str) -> Result<(), ModelError> {
    if !((0.0..1.0).contains(&value) && value.is_finite()) {
        return Err(ModelError::InputValidationError(format!(
            "{} must lie in [0, 1), got {}",
            name, value
        )));
    }
    Ok(())
}

/// Used for `epsilon` and the learning rate
pub(crate) fn validate_positive_finite(value: f64, name: &str) -> Result<(), ModelError> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(ModelError::InputValidationError(format!(
            "{} must be a positive finite number, got {}",
            name, value
        )));
    }
    Ok(())
}
