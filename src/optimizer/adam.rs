use super::*;

/// Hyperparameters of the Adam update, fixed for a run.
///
/// # Fields
///
/// - `learning_rate` - Step size for parameter updates
/// - `beta1` - Exponential decay rate for the first moment estimates
/// - `beta2` - Exponential decay rate for the second moment estimates
/// - `epsilon` - Small constant added to the denominator for numerical stability
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdamConfig {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
}

impl AdamConfig {
    /// Creates a new Adam configuration with the specified parameters.
    ///
    /// # Parameters
    ///
    /// - `learning_rate` - Step size for parameter updates
    /// - `beta1` - Decay rate for the first moment estimates (0.9 by default)
    /// - `beta2` - Decay rate for the second moment estimates (0.99 by default)
    /// - `epsilon` - Small constant for numerical stability (1e-6 by default)
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If a value is out of range or not finite
    pub fn new(learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64) -> Result<Self, ModelError> {
        validate_learning_rate(learning_rate)?;
        validate_decay_rate(beta1, "beta1")?;
        validate_decay_rate(beta2, "beta2")?;
        validate_positive_finite(epsilon, "epsilon")?;

        Ok(Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
        })
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn beta1(&self) -> f64 {
        self.beta1
    }

    pub fn beta2(&self) -> f64 {
        self.beta2
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

/// First and second moment accumulators for one weight tensor.
///
/// # Fields
///
/// - `v` - Moving average of gradients, same shape as the weight
/// - `s` - Moving average of squared gradients, same shape as the weight
#[derive(Debug, Clone, PartialEq)]
pub struct AdamStates {
    pub v: Matrix,
    pub s: Matrix,
}

impl AdamStates {
    /// Creates zero-initialised moments of the given shape
    pub fn new(dims: (usize, usize)) -> Self {
        Self {
            v: Matrix::zeros(dims),
            s: Matrix::zeros(dims),
        }
    }

    /// Checks that both moments match the shape `expected`
    fn validate_shape(&self, name: &str, expected: (usize, usize)) -> Result<(), ModelError> {
        ModelError::check_shape(&format!("v[{}]", name), expected, self.v.dim())?;
        ModelError::check_shape(&format!("s[{}]", name), expected, self.s.dim())
    }

    /// Updates both moments with `grad` and applies the step to `param`.
    ///
    /// - v = beta1 * v + (1 - beta1) * grad
    /// - s = beta2 * s + (1 - beta2) * grad²
    /// - param = param - lr * v / (sqrt(s) + epsilon)
    ///
    /// No bias correction is applied to `v` or `s`.
    ///
    /// Shapes must have been checked by the caller.
    fn update_parameter(&mut self, param: &mut Matrix, grad: &Matrix, config: &AdamConfig) {
        let (beta1, beta2) = (config.beta1, config.beta2);

        self.v = self.v.mapv(|x| x * beta1) + &(grad * (1.0 - beta1));
        self.s = self.s.mapv(|x| x * beta2) + &(grad.mapv(|x| x * x) * (1.0 - beta2));

        let step = config.learning_rate * &self.v / &(self.s.mapv(f64::sqrt) + config.epsilon);
        *param -= &step;
    }
}

/// Adam moment accumulators for all five weights.
///
/// Created once at the start of training with zeros and updated by every
/// call to [`adam_update`]; never reset mid-training.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerState {
    pub forget_gate: AdamStates,
    pub input_gate: AdamStates,
    pub output_gate: AdamStates,
    pub candidate_gate: AdamStates,
    pub output_projection: AdamStates,
}

impl OptimizerState {
    /// Zero moments shaped for `dims`
    pub fn new(dims: &ModelDims) -> Self {
        Self {
            forget_gate: AdamStates::new(dims.gate_shape()),
            input_gate: AdamStates::new(dims.gate_shape()),
            output_gate: AdamStates::new(dims.gate_shape()),
            candidate_gate: AdamStates::new(dims.gate_shape()),
            output_projection: AdamStates::new(dims.output_projection_shape()),
        }
    }

    pub fn get(&self, name: WeightName) -> &AdamStates {
        match name {
            WeightName::ForgetGate => &self.forget_gate,
            WeightName::InputGate => &self.input_gate,
            WeightName::OutputGate => &self.output_gate,
            WeightName::CandidateGate => &self.candidate_gate,
            WeightName::OutputProjection => &self.output_projection,
        }
    }

    pub fn get_mut(&mut self, name: WeightName) -> &mut AdamStates {
        match name {
            WeightName::ForgetGate => &mut self.forget_gate,
            WeightName::InputGate => &mut self.input_gate,
            WeightName::OutputGate => &mut self.output_gate,
            WeightName::CandidateGate => &mut self.candidate_gate,
            WeightName::OutputProjection => &mut self.output_projection,
        }
    }

    /// Checks that every moment, gradient and weight triple agrees in shape.
    ///
    /// # Errors
    ///
    /// - `ModelError::ShapeMismatch` - For the first tensor that differs from its weight
    pub fn validate_shapes(
        &self,
        parameters: &Parameters,
        gradients: &Gradients,
    ) -> Result<(), ModelError> {
        for name in WeightName::ALL {
            let expected = parameters.get(name).dim();
            ModelError::check_shape(
                &format!("d{}", name.as_str()),
                expected,
                gradients.get(name).dim(),
            )?;
            self.get(name).validate_shape(name.as_str(), expected)?;
        }
        Ok(())
    }
}

/// Applies one Adam step to every weight.
///
/// All shapes are checked before anything is written, so a mismatch leaves
/// `parameters` and `state` untouched.
///
/// # Parameters
///
/// - `parameters` - Weights to update in place
/// - `gradients` - Gradients from the backward pass
/// - `state` - Moment accumulators, updated in place
/// - `config` - Adam hyperparameters
///
/// # Errors
///
/// - `ModelError::ShapeMismatch` - If any weight, gradient or moment shapes disagree
pub fn adam_update(
    parameters: &mut Parameters,
    gradients: &Gradients,
    state: &mut OptimizerState,
    config: &AdamConfig,
) -> Result<(), ModelError> {
    state.validate_shapes(parameters, gradients)?;

    for name in WeightName::ALL {
        state
            .get_mut(name)
            .update_parameter(parameters.get_mut(name), gradients.get(name), config);
    }
    Ok(())
}
