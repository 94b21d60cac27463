use crate::error::{IoError, ModelError};
use crate::evaluation::UnderflowPolicy;
use crate::optimizer::AdamConfig;
use crate::parameters::ModelDims;
use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};
use std::fs::File;
use std::io::{BufWriter, Write};

fn default_learning_rate() -> f64 {
    0.005
}

fn default_beta1() -> f64 {
    0.90
}

fn default_beta2() -> f64 {
    0.99
}

fn default_epsilon() -> f64 {
    1e-6
}

fn default_init_std() -> f64 {
    0.01
}

fn default_seed() -> u64 {
    42
}

fn default_iterations() -> usize {
    1000
}

fn default_log_every() -> usize {
    1000
}

/// Hyperparameters of a training run, fixed at training start.
///
/// Optional fields fall back to these defaults when omitted from a JSON
/// file: learning rate 0.005, beta1 0.90, beta2 0.99, epsilon 1e-6, and
/// weights drawn from N(0, 0.01).
///
/// # Fields
///
/// - `vocab_size` - Width of an input symbol batch (rows of the embedding table)
/// - `input_dim` - Embedding width
/// - `hidden_dim` - Number of LSTM units
/// - `output_dim` - Number of output classes
/// - `batch_size` - Examples per batch; every training batch must have exactly this many rows
/// - `iterations` - Number of training steps run by `Trainer::train`
/// - `learning_rate` - Step size shared by the Adam update and the embedding update
/// - `beta1` - Adam first-moment decay
/// - `beta2` - Adam second-moment decay
/// - `epsilon` - Adam denominator constant
/// - `init_std` - Standard deviation of the initial weights and embeddings
/// - `seed` - Seed of the initialisation RNG
/// - `log_every` - Report metrics through the logger every this many steps (0 disables)
/// - `underflow_policy` - Handling of perplexity underflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub vocab_size: usize,
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub output_dim: usize,
    pub batch_size: usize,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_beta1")]
    pub beta1: f64,
    #[serde(default = "default_beta2")]
    pub beta2: f64,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "default_init_std")]
    pub init_std: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_log_every")]
    pub log_every: usize,
    #[serde(default)]
    pub underflow_policy: UnderflowPolicy,
}

impl TrainingConfig {
    /// Creates a configuration with the given dimensions and default scalars
    pub fn new(
        vocab_size: usize,
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
        batch_size: usize,
    ) -> Self {
        Self {
            vocab_size,
            input_dim,
            hidden_dim,
            output_dim,
            batch_size,
            iterations: default_iterations(),
            learning_rate: default_learning_rate(),
            beta1: default_beta1(),
            beta2: default_beta2(),
            epsilon: default_epsilon(),
            init_std: default_init_std(),
            seed: default_seed(),
            log_every: default_log_every(),
            underflow_policy: UnderflowPolicy::default(),
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_init_std(mut self, init_std: f64) -> Self {
        self.init_std = init_std;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    pub fn with_underflow_policy(mut self, policy: UnderflowPolicy) -> Self {
        self.underflow_policy = policy;
        self
    }

    pub fn dims(&self) -> ModelDims {
        ModelDims {
            vocab_size: self.vocab_size,
            input_dim: self.input_dim,
            hidden_dim: self.hidden_dim,
            output_dim: self.output_dim,
        }
    }

    /// Validated Adam hyperparameters of this run
    pub fn adam_config(&self) -> Result<AdamConfig, ModelError> {
        AdamConfig::new(self.learning_rate, self.beta1, self.beta2, self.epsilon)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If a dimension is zero or a scalar is out of range
    pub fn validate(&self) -> Result<(), ModelError> {
        for (value, name) in [
            (self.vocab_size, "vocab_size"),
            (self.input_dim, "input_dim"),
            (self.hidden_dim, "hidden_dim"),
            (self.output_dim, "output_dim"),
            (self.batch_size, "batch_size"),
        ] {
            if value == 0 {
                return Err(ModelError::InputValidationError(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        self.adam_config()?;

        if !(self.init_std > 0.0 && self.init_std.is_finite()) {
            return Err(ModelError::InputValidationError(format!(
                "init_std must be positive and finite, got {}",
                self.init_std
            )));
        }
        Ok(())
    }

    /// Loads and validates a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// - `IoError::StdIoError` - If the file cannot be read
    /// - `IoError::JsonError` - If the content is not a valid configuration
    /// - `IoError::StructureMismatch` - If the configuration fails validation
    pub fn from_json_path(path: &str) -> Result<Self, IoError> {
        let reader = IoError::load_in_buf_reader(path)?;
        let config: TrainingConfig = from_reader(reader)?;
        config
            .validate()
            .map_err(|e| IoError::StructureMismatch(e.to_string()))?;
        Ok(config)
    }

    /// Writes the configuration as pretty JSON
    pub fn save_to_path(&self, path: &str) -> Result<(), IoError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}
