use crate::Matrix;
use crate::backward::backward_propagation;
use crate::checkpoint::Checkpoint;
use crate::config::TrainingConfig;
use crate::dataset::SequenceBatch;
use crate::error::{IoError, ModelError};
use crate::evaluation::{Evaluation, evaluate};
use crate::forward::forward_propagation;
use crate::optimizer::{
    AdamConfig, OptimizerState, adam_update, embedding_gradient, embedding_update,
};
use crate::parameters::{EmbeddingTable, Parameters};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand::rngs::StdRng;

/// Metrics of one completed training step.
///
/// # Fields
///
/// - `step` - Index of the step (0 for the first step of a fresh run)
/// - `evaluation` - Loss, accuracy and perplexity of the forward pass, before the update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub step: usize,
    pub evaluation: Evaluation,
}

/// Per-step metrics recorded by [`Trainer::fit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingHistory {
    pub loss: Vec<f64>,
    pub perplexity: Vec<f64>,
    pub accuracy: Vec<f64>,
}

impl TrainingHistory {
    fn record(&mut self, evaluation: &Evaluation) {
        self.loss.push(evaluation.loss);
        self.perplexity.push(evaluation.perplexity);
        self.accuracy.push(evaluation.accuracy);
    }

    pub fn len(&self) -> usize {
        self.loss.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loss.is_empty()
    }
}

/// Owns the model state of a training run and drives its steps.
///
/// The trainer is the only writer of the parameters, the embedding table and
/// the Adam moments. A step either completes all of its updates or returns an
/// error with every one of them untouched.
///
/// # Example
/// ```rust,no_run
/// use rustylstm::prelude::*;
///
/// let config = TrainingConfig::new(4, 3, 8, 4, 2).with_iterations(200);
/// let sequences = vec![vec![0, 1, 2, 3, 0], vec![1, 2, 3, 0, 1]];
/// let batch = SequenceBatch::from_symbol_sequences(&sequences, 4).unwrap();
///
/// let mut trainer = Trainer::new(config).unwrap();
/// let history = trainer.train(&[batch.clone()]).unwrap();
/// println!("final loss: {:?}", history.loss.last());
///
/// let distributions = trainer.predict(batch.inputs()).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainingConfig,
    adam: AdamConfig,
    parameters: Parameters,
    embeddings: EmbeddingTable,
    optimizer_state: OptimizerState,
    step: usize,
}

impl Trainer {
    /// Creates a trainer with freshly initialised weights.
    ///
    /// Weights and embeddings are drawn from N(0, init_std) using a `StdRng`
    /// seeded with `config.seed`; the Adam moments start at zero.
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If the configuration is invalid
    pub fn new(config: TrainingConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let adam = config.adam_config()?;
        let dims = config.dims();

        let mut rng = StdRng::seed_from_u64(config.seed);
        let parameters = Parameters::random(&dims, config.init_std, &mut rng)?;
        let embeddings = EmbeddingTable::random(&dims, config.init_std, &mut rng)?;
        let optimizer_state = OptimizerState::new(&dims);

        log::debug!(
            "initialised model: vocab {}, input {}, hidden {}, output {}, seed {}",
            dims.vocab_size,
            dims.input_dim,
            dims.hidden_dim,
            dims.output_dim,
            config.seed
        );

        Ok(Self {
            config,
            adam,
            parameters,
            embeddings,
            optimizer_state,
            step: 0,
        })
    }

    /// Resumes a run from a checkpoint.
    ///
    /// # Errors
    ///
    /// - `IoError::StructureMismatch` - If the configuration is invalid, its
    ///   dimensions differ from the checkpoint's, or a stored matrix is malformed
    pub fn from_checkpoint(config: TrainingConfig, checkpoint: &Checkpoint) -> Result<Self, IoError> {
        let invalid = |e: ModelError| IoError::StructureMismatch(e.to_string());
        config.validate().map_err(invalid)?;
        let adam = config.adam_config().map_err(invalid)?;

        if config.dims() != checkpoint.dims {
            return Err(IoError::StructureMismatch(format!(
                "configuration dimensions {:?} differ from checkpoint dimensions {:?}",
                config.dims(),
                checkpoint.dims
            )));
        }

        let (parameters, embeddings, optimizer_state) = checkpoint.restore()?;
        log::info!("resumed training at step {}", checkpoint.step);

        Ok(Self {
            config,
            adam,
            parameters,
            embeddings,
            optimizer_state,
            step: checkpoint.step,
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn embeddings(&self) -> &EmbeddingTable {
        &self.embeddings
    }

    pub fn optimizer_state(&self) -> &OptimizerState {
        &self.optimizer_state
    }

    /// Number of completed training steps
    pub fn step(&self) -> usize {
        self.step
    }

    /// Checks that a batch matches the configured batch size and widths
    fn validate_batch(&self, batch: &SequenceBatch) -> Result<(), ModelError> {
        if batch.batch_size() != self.config.batch_size {
            return Err(ModelError::InputValidationError(format!(
                "batch has {} examples, configured batch_size is {}",
                batch.batch_size(),
                self.config.batch_size
            )));
        }
        ModelError::check_shape(
            "inputs",
            (self.config.batch_size, self.config.vocab_size),
            (batch.batch_size(), batch.input_width()),
        )?;
        ModelError::check_shape(
            "labels",
            (self.config.batch_size, self.config.output_dim),
            (batch.batch_size(), batch.label_width()),
        )
    }

    /// Runs one training step on `batch`.
    ///
    /// Phases, in order: forward pass, divergence check of the activations,
    /// evaluation, backward pass, divergence check of the gradients, shape
    /// checks, Adam update of the five weights, gradient-descent update of the
    /// embedding table. Every check happens before the first write.
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` / `ModelError::ShapeMismatch` - If the batch does not fit the model
    /// - `ModelError::DivergenceFault` - If activations, metrics or gradients are not finite
    /// - `ModelError::NumericUnderflowFault` - If perplexity underflows under the `Fault` policy
    pub fn train_step(&mut self, batch: &SequenceBatch) -> Result<StepReport, ModelError> {
        self.validate_batch(batch)?;

        let cache = forward_propagation(batch.inputs(), &self.parameters, &self.embeddings)?;
        cache.check_finite()?;

        let evaluation = evaluate(batch.labels(), &cache, self.config.underflow_policy)?;
        if !evaluation.is_finite() {
            return Err(ModelError::DivergenceFault(format!(
                "non-finite metrics at step {}: {:?}",
                self.step, evaluation
            )));
        }

        let backward = backward_propagation(batch.labels(), &cache, &self.parameters)?;
        backward.gradients.check_finite()?;

        let table_gradient =
            embedding_gradient(&self.embeddings, batch.inputs(), &backward.embedding_errors)?;
        if !table_gradient.iter().all(|v| v.is_finite()) {
            return Err(ModelError::DivergenceFault(
                "non-finite gradient for `embeddings`".to_string(),
            ));
        }
        self.optimizer_state
            .validate_shapes(&self.parameters, &backward.gradients)?;

        adam_update(
            &mut self.parameters,
            &backward.gradients,
            &mut self.optimizer_state,
            &self.adam,
        )?;
        embedding_update(
            &mut self.embeddings,
            batch.inputs(),
            &backward.embedding_errors,
            self.adam.learning_rate(),
        )?;

        let report = StepReport {
            step: self.step,
            evaluation,
        };
        self.step += 1;
        Ok(report)
    }

    /// Trains for `iterations` steps, cycling through `dataset`.
    ///
    /// Step k uses `dataset[k % dataset.len()]`. Metrics are logged every
    /// `log_every` steps and a progress bar shows the latest loss.
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If `dataset` is empty
    /// - Any error of [`Trainer::train_step`]; training stops at the failing step
    pub fn fit(
        &mut self,
        dataset: &[SequenceBatch],
        iterations: usize,
    ) -> Result<TrainingHistory, ModelError> {
        if dataset.is_empty() {
            return Err(ModelError::InputValidationError(
                "dataset must contain at least one sequence batch".to_string(),
            ));
        }

        let progress_bar = ProgressBar::new(iterations as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} | Loss: {msg}")
                .map_err(|e| ModelError::ProcessingError(e.to_string()))?
                .progress_chars("█▓░"),
        );

        let mut history = TrainingHistory::default();
        for k in 0..iterations {
            let batch = &dataset[k % dataset.len()];
            let report = match self.train_step(batch) {
                Ok(report) => report,
                Err(e) => {
                    progress_bar.abandon_with_message(format!("stopped: {}", e));
                    return Err(e);
                }
            };
            let evaluation = report.evaluation;
            history.record(&evaluation);

            if self.config.log_every > 0 && report.step % self.config.log_every == 0 {
                log::info!(
                    "step {}: loss {:.6}, perplexity {:.6}, accuracy {:.4}",
                    report.step,
                    evaluation.loss,
                    evaluation.perplexity,
                    evaluation.accuracy
                );
            }

            progress_bar.set_message(format!("{:.6}", evaluation.loss));
            progress_bar.inc(1);
        }
        progress_bar.finish_with_message("Training completed");

        log::info!(
            "training completed: {} steps over {} sequence batches",
            iterations,
            dataset.len()
        );
        Ok(history)
    }

    /// Trains for the configured number of iterations
    pub fn train(&mut self, dataset: &[SequenceBatch]) -> Result<TrainingHistory, ModelError> {
        self.fit(dataset, self.config.iterations)
    }

    /// Runs a forward pass and returns the class distribution of every step.
    ///
    /// Does not modify the model.
    pub fn predict(&self, inputs: &[Matrix]) -> Result<Vec<Matrix>, ModelError> {
        let cache = forward_propagation(inputs, &self.parameters, &self.embeddings)?;
        cache.check_finite()?;
        Ok(cache.outputs().to_vec())
    }

    /// Evaluates the current model on `batch` without training
    ///
    /// # Errors
    ///
    /// - `ModelError::DivergenceFault` - If the forward pass produces non-finite values
    pub fn evaluate(&self, batch: &SequenceBatch) -> Result<Evaluation, ModelError> {
        let cache = forward_propagation(batch.inputs(), &self.parameters, &self.embeddings)?;
        cache.check_finite()?;
        evaluate(batch.labels(), &cache, self.config.underflow_policy)
    }

    /// Snapshot of the current state, suitable for [`Trainer::from_checkpoint`]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::capture(
            self.step,
            self.config.dims(),
            &self.parameters,
            &self.embeddings,
            &self.optimizer_state,
        )
    }
}
