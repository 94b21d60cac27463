pub use crate::Matrix;
pub use crate::activation::{sigmoid, sigmoid_derivative, softmax, tanh, tanh_derivative};
pub use crate::backward::{BackwardResult, Gradients, backward_propagation};
pub use crate::cell::{GateActivations, lstm_cell_forward, output_cell_forward};
pub use crate::checkpoint::Checkpoint;
pub use crate::config::TrainingConfig;
pub use crate::dataset::synthetic::gesture_sequences;
pub use crate::dataset::{SequenceBatch, one_hot, symbol_batches};
pub use crate::error::{IoError, ModelError};
pub use crate::evaluation::{Evaluation, UnderflowPolicy, cross_entropy, evaluate};
pub use crate::forward::{TimestepCache, forward_propagation};
pub use crate::optimizer::{
    AdamConfig, AdamStates, OptimizerState, adam_update, embedding_gradient, embedding_update,
};
pub use crate::parameters::{EmbeddingTable, ModelDims, Parameters, WeightName};
pub use crate::trainer::{StepReport, Trainer, TrainingHistory};
