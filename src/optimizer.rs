use crate::Matrix;
use crate::backward::Gradients;
use crate::error::ModelError;
use crate::parameters::{EmbeddingTable, ModelDims, Parameters, WeightName};
use input_validation_function::*;

/// Adam update of the LSTM and output weights
pub mod adam;
/// Plain gradient descent on the embedding table
pub mod embedding_sgd;
/// Input validation functions for optimizer hyperparameters
mod input_validation_function;

pub use adam::{AdamConfig, AdamStates, OptimizerState, adam_update};
pub use embedding_sgd::{embedding_gradient, embedding_update};
