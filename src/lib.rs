use ndarray::Array2;

/// Dense row-major matrix used for every weight, state and batch: `[rows, columns]` of `f64`
pub type Matrix = Array2<f64>;

/// Element-wise activation functions and their derivatives.
///
/// - `sigmoid` - Logistic function with the input clamped to [-500, 500]
/// - `tanh` - Hyperbolic tangent
/// - `sigmoid_derivative` / `tanh_derivative` - Derivatives expressed through the activation output
/// - `softmax` - Row-wise softmax with the row maximum subtracted first
pub mod activation;

/// Backpropagation through time.
///
/// Given the cached forward pass of a sequence and its labels, computes the
/// gradient of every weight matrix and the error of every input embedding.
///
/// # Example
/// ```rust
/// use rustylstm::prelude::*;
/// use ndarray_rand::rand::SeedableRng;
/// use ndarray_rand::rand::rngs::StdRng;
///
/// let dims = ModelDims { vocab_size: 3, input_dim: 2, hidden_dim: 4, output_dim: 3 };
/// let mut rng = StdRng::seed_from_u64(7);
/// let parameters = Parameters::random(&dims, 0.1, &mut rng).unwrap();
/// let embeddings = EmbeddingTable::random(&dims, 0.1, &mut rng).unwrap();
///
/// let batch = SequenceBatch::from_symbol_sequences(&[vec![0, 1, 2]], 3).unwrap();
/// let cache = forward_propagation(batch.inputs(), &parameters, &embeddings).unwrap();
/// let result = backward_propagation(batch.labels(), &cache, &parameters).unwrap();
///
/// assert_eq!(result.gradients.forget_gate.dim(), parameters.forget_gate.dim());
/// assert_eq!(result.embedding_errors.len(), 2);
/// ```
pub mod backward;

/// The two cells of the model: the LSTM recurrence and the softmax output projection
pub mod cell;

/// Serializable snapshots of a training run (step, weights, Adam moments, embeddings)
pub mod checkpoint;

/// Training hyperparameters with JSON loading and validation
pub mod config;

/// Sequence batches, one-hot encoding and a synthetic sequence generator.
///
/// # Example
/// ```rust
/// use rustylstm::dataset::{SequenceBatch, one_hot};
///
/// let encoded = one_hot(&[2, 0], 3).unwrap();
/// assert_eq!(encoded[[0, 2]], 1.0);
///
/// // inputs are symbols 0..L-1, labels symbols 1..L
/// let batch = SequenceBatch::from_symbol_sequences(&[vec![0, 1, 2, 1]], 3).unwrap();
/// assert_eq!(batch.timesteps(), 3);
/// ```
pub mod dataset;

/// Error types returned by every fallible operation of this crate
pub mod error;

/// Loss, accuracy and perplexity of a forward pass, and the categorical
/// cross-entropy objective differentiated by the backward pass
pub mod evaluation;

/// Unrolled forward pass recording every activation the backward pass needs
pub mod forward;

/// Adam update of the weight matrices and plain gradient descent on the embedding table.
///
/// The Adam update uses no bias correction:
///
/// - v = β1 · v + (1 - β1) · g
/// - s = β2 · s + (1 - β2) · g²
/// - W = W - lr · v / (√s + ε)
pub mod optimizer;

/// Weight matrices, embedding table and model dimensions
pub mod parameters;

/// A convenience module that re-exports the most commonly used types and functions.
///
/// # Examples
/// ```rust
/// use rustylstm::prelude::*;
///
/// let config = TrainingConfig::new(4, 3, 8, 4, 1);
/// let trainer = Trainer::new(config).unwrap();
/// assert_eq!(trainer.step(), 0);
/// ```
pub mod prelude;

/// Training loop driver owning the model state
pub mod trainer;
