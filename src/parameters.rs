use crate::Matrix;
use crate::error::ModelError;
use ndarray::Array;
use ndarray_rand::RandomExt;
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::Normal;
use serde::{Deserialize, Serialize};

/// Dimensions shared by every tensor in the model.
///
/// # Fields
///
/// - `vocab_size` - Number of rows of the embedding table (width of a one-hot input batch)
/// - `input_dim` - Embedding width fed to the LSTM cell
/// - `hidden_dim` - Number of LSTM units
/// - `output_dim` - Number of output classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDims {
    pub vocab_size: usize,
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub output_dim: usize,
}

impl ModelDims {
    /// Shape of every gate weight matrix: (input_dim + hidden_dim, hidden_dim)
    pub fn gate_shape(&self) -> (usize, usize) {
        (self.input_dim + self.hidden_dim, self.hidden_dim)
    }

    /// Shape of the output projection: (hidden_dim, output_dim)
    pub fn output_projection_shape(&self) -> (usize, usize) {
        (self.hidden_dim, self.output_dim)
    }

    /// Shape of the embedding table: (vocab_size, input_dim)
    pub fn embedding_shape(&self) -> (usize, usize) {
        (self.vocab_size, self.input_dim)
    }

    /// Expected shape of the weight called `name`
    pub fn shape_of(&self, name: WeightName) -> (usize, usize) {
        match name {
            WeightName::OutputProjection => self.output_projection_shape(),
            _ => self.gate_shape(),
        }
    }
}

/// Names of the five learnable weight matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightName {
    ForgetGate,
    InputGate,
    OutputGate,
    CandidateGate,
    OutputProjection,
}

impl WeightName {
    /// Every weight, in the order updates are applied
    pub const ALL: [WeightName; 5] = [
        WeightName::ForgetGate,
        WeightName::InputGate,
        WeightName::OutputGate,
        WeightName::CandidateGate,
        WeightName::OutputProjection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeightName::ForgetGate => "forget_gate",
            WeightName::InputGate => "input_gate",
            WeightName::OutputGate => "output_gate",
            WeightName::CandidateGate => "candidate_gate",
            WeightName::OutputProjection => "output_projection",
        }
    }
}

/// Draws a (rows, cols) matrix from N(0, std)
fn random_normal<R: Rng + ?Sized>(
    shape: (usize, usize),
    std: f64,
    rng: &mut R,
) -> Result<Matrix, ModelError> {
    let normal = Normal::new(0.0, std).map_err(|e| {
        ModelError::InputValidationError(format!("invalid init standard deviation {}: {}", std, e))
    })?;
    Ok(Array::random_using(shape, normal, rng))
}

/// The learnable weights of the LSTM cell and the output cell.
///
/// Every gate matrix multiplies the concatenation `[embedding, prev_hidden]`,
/// so it has shape (input_dim + hidden_dim, hidden_dim). The output
/// projection maps a hidden state to class logits.
///
/// # Fields
///
/// - `forget_gate` - Forget gate weights
/// - `input_gate` - Input gate weights
/// - `output_gate` - Output gate weights
/// - `candidate_gate` - Candidate ("gate gate") weights, tanh-activated
/// - `output_projection` - Hidden-to-output weights with shape (hidden_dim, output_dim)
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub forget_gate: Matrix,
    pub input_gate: Matrix,
    pub output_gate: Matrix,
    pub candidate_gate: Matrix,
    pub output_projection: Matrix,
}

impl Parameters {
    /// Creates parameters drawn from a normal distribution N(0, std).
    ///
    /// Deterministic for a seeded `rng`.
    ///
    /// # Parameters
    ///
    /// - `dims` - Model dimensions
    /// - `std` - Standard deviation of the initial weights (0.01 by default)
    /// - `rng` - Random number generator used for every draw
    ///
    /// # Errors
    ///
    /// - `ModelError::InputValidationError` - If `std` is not a valid standard deviation
    pub fn random<R: Rng + ?Sized>(
        dims: &ModelDims,
        std: f64,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        let gate_shape = dims.gate_shape();
        Ok(Self {
            forget_gate: random_normal(gate_shape, std, rng)?,
            input_gate: random_normal(gate_shape, std, rng)?,
            output_gate: random_normal(gate_shape, std, rng)?,
            candidate_gate: random_normal(gate_shape, std, rng)?,
            output_projection: random_normal(dims.output_projection_shape(), std, rng)?,
        })
    }

    /// Creates zero matrices with the shapes required by `dims`
    pub fn zeros(dims: &ModelDims) -> Self {
        let gate_shape = dims.gate_shape();
        Self {
            forget_gate: Matrix::zeros(gate_shape),
            input_gate: Matrix::zeros(gate_shape),
            output_gate: Matrix::zeros(gate_shape),
            candidate_gate: Matrix::zeros(gate_shape),
            output_projection: Matrix::zeros(dims.output_projection_shape()),
        }
    }

    pub fn get(&self, name: WeightName) -> &Matrix {
        match name {
            WeightName::ForgetGate => &self.forget_gate,
            WeightName::InputGate => &self.input_gate,
            WeightName::OutputGate => &self.output_gate,
            WeightName::CandidateGate => &self.candidate_gate,
            WeightName::OutputProjection => &self.output_projection,
        }
    }

    pub fn get_mut(&mut self, name: WeightName) -> &mut Matrix {
        match name {
            WeightName::ForgetGate => &mut self.forget_gate,
            WeightName::InputGate => &mut self.input_gate,
            WeightName::OutputGate => &mut self.output_gate,
            WeightName::CandidateGate => &mut self.candidate_gate,
            WeightName::OutputProjection => &mut self.output_projection,
        }
    }

    /// Embedding width, inferred from the gate matrices
    pub fn input_dim(&self) -> usize {
        self.forget_gate.nrows() - self.forget_gate.ncols()
    }

    pub fn hidden_dim(&self) -> usize {
        self.forget_gate.ncols()
    }

    pub fn output_dim(&self) -> usize {
        self.output_projection.ncols()
    }

    /// Checks every matrix against the shapes required by `dims`.
    ///
    /// # Errors
    ///
    /// - `ModelError::ShapeMismatch` - For the first matrix whose shape differs
    pub fn validate_shapes(&self, dims: &ModelDims) -> Result<(), ModelError> {
        for name in WeightName::ALL {
            ModelError::check_shape(name.as_str(), dims.shape_of(name), self.get(name).dim())?;
        }
        Ok(())
    }
}

/// Embedding table mapping a (one-hot or soft) symbol vector to a dense vector.
///
/// Shape (vocab_size, input_dim). A batch of inputs `x` with shape
/// (batch, vocab_size) is embedded as `x @ table`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingTable {
    pub table: Matrix,
}

impl EmbeddingTable {
    /// Creates an embedding table drawn from N(0, std)
    pub fn random<R: Rng + ?Sized>(
        dims: &ModelDims,
        std: f64,
        rng: &mut R,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            table: random_normal(dims.embedding_shape(), std, rng)?,
        })
    }

    pub fn new(table: Matrix) -> Self {
        Self { table }
    }

    pub fn vocab_size(&self) -> usize {
        self.table.nrows()
    }

    pub fn input_dim(&self) -> usize {
        self.table.ncols()
    }

    /// Embeds a batch of symbol vectors.
    ///
    /// # Parameters
    ///
    /// * `inputs` - One-hot (or soft) symbol batch with shape (batch, vocab_size)
    ///
    /// # Returns
    ///
    /// * `Matrix` - Embeddings with shape (batch, input_dim)
    pub fn embed(&self, inputs: &Matrix) -> Matrix {
        inputs.dot(&self.table)
    }
}
