use crate::Matrix;
use crate::error::IoError;
use crate::optimizer::{AdamStates, OptimizerState};
use crate::parameters::{EmbeddingTable, ModelDims, Parameters, WeightName};
use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};
use std::fs::File;
use std::io::{BufWriter, Write};

fn array2_to_vec2(array: &Matrix) -> Vec<Vec<f64>> {
    array.outer_iter().map(|row| row.to_vec()).collect()
}

fn vec2_to_array2(vec: &[Vec<f64>]) -> Result<Matrix, IoError> {
    let rows = vec.len();
    let cols = if rows > 0 { vec[0].len() } else { 0 };
    let flat: Vec<f64> = vec.iter().flat_map(|row| row.iter().cloned()).collect();
    Matrix::from_shape_vec((rows, cols), flat)
        .map_err(|e| IoError::StructureMismatch(format!("ragged matrix in checkpoint: {}", e)))
}

/// Loads one stored matrix and checks it has the shape the model needs
fn load_matrix(
    vec: &[Vec<f64>],
    name: &str,
    expected: (usize, usize),
) -> Result<Matrix, IoError> {
    let matrix = vec2_to_array2(vec)?;
    if matrix.dim() != expected {
        return Err(IoError::StructureMismatch(format!(
            "`{}` has shape {:?} in checkpoint, model expects {:?}",
            name,
            matrix.dim(),
            expected
        )));
    }
    Ok(matrix)
}

/// Serializable form of one weight matrix and its Adam moments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableWeight {
    pub weight: Vec<Vec<f64>>,
    pub v: Vec<Vec<f64>>,
    pub s: Vec<Vec<f64>>,
}

/// A resumable snapshot of a training run.
///
/// Holds the step counter, the model dimensions, all five weights with their
/// Adam moments, and the embedding table. Written as pretty JSON.
///
/// # Fields
///
/// - `step` - Number of completed training steps
/// - `dims` - Model dimensions the matrices were created with
/// - `forget_gate`, `input_gate`, `output_gate`, `candidate_gate`, `output_projection` - Weights and moments
/// - `embeddings` - Embedding table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub step: usize,
    pub dims: ModelDims,
    pub forget_gate: SerializableWeight,
    pub input_gate: SerializableWeight,
    pub output_gate: SerializableWeight,
    pub candidate_gate: SerializableWeight,
    pub output_projection: SerializableWeight,
    pub embeddings: Vec<Vec<f64>>,
}

impl Checkpoint {
    /// Captures the current training state
    pub fn capture(
        step: usize,
        dims: ModelDims,
        parameters: &Parameters,
        embeddings: &EmbeddingTable,
        state: &OptimizerState,
    ) -> Self {
        let weight = |name: WeightName| SerializableWeight {
            weight: array2_to_vec2(parameters.get(name)),
            v: array2_to_vec2(&state.get(name).v),
            s: array2_to_vec2(&state.get(name).s),
        };

        Self {
            step,
            dims,
            forget_gate: weight(WeightName::ForgetGate),
            input_gate: weight(WeightName::InputGate),
            output_gate: weight(WeightName::OutputGate),
            candidate_gate: weight(WeightName::CandidateGate),
            output_projection: weight(WeightName::OutputProjection),
            embeddings: array2_to_vec2(&embeddings.table),
        }
    }

    fn weight(&self, name: WeightName) -> &SerializableWeight {
        match name {
            WeightName::ForgetGate => &self.forget_gate,
            WeightName::InputGate => &self.input_gate,
            WeightName::OutputGate => &self.output_gate,
            WeightName::CandidateGate => &self.candidate_gate,
            WeightName::OutputProjection => &self.output_projection,
        }
    }

    /// Rebuilds the weights, embedding table and optimizer state.
    ///
    /// # Errors
    ///
    /// - `IoError::StructureMismatch` - If a stored matrix is ragged or disagrees with `dims`
    pub fn restore(&self) -> Result<(Parameters, EmbeddingTable, OptimizerState), IoError> {
        let mut parameters = Parameters::zeros(&self.dims);
        let mut state = OptimizerState::new(&self.dims);

        for name in WeightName::ALL {
            let stored = self.weight(name);
            let shape = self.dims.shape_of(name);
            *parameters.get_mut(name) = load_matrix(&stored.weight, name.as_str(), shape)?;
            *state.get_mut(name) = AdamStates {
                v: load_matrix(&stored.v, &format!("v[{}]", name.as_str()), shape)?,
                s: load_matrix(&stored.s, &format!("s[{}]", name.as_str()), shape)?,
            };
        }

        let table = load_matrix(&self.embeddings, "embeddings", self.dims.embedding_shape())?;
        Ok((parameters, EmbeddingTable::new(table), state))
    }

    /// Writes the checkpoint as pretty JSON.
    ///
    /// # Errors
    ///
    /// - `IoError::StdIoError` - File creation or write failed
    /// - `IoError::JsonError` - Serialization failed
    pub fn save_to_path(&self, path: &str) -> Result<(), IoError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads a checkpoint written by [`Checkpoint::save_to_path`].
    ///
    /// Matrices are validated lazily by [`Checkpoint::restore`].
    ///
    /// # Errors
    ///
    /// - `IoError::StdIoError` - File not found or unreadable
    /// - `IoError::JsonError` - Content is not a checkpoint
    pub fn load_from_path(path: &str) -> Result<Self, IoError> {
        let reader = IoError::load_in_buf_reader(path)?;
        Ok(from_reader(reader)?)
    }
}
