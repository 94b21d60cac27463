use crate::error::ModelError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Bernoulli;

/// Generates gesture-like symbol sequences.
///
/// Each sequence belongs to one of `num_gestures` gestures. Gesture `k`
/// starts at a random symbol and advances by `k + 1` symbols (mod
/// `vocab_size`) per step, so the next symbol is predictable from the
/// previous ones. With probability `noise` a symbol is replaced by a random
/// one. The same seed always yields the same sequences.
///
/// # Parameters
///
/// - `num_sequences` - Number of sequences to generate
/// - `length` - Symbols per sequence
/// - `vocab_size` - Number of distinct symbols
/// - `num_gestures` - Number of distinct stride patterns
/// - `noise` - Replacement probability in [0, 1]
/// - `seed` - RNG seed
///
/// # Errors
///
/// - `ModelError::InputValidationError` - If a count is zero or `noise` is not a probability
pub fn gesture_sequences(
    num_sequences: usize,
    length: usize,
    vocab_size: usize,
    num_gestures: usize,
    noise: f64,
    seed: u64,
) -> Result<Vec<Vec<usize>>, ModelError> {
    if vocab_size == 0 || num_gestures == 0 || length == 0 {
        return Err(ModelError::InputValidationError(
            "length, vocab_size and num_gestures must be greater than 0".to_string(),
        ));
    }
    let corrupt = Bernoulli::new(noise).map_err(|e| {
        ModelError::InputValidationError(format!("invalid noise probability {}: {}", noise, e))
    })?;

    let mut rng = StdRng::seed_from_u64(seed);
    let sequences: Vec<Vec<usize>> = (0..num_sequences)
        .map(|_| {
            let stride = rng.random_range(0..num_gestures) + 1;
            let mut symbol = rng.random_range(0..vocab_size);
            (0..length)
                .map(|_| {
                    let emitted = if rng.sample(corrupt) {
                        rng.random_range(0..vocab_size)
                    } else {
                        symbol
                    };
                    symbol = (symbol + stride) % vocab_size;
                    emitted
                })
                .collect::<Vec<usize>>()
        })
        .collect();
    Ok(sequences)
}
