use crate::Matrix;
use crate::error::ModelError;
use crate::forward::TimestepCache;
use ndarray::{Array1, ArrayView1, Axis, Zip};
use serde::{Deserialize, Serialize};

/// Predictions are kept inside [PROBABILITY_EPSILON, 1 - PROBABILITY_EPSILON] in the loss term
const PROBABILITY_EPSILON: f64 = 1e-12;

/// What to do when the per-example probability product underflows below
/// `f64::MIN_POSITIVE` (zero or subnormal), where its inverse would overflow.
///
/// # Variants
///
/// - `Clamp` - Floor the product at `f64::MIN_POSITIVE` before inverting it
/// - `Fault` - Report `ModelError::NumericUnderflowFault`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnderflowPolicy {
    #[default]
    Clamp,
    Fault,
}

/// Diagnostics of one forward pass. They never feed back into gradients.
///
/// # Fields
///
/// - `loss` - Negative summed binary-style cross-entropy divided by batch size
/// - `accuracy` - Fraction of (step, example) pairs whose argmax matches the label
/// - `perplexity` - Batch mean of (1 / P(true sequence))^(1/T)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f64,
    pub accuracy: f64,
    pub perplexity: f64,
}

impl Evaluation {
    pub fn is_finite(&self) -> bool {
        self.loss.is_finite() && self.accuracy.is_finite() && self.perplexity.is_finite()
    }
}

/// Index of the first maximum of a row
fn argmax(row: ArrayView1<f64>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_i, best_v), (i, &v)| {
            if v > best_v { (i, v) } else { (best_i, best_v) }
        })
        .0
}

/// Checks that `labels` has one (batch, output_dim) matrix per cached step
fn validate_labels(labels: &[Matrix], cache: &TimestepCache) -> Result<(), ModelError> {
    if labels.len() != cache.timesteps() {
        return Err(ModelError::ProcessingError(format!(
            "got {} label batches for {} unrolled steps",
            labels.len(),
            cache.timesteps()
        )));
    }
    for (t, y) in labels.iter().enumerate() {
        ModelError::check_shape(&format!("labels[{}]", t), cache.output(t).dim(), y.dim())?;
    }
    Ok(())
}

/// Computes loss, accuracy and perplexity of a forward pass.
///
/// Per step t with labels y and predictions p:
/// - loss term: sum(y * log(p) + (1 - y) * log(1 - p)) over classes and examples
/// - accuracy term: number of examples with argmax(y) == argmax(p)
/// - probability product: multiplied by sum(y * p) over classes, per example
///
/// Then `loss = -sum(terms) / batch`, `accuracy = sum(correct) / batch / T` and
/// `perplexity = mean over batch of (1 / product)^(1 / T)`.
///
/// # Parameters
///
/// - `labels` - T label batches, one-hot or soft, each (batch, output_dim)
/// - `cache` - Forward pass over the same sequence
/// - `policy` - Handling of a probability product that underflows to zero
///
/// # Errors
///
/// - `ModelError::ProcessingError` / `ModelError::ShapeMismatch` - If labels do not line up with the cache
/// - `ModelError::NumericUnderflowFault` - If a product is zero and `policy` is `Fault`
pub fn evaluate(
    labels: &[Matrix],
    cache: &TimestepCache,
    policy: UnderflowPolicy,
) -> Result<Evaluation, ModelError> {
    validate_labels(labels, cache)?;

    let timesteps = cache.timesteps();
    let batch_size = cache.batch_size() as f64;

    let mut loss_sum = 0.0;
    let mut correct = 0.0;
    let mut prob = Array1::<f64>::ones(cache.batch_size());

    for (t, y) in labels.iter().enumerate() {
        let pred = cache.output(t);

        prob *= &(y * pred).sum_axis(Axis(1));

        let clipped = pred.mapv(|p| p.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON));
        let mut step_loss = 0.0;
        Zip::from(y).and(&clipped).for_each(|&y, &p| {
            step_loss += y * p.ln() + (1.0 - y) * (1.0 - p).ln();
        });
        loss_sum += step_loss;

        correct += y
            .outer_iter()
            .zip(pred.outer_iter())
            .filter(|(y_row, p_row)| argmax(y_row.view()) == argmax(p_row.view()))
            .count() as f64;
    }

    let exponent = 1.0 / timesteps as f64;
    let mut perplexity_sum = 0.0;
    for (b, &p) in prob.iter().enumerate() {
        let p = if p >= f64::MIN_POSITIVE {
            p
        } else {
            match policy {
                UnderflowPolicy::Fault => {
                    return Err(ModelError::NumericUnderflowFault(format!(
                        "probability of the true sequence underflowed to {} for example {}",
                        p, b
                    )));
                }
                UnderflowPolicy::Clamp => {
                    log::warn!(
                        "probability product underflowed for example {}, clamping to {:e}",
                        b,
                        f64::MIN_POSITIVE
                    );
                    f64::MIN_POSITIVE
                }
            }
        };
        perplexity_sum += (1.0 / p).powf(exponent);
    }

    Ok(Evaluation {
        loss: -loss_sum / batch_size,
        accuracy: correct / batch_size / timesteps as f64,
        perplexity: perplexity_sum / batch_size,
    })
}

/// Categorical cross-entropy `-sum_t sum(y * log(p)) / batch` of a forward pass.
///
/// This is the objective whose gradient the backward pass computes: with a
/// softmax output, d/d(logits) of this loss is `(p - y) / batch`.
///
/// # Errors
///
/// - `ModelError::ProcessingError` / `ModelError::ShapeMismatch` - If labels do not line up with the cache
pub fn cross_entropy(labels: &[Matrix], cache: &TimestepCache) -> Result<f64, ModelError> {
    validate_labels(labels, cache)?;

    let mut total = 0.0;
    for (t, y) in labels.iter().enumerate() {
        Zip::from(y).and(cache.output(t)).for_each(|&y, &p| {
            if y != 0.0 {
                total += y * p.ln();
            }
        });
    }
    Ok(-total / cache.batch_size() as f64)
}
