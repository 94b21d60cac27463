use super::*;
use crate::backward::calculate_output_cell_error;

const STEP: f64 = 1e-5;
const TOLERANCE: f64 = 1e-4;

fn loss_of(batch: &SequenceBatch, parameters: &Parameters, embeddings: &EmbeddingTable) -> f64 {
    let cache = forward_propagation(batch.inputs(), parameters, embeddings).unwrap();
    cross_entropy(batch.labels(), &cache).unwrap()
}

/// Compares every analytic gradient entry with a centred finite difference
fn check_gradients(dims: &ModelDims, batch: &SequenceBatch, seed: u64) {
    let (parameters, embeddings) = seeded_model(dims, 0.5, seed);
    let cache = forward_propagation(batch.inputs(), &parameters, &embeddings).unwrap();
    let result = backward_propagation(batch.labels(), &cache, &parameters).unwrap();

    for name in WeightName::ALL {
        let analytic = result.gradients.get(name);
        let (rows, cols) = analytic.dim();
        for r in 0..rows {
            for c in 0..cols {
                let mut plus = parameters.clone();
                plus.get_mut(name)[[r, c]] += STEP;
                let mut minus = parameters.clone();
                minus.get_mut(name)[[r, c]] -= STEP;

                let numeric = (loss_of(batch, &plus, &embeddings)
                    - loss_of(batch, &minus, &embeddings))
                    / (2.0 * STEP);
                assert!(
                    (numeric - analytic[[r, c]]).abs() < TOLERANCE,
                    "d{}[{}, {}]: numeric {} vs analytic {}",
                    name.as_str(),
                    r,
                    c,
                    numeric,
                    analytic[[r, c]]
                );
            }
        }
    }

    let analytic = embedding_gradient(&embeddings, batch.inputs(), &result.embedding_errors).unwrap();
    let (rows, cols) = analytic.dim();
    for r in 0..rows {
        for c in 0..cols {
            let mut plus = embeddings.clone();
            plus.table[[r, c]] += STEP;
            let mut minus = embeddings.clone();
            minus.table[[r, c]] -= STEP;

            let numeric = (loss_of(batch, &parameters, &plus)
                - loss_of(batch, &parameters, &minus))
                / (2.0 * STEP);
            assert!(
                (numeric - analytic[[r, c]]).abs() < TOLERANCE,
                "dembeddings[{}, {}]: numeric {} vs analytic {}",
                r,
                c,
                numeric,
                analytic[[r, c]]
            );
        }
    }
}

#[test]
fn test_gradient_check_single_example() {
    let dims = small_dims();
    let batch = make_batch(&[&[0], &[2]], &[&[1], &[0]], &dims);
    check_gradients(&dims, &batch, 17);
}

#[test]
fn test_gradient_check_batch_of_three() {
    let dims = small_dims();
    let batch = make_batch(
        &[&[0, 1, 2], &[2, 2, 0], &[1, 0, 1]],
        &[&[1, 0, 1], &[0, 1, 1], &[0, 0, 1]],
        &dims,
    );
    check_gradients(&dims, &batch, 23);
}

#[test]
fn test_single_step_hidden_rows_are_zero() {
    let dims = small_dims();
    let (parameters, embeddings) = seeded_model(&dims, 0.5, 31);
    let batch = make_batch(&[&[1, 2]], &[&[0, 1]], &dims);

    let cache = forward_propagation(batch.inputs(), &parameters, &embeddings).unwrap();
    let gradients = backward_propagation(batch.labels(), &cache, &parameters)
        .unwrap()
        .gradients;

    // the only step sees a zero previous hidden state
    for name in [
        WeightName::ForgetGate,
        WeightName::InputGate,
        WeightName::OutputGate,
        WeightName::CandidateGate,
    ] {
        let gradient = gradients.get(name);
        for r in dims.input_dim..dims.input_dim + dims.hidden_dim {
            for c in 0..dims.hidden_dim {
                assert_eq!(gradient[[r, c]], 0.0, "d{}[{}, {}]", name.as_str(), r, c);
            }
        }
    }
    // and a zero previous cell state, so the forget gate gets no error at all
    assert!(gradients.forget_gate.iter().all(|&v| v == 0.0));
    assert!(gradients.input_gate.iter().any(|&v| v != 0.0));
}

#[test]
fn test_backward_result_shapes() {
    let dims = small_dims();
    let (parameters, embeddings) = seeded_model(&dims, 0.5, 2);
    let batch = make_batch(&[&[0, 1], &[1, 2], &[2, 0]], &[&[1, 1], &[0, 1], &[1, 0]], &dims);

    let cache = forward_propagation(batch.inputs(), &parameters, &embeddings).unwrap();
    let result = backward_propagation(batch.labels(), &cache, &parameters).unwrap();

    for name in WeightName::ALL {
        assert_eq!(result.gradients.get(name).dim(), parameters.get(name).dim());
    }
    assert_eq!(result.embedding_errors.len(), 3);
    assert!(result.embedding_errors.iter().all(|e| e.dim() == (2, 2)));
    assert!(result.gradients.check_finite().is_ok());
}

#[test]
fn test_output_cell_error_is_prediction_minus_label() {
    let dims = small_dims();
    let (parameters, embeddings) = seeded_model(&dims, 0.5, 8);
    let batch = make_batch(&[&[0], &[1]], &[&[1], &[0]], &dims);

    let cache = forward_propagation(batch.inputs(), &parameters, &embeddings).unwrap();
    let errors = calculate_output_cell_error(batch.labels(), &cache, &parameters).unwrap();

    for t in 0..2 {
        let expected = cache.output(t) - &batch.labels()[t];
        assert_eq!(errors.output_errors[t], expected);
        assert_eq!(
            errors.hidden_errors[t],
            expected.dot(&parameters.output_projection.t())
        );
    }
}

#[test]
fn test_backward_rejects_misaligned_labels() {
    let dims = small_dims();
    let (parameters, embeddings) = seeded_model(&dims, 0.5, 8);
    let batch = make_batch(&[&[0], &[1]], &[&[1], &[0]], &dims);
    let cache = forward_propagation(batch.inputs(), &parameters, &embeddings).unwrap();

    let result = backward_propagation(&batch.labels()[..1], &cache, &parameters);
    assert!(matches!(result, Err(ModelError::ProcessingError(_))));
}

#[test]
fn test_check_finite_flags_nan_gradient() {
    let dims = small_dims();
    let parameters = Parameters::zeros(&dims);
    let mut gradients = Gradients::zeros_like(&parameters);
    assert!(gradients.check_finite().is_ok());

    gradients.candidate_gate[[0, 0]] = f64::INFINITY;
    assert!(matches!(
        gradients.check_finite(),
        Err(ModelError::DivergenceFault(_))
    ));
}
