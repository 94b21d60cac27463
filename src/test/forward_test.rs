use super::*;

fn sample_batch(dims: &ModelDims) -> SequenceBatch {
    make_batch(&[&[0, 2], &[1, 1], &[2, 0]], &[&[1, 0], &[0, 1], &[1, 1]], dims)
}

#[test]
fn test_forward_cache_layout() {
    let dims = small_dims();
    let (parameters, embeddings) = seeded_model(&dims, 0.3, 5);
    let batch = sample_batch(&dims);

    let cache = forward_propagation(batch.inputs(), &parameters, &embeddings).unwrap();

    assert_eq!(cache.timesteps(), 3);
    assert_eq!(cache.batch_size(), 2);
    assert_eq!(cache.hidden_states().len(), 4);
    assert_eq!(cache.cell_states().len(), 4);
    assert_eq!(cache.outputs().len(), 3);
    assert!(cache.prev_hidden(0).iter().all(|&v| v == 0.0));
    assert!(cache.prev_cell(0).iter().all(|&v| v == 0.0));

    for t in 0..3 {
        assert_eq!(cache.embedding(t).dim(), (2, 2));
        assert_eq!(cache.hidden(t).dim(), (2, 3));
        assert_eq!(cache.output(t).dim(), (2, 2));
        // the state produced at t is the state consumed at t + 1
        if t + 1 < 3 {
            assert_eq!(cache.hidden(t), cache.prev_hidden(t + 1));
            assert_eq!(cache.cell(t), cache.prev_cell(t + 1));
        }
        for row in cache.output(t).rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-12);
        }
    }
    assert!(cache.check_finite().is_ok());
}

#[test]
fn test_forward_embeds_one_hot_rows() {
    let dims = small_dims();
    let (parameters, embeddings) = seeded_model(&dims, 0.3, 5);
    let batch = sample_batch(&dims);

    let cache = forward_propagation(batch.inputs(), &parameters, &embeddings).unwrap();
    // example 0 reads symbol 0 at step 0, example 1 reads symbol 2
    for k in 0..2 {
        assert_eq!(cache.embedding(0)[[0, k]], embeddings.table[[0, k]]);
        assert_eq!(cache.embedding(0)[[1, k]], embeddings.table[[2, k]]);
    }
}

#[test]
fn test_forward_is_deterministic() {
    let dims = small_dims();
    let (parameters, embeddings) = seeded_model(&dims, 0.3, 9);
    let batch = sample_batch(&dims);

    let first = forward_propagation(batch.inputs(), &parameters, &embeddings).unwrap();
    let second = forward_propagation(batch.inputs(), &parameters, &embeddings).unwrap();
    for t in 0..first.timesteps() {
        assert_eq!(bits(first.output(t)), bits(second.output(t)));
        assert_eq!(bits(first.hidden(t)), bits(second.hidden(t)));
    }

    // same seed, same model
    let (parameters_again, embeddings_again) = seeded_model(&dims, 0.3, 9);
    assert_eq!(parameters, parameters_again);
    assert_eq!(embeddings, embeddings_again);
}

#[test]
fn test_forward_rejects_empty_sequence() {
    let dims = small_dims();
    let (parameters, embeddings) = seeded_model(&dims, 0.3, 1);
    let result = forward_propagation(&[], &parameters, &embeddings);
    assert!(matches!(result, Err(ModelError::InputValidationError(_))));
}

#[test]
fn test_forward_rejects_wrong_vocab_width() {
    let dims = small_dims();
    let (parameters, embeddings) = seeded_model(&dims, 0.3, 1);
    let inputs = vec![Matrix::ones((1, 3)), Matrix::ones((1, 4))];
    let result = forward_propagation(&inputs, &parameters, &embeddings);
    assert!(matches!(result, Err(ModelError::ShapeMismatch { .. })));
}

#[test]
fn test_check_finite_reports_divergence() {
    let dims = small_dims();
    let (mut parameters, embeddings) = seeded_model(&dims, 0.3, 1);
    parameters.output_projection[[0, 0]] = f64::NAN;
    let batch = sample_batch(&dims);

    let cache = forward_propagation(batch.inputs(), &parameters, &embeddings).unwrap();
    assert!(matches!(
        cache.check_finite(),
        Err(ModelError::DivergenceFault(_))
    ));
}

#[test]
fn test_forward_rejects_mismatched_weights() {
    let dims = small_dims();
    let batch = sample_batch(&dims);

    let (mut parameters, embeddings) = seeded_model(&dims, 0.3, 1);
    parameters.input_gate = Matrix::zeros((4, 3));
    match forward_propagation(batch.inputs(), &parameters, &embeddings) {
        Err(ModelError::ShapeMismatch { name, expected, got }) => {
            assert_eq!(name, "input_gate");
            assert_eq!(expected, (5, 3));
            assert_eq!(got, (4, 3));
        }
        other => panic!("expected a shape mismatch, got {:?}", other.map(|_| ())),
    }

    let (mut parameters, embeddings) = seeded_model(&dims, 0.3, 1);
    parameters.candidate_gate = Matrix::zeros((5, 2));
    assert!(matches!(
        forward_propagation(batch.inputs(), &parameters, &embeddings),
        Err(ModelError::ShapeMismatch { .. })
    ));

    let (mut parameters, embeddings) = seeded_model(&dims, 0.3, 1);
    parameters.output_projection = Matrix::zeros((4, 2));
    assert!(matches!(
        forward_propagation(batch.inputs(), &parameters, &embeddings),
        Err(ModelError::ShapeMismatch { .. })
    ));

    let (parameters, _) = seeded_model(&dims, 0.3, 1);
    let narrow = EmbeddingTable::new(Matrix::zeros((3, 1)));
    assert!(matches!(
        forward_propagation(batch.inputs(), &parameters, &narrow),
        Err(ModelError::ShapeMismatch { .. })
    ));
}
