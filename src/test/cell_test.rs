use super::*;

#[test]
fn test_lstm_cell_zero_weights() {
    let dims = small_dims();
    let parameters = Parameters::zeros(&dims);
    let embedding = array![[0.3, -0.2]];
    let prev_hidden = array![[0.1, 0.2, 0.3]];
    let prev_cell = array![[1.0, -2.0, 0.5]];

    let step = lstm_cell_forward(&embedding, &prev_hidden, &prev_cell, &parameters).unwrap();

    assert!(step.gates.forget.iter().all(|&v| v == 0.5));
    assert!(step.gates.input.iter().all(|&v| v == 0.5));
    assert!(step.gates.output.iter().all(|&v| v == 0.5));
    assert!(step.gates.candidate.iter().all(|&v| v == 0.0));
    for k in 0..3 {
        assert_abs_diff_eq!(step.cell[[0, k]], 0.5 * prev_cell[[0, k]], epsilon = 1e-15);
        assert_abs_diff_eq!(
            step.hidden[[0, k]],
            0.5 * (0.5 * prev_cell[[0, k]]).tanh(),
            epsilon = 1e-15
        );
    }
}

#[test]
fn test_lstm_cell_shapes() {
    let dims = small_dims();
    let (parameters, _) = seeded_model(&dims, 0.5, 3);
    let embedding = Matrix::ones((4, 2));
    let state = Matrix::zeros((4, 3));

    let step = lstm_cell_forward(&embedding, &state, &state, &parameters).unwrap();
    assert_eq!(step.gates.forget.dim(), (4, 3));
    assert_eq!(step.gates.candidate.dim(), (4, 3));
    assert_eq!(step.cell.dim(), (4, 3));
    assert_eq!(step.hidden.dim(), (4, 3));
    assert!(step.hidden.iter().all(|v| v.abs() < 1.0));
}

#[test]
fn test_lstm_cell_rejects_wrong_embedding_width() {
    let dims = small_dims();
    let parameters = Parameters::zeros(&dims);
    let state = Matrix::zeros((1, 3));
    let result = lstm_cell_forward(&Matrix::ones((1, 5)), &state, &state, &parameters);
    assert!(matches!(result, Err(ModelError::ShapeMismatch { .. })));
}

#[test]
fn test_lstm_cell_rejects_batch_disagreement() {
    let dims = small_dims();
    let parameters = Parameters::zeros(&dims);
    let result = lstm_cell_forward(
        &Matrix::ones((2, 2)),
        &Matrix::zeros((3, 3)),
        &Matrix::zeros((3, 3)),
        &parameters,
    );
    assert!(result.is_err());
}

#[test]
fn test_output_cell_distribution() {
    let dims = small_dims();
    let (parameters, _) = seeded_model(&dims, 1.0, 11);
    let hidden = array![[0.5, -0.5, 0.25], [0.0, 0.0, 0.0]];

    let out = output_cell_forward(&hidden, &parameters).unwrap();
    assert_eq!(out.dim(), (2, 2));
    for row in out.rows() {
        assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-12);
    }
    // a zero hidden state gives uniform logits
    assert_abs_diff_eq!(out[[1, 0]], 0.5, epsilon = 1e-15);
}

#[test]
fn test_output_cell_rejects_wrong_hidden_width() {
    let parameters = Parameters::zeros(&small_dims());
    let result = output_cell_forward(&Matrix::zeros((1, 4)), &parameters);
    assert!(matches!(result, Err(ModelError::ShapeMismatch { .. })));
}
