use super::*;

fn next_symbol_config() -> TrainingConfig {
    TrainingConfig::new(3, 2, 4, 3, 2)
        .with_learning_rate(0.05)
        .with_init_std(0.1)
        .with_log_every(0)
}

fn next_symbol_batch() -> SequenceBatch {
    SequenceBatch::from_symbol_sequences(&[vec![0, 1, 2, 0], vec![2, 0, 1, 2]], 3).unwrap()
}

#[test]
fn test_trainer_initialisation_is_seeded() {
    let a = Trainer::new(next_symbol_config()).unwrap();
    let b = Trainer::new(next_symbol_config()).unwrap();
    assert_eq!(a.parameters(), b.parameters());
    assert_eq!(a.embeddings(), b.embeddings());
    assert_eq!(a.step(), 0);

    let c = Trainer::new(next_symbol_config().with_seed(1)).unwrap();
    assert_ne!(a.parameters(), c.parameters());
    assert!(
        a.optimizer_state()
            .forget_gate
            .v
            .iter()
            .all(|&v| v == 0.0)
    );
}

#[test]
fn test_trainer_rejects_invalid_config() {
    let result = Trainer::new(TrainingConfig::new(3, 0, 4, 3, 2));
    assert!(matches!(result, Err(ModelError::InputValidationError(_))));
}

#[test]
fn test_train_step_updates_everything() {
    let mut trainer = Trainer::new(next_symbol_config()).unwrap();
    let before = trainer.clone();
    let batch = next_symbol_batch();

    let report = trainer.train_step(&batch).unwrap();
    assert_eq!(report.step, 0);
    assert_eq!(trainer.step(), 1);
    assert!(report.evaluation.is_finite());
    assert_ne!(trainer.parameters(), before.parameters());
    assert_ne!(trainer.embeddings(), before.embeddings());
    assert_ne!(trainer.optimizer_state(), before.optimizer_state());

    // the report describes the model before the update
    let initial = before.evaluate(&batch).unwrap();
    assert_eq!(report.evaluation, initial);
}

#[test]
fn test_train_step_rejects_wrong_batch_size() {
    let mut trainer = Trainer::new(next_symbol_config()).unwrap();
    let before = trainer.clone();
    let batch = SequenceBatch::from_symbol_sequences(&[vec![0, 1, 2]], 3).unwrap();

    assert!(matches!(
        trainer.train_step(&batch),
        Err(ModelError::InputValidationError(_))
    ));
    assert_eq!(trainer.parameters(), before.parameters());
    assert_eq!(trainer.step(), 0);
}

#[test]
fn test_divergence_fault_leaves_state_untouched() {
    let config = next_symbol_config();
    let mut checkpoint = Trainer::new(config.clone()).unwrap().checkpoint();
    checkpoint.output_projection.weight[0][0] = f64::NAN;
    let mut trainer = Trainer::from_checkpoint(config, &checkpoint).unwrap();

    let embeddings = trainer.embeddings().clone();
    let state = trainer.optimizer_state().clone();
    let input_gate = trainer.parameters().input_gate.clone();

    let result = trainer.train_step(&next_symbol_batch());
    assert!(matches!(result, Err(ModelError::DivergenceFault(_))));
    assert_eq!(trainer.embeddings(), &embeddings);
    assert_eq!(trainer.optimizer_state(), &state);
    assert_eq!(trainer.parameters().input_gate, input_gate);
    assert!(trainer.parameters().output_projection[[0, 0]].is_nan());
    assert_eq!(trainer.step(), 0);
}

#[test]
fn test_underflow_fault_policy_stops_step() {
    let config = next_symbol_config().with_underflow_policy(UnderflowPolicy::Fault);
    let mut trainer = Trainer::new(config).unwrap();
    let before = trainer.clone();
    let inputs = vec![one_hot(&[0, 1], 3).unwrap(); 2];
    let labels = vec![Matrix::zeros((2, 3)); 2];
    let batch = SequenceBatch::new(inputs, labels).unwrap();

    assert!(matches!(
        trainer.train_step(&batch),
        Err(ModelError::NumericUnderflowFault(_))
    ));
    assert_eq!(trainer.parameters(), before.parameters());
    assert_eq!(trainer.embeddings(), before.embeddings());
}

#[test]
fn test_fit_records_history() {
    let mut trainer = Trainer::new(next_symbol_config()).unwrap();
    let history = trainer.fit(&[next_symbol_batch()], 25).unwrap();

    assert_eq!(history.len(), 25);
    assert_eq!(history.perplexity.len(), 25);
    assert_eq!(history.accuracy.len(), 25);
    assert_eq!(trainer.step(), 25);
    assert!(history.loss.iter().all(|l| l.is_finite()));
    assert!(history.loss[24] < history.loss[0]);

    assert!(matches!(
        trainer.fit(&[], 5),
        Err(ModelError::InputValidationError(_))
    ));
}

#[test]
fn test_predict_returns_distributions() {
    let trainer = Trainer::new(next_symbol_config()).unwrap();
    let batch = next_symbol_batch();
    let predictions = trainer.predict(batch.inputs()).unwrap();

    assert_eq!(predictions.len(), 3);
    for prediction in &predictions {
        assert_eq!(prediction.dim(), (2, 3));
        for row in prediction.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_checkpoint_resume_in_memory() {
    let config = next_symbol_config();
    let batch = next_symbol_batch();
    let mut trainer = Trainer::new(config.clone()).unwrap();
    trainer.fit(&[batch.clone()], 3).unwrap();

    let resumed = Trainer::from_checkpoint(config.clone(), &trainer.checkpoint()).unwrap();
    assert_eq!(resumed.step(), 3);
    assert_eq!(resumed.parameters(), trainer.parameters());
    assert_eq!(resumed.embeddings(), trainer.embeddings());
    assert_eq!(resumed.optimizer_state(), trainer.optimizer_state());

    let other_dims = TrainingConfig::new(3, 2, 5, 3, 2);
    assert!(matches!(
        Trainer::from_checkpoint(other_dims, &trainer.checkpoint()),
        Err(IoError::StructureMismatch(_))
    ));
}

#[test]
fn test_checkpoint_rejects_ragged_matrix() {
    let config = next_symbol_config();
    let mut checkpoint = Trainer::new(config.clone()).unwrap().checkpoint();
    checkpoint.candidate_gate.v[1].pop();
    assert!(matches!(
        Trainer::from_checkpoint(config, &checkpoint),
        Err(IoError::StructureMismatch(_))
    ));
}

#[test]
fn test_evaluate_reports_divergence() {
    let config = next_symbol_config();
    let mut checkpoint = Trainer::new(config.clone()).unwrap().checkpoint();
    checkpoint.forget_gate.weight[0][0] = f64::NAN;
    let trainer = Trainer::from_checkpoint(config, &checkpoint).unwrap();

    assert!(matches!(
        trainer.evaluate(&next_symbol_batch()),
        Err(ModelError::DivergenceFault(_))
    ));
}
