//! Trains the LSTM on synthetic gesture sequences.
//!
//! Usage: `train_synthetic [CONFIG_JSON] [CHECKPOINT_OUT]`
//!
//! Without a configuration file a small built-in setup is used. Set
//! `RUST_LOG=info` to see the periodic loss reports.

use rustylstm::prelude::*;
use std::error::Error;

const NUM_SEQUENCES: usize = 64;
const SEQUENCE_LENGTH: usize = 8;
const NUM_GESTURES: usize = 3;
const SYMBOL_NOISE: f64 = 0.05;

fn default_config() -> TrainingConfig {
    TrainingConfig::new(6, 4, 16, 6, 8)
        .with_iterations(2000)
        .with_log_every(200)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            log::info!("loading configuration from {}", path);
            TrainingConfig::from_json_path(&path)?
        }
        None => default_config(),
    };
    let checkpoint_path = args.next();

    if config.vocab_size != config.output_dim {
        return Err(format!(
            "next-symbol training needs vocab_size == output_dim, got {} and {}",
            config.vocab_size, config.output_dim
        )
        .into());
    }

    let sequences = gesture_sequences(
        NUM_SEQUENCES,
        SEQUENCE_LENGTH,
        config.vocab_size,
        NUM_GESTURES,
        SYMBOL_NOISE,
        config.seed,
    )?;
    let dataset = symbol_batches(&sequences, config.batch_size, config.vocab_size)?;
    log::info!(
        "generated {} sequence batches of {} steps",
        dataset.len(),
        SEQUENCE_LENGTH - 1
    );

    let mut trainer = Trainer::new(config)?;
    let history = trainer.train(&dataset)?;

    if let (Some(first), Some(last)) = (history.loss.first(), history.loss.last()) {
        println!("loss: {:.6} -> {:.6}", first, last);
    }
    if let Some(perplexity) = history.perplexity.last() {
        println!("final perplexity: {:.6}", perplexity);
    }
    if let Some(accuracy) = history.accuracy.last() {
        println!("final accuracy: {:.4}", accuracy);
    }

    if let Some(path) = checkpoint_path {
        trainer.checkpoint().save_to_path(&path)?;
        println!("checkpoint written to {}", path);
    }
    Ok(())
}
