use std::sync::mpsc;

use crate::train::epoch_stats::EpochStats;

/// Full passes over the training set.
pub const EPOCHS: usize = 120;
/// Examples per mini-batch.
pub const BATCH_SIZE: usize = 128;
/// Plain SGD step size.
pub const LEARNING_RATE: f64 = 0.005;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`        — total number of full passes over the training data
/// - `batch_size`    — examples per mini-batch; the last batch may be shorter
/// - `learning_rate` — SGD step size
/// - `seed`          — seeds initialization and shuffling; `None` uses entropy
/// - `progress_tx`   — optional channel sender; one `EpochStats` is sent per
///                     completed epoch. A dropped receiver is ignored.
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: Option<u64>,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
}

impl TrainConfig {
    /// Creates a `TrainConfig` with no seed and no progress channel.
    pub fn new(epochs: usize, batch_size: usize, learning_rate: f64) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            learning_rate,
            seed: None,
            progress_tx: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig::new(EPOCHS, BATCH_SIZE, LEARNING_RATE)
    }
}
