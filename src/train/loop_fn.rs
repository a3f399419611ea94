use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::dataset::LabeledSet;
use crate::error::Result;
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::network::network::Network;
use crate::optim::sgd::Sgd;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs of mini-batch SGD and returns
/// the mean batch loss of the **last completed epoch**.
///
/// # Arguments
/// - `network` — mutable reference to the network; modified in place
/// - `data`    — training examples; validated against the network topology
/// - `config`  — hyperparameters and optional progress channel
/// - `rng`     — source for the per-epoch shuffles
///
/// Every epoch draws a fresh permutation, cuts it into contiguous batches of
/// `config.batch_size` and runs forward, loss, backward and update on each
/// batch in turn. Any error aborts the run; there is no partial checkpoint.
pub fn train_loop<R: Rng + ?Sized>(
    network: &mut Network,
    data: &LabeledSet,
    config: &TrainConfig,
    rng: &mut R,
) -> Result<f64> {
    let topology = network.topology();
    data.validate(topology.input, topology.output)?;

    let optimizer = Sgd::new(config.learning_rate);
    let mut last_loss = 0.0;

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        let (total_loss, batches) = run_one_epoch(network, data, &optimizer, config.batch_size, rng)?;
        let mean_loss = total_loss / batches.max(1) as f64;
        last_loss = mean_loss;

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            total_loss,
            mean_loss,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };

        log::info!(
            "Epoch {}/{}  Loss: {:.4}  (mean {:.4}, {} ms)",
            stats.epoch, stats.total_epochs, stats.total_loss, stats.mean_loss, stats.elapsed_ms
        );

        if let Some(ref tx) = config.progress_tx {
            // Progress is observational; a listener going away does not stop training.
            let _ = tx.send(stats);
        }
    }

    Ok(last_loss)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Runs one full epoch of mini-batch SGD.
/// Returns the summed batch loss and the number of batches.
fn run_one_epoch<R: Rng + ?Sized>(
    network: &mut Network,
    data: &LabeledSet,
    optimizer: &Sgd,
    batch_size: usize,
    rng: &mut R,
) -> Result<(f64, usize)> {
    let n = data.len();
    let batch_size = batch_size.max(1);

    // Shuffle sample order each epoch; images and labels follow the same permutation.
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    let mut total_loss = 0.0;
    let mut batches = 0;

    for batch in indices.chunks(batch_size) {
        let x = data.images.select_rows(batch);
        let y: Vec<u8> = batch.iter().map(|&i| data.labels[i]).collect();

        let cache = network.forward_cached(&x)?;
        total_loss += CrossEntropyLoss::loss(cache.output(), &y)?;

        let delta = CrossEntropyLoss::derivative(cache.output(), &y)?;
        let grads = network.backward(&x, &cache, &delta)?;
        optimizer.step(network, &grads)?;

        batches += 1;
    }

    Ok((total_loss, batches))
}
