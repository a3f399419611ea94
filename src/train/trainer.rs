use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dataset::LabeledSet;
use crate::error::Result;
use crate::network::{Network, Topology};
use crate::train::loop_fn::train_loop;
use crate::train::train_config::TrainConfig;

/// One complete training run: Init → epochs → Persist.
///
/// Initializes a fresh `Topology::DIGITS` network (He weights, zero biases)
/// from `config.seed`, trains it on `data` and writes the six parameter
/// arrays to `archive_path`. Returns the trained network.
pub fn train_network<P: AsRef<Path>>(
    data: &LabeledSet,
    config: &TrainConfig,
    archive_path: P,
) -> Result<Network> {
    train_network_with(Topology::DIGITS, data, config, archive_path)
}

/// Same as [`train_network`] for an arbitrary layer-width topology.
pub fn train_network_with<P: AsRef<Path>>(
    topology: Topology,
    data: &LabeledSet,
    config: &TrainConfig,
    archive_path: P,
) -> Result<Network> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut network = Network::new(topology, &mut rng);
    log::info!(
        "training {}-{}-{}-{} network on {} examples: {} epochs, batch {}, lr {}",
        topology.input, topology.hidden1, topology.hidden2, topology.output,
        data.len(), config.epochs, config.batch_size, config.learning_rate
    );

    let final_loss = train_loop(&mut network, data, config, &mut rng)?;

    network.save_archive(archive_path.as_ref())?;
    log::info!(
        "final mean loss {:.4}; model written to {}",
        final_loss,
        archive_path.as_ref().display()
    );
    Ok(network)
}
