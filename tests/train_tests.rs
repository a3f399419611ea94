use std::sync::mpsc;

use rand::{rngs::StdRng, SeedableRng};

use digit_mlp::train::{accuracy, train_network_with};
use digit_mlp::{train_loop, Error, LabeledSet, Matrix, Network, Topology, TrainConfig};

const TOY: Topology = Topology::new(4, 16, 8, 2);

/// 64 examples, two linearly separable classes interleaved in file order.
fn toy_set() -> LabeledSet {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..64 {
        let t = (i / 2) as f64 / 32.0;
        if i % 2 == 0 {
            rows.push(vec![0.1 + 0.3 * t, 0.8 - 0.2 * t, 0.2, 0.5]);
            labels.push(0);
        } else {
            rows.push(vec![0.6 + 0.3 * t, 0.3 - 0.2 * t, 0.7, 0.5]);
            labels.push(1);
        }
    }
    LabeledSet::new(Matrix::from_rows(rows).unwrap(), labels).unwrap()
}

fn toy_config(epochs: usize) -> TrainConfig {
    TrainConfig::new(epochs, 8, 0.1)
}

#[test]
fn test_loss_decreases_on_separable_toy_set() {
    let data = toy_set();
    let (tx, rx) = mpsc::channel();
    let config = toy_config(30).with_progress(tx);

    let mut rng = StdRng::seed_from_u64(42);
    let mut net = Network::new(TOY, &mut rng);
    let final_loss = train_loop(&mut net, &data, &config, &mut rng).unwrap();
    drop(config);

    let stats: Vec<_> = rx.iter().collect();
    assert_eq!(stats.len(), 30);
    assert_eq!(stats[0].epoch, 1);
    assert_eq!(stats[29].total_epochs, 30);
    assert_eq!(final_loss, stats[29].mean_loss);

    let early: f64 = stats[..5].iter().map(|s| s.mean_loss).sum::<f64>() / 5.0;
    let late: f64 = stats[25..].iter().map(|s| s.mean_loss).sum::<f64>() / 5.0;
    assert!(late < early, "late {} vs early {}", late, early);
    assert!(stats[29].mean_loss < stats[0].mean_loss);
    // 64 examples in batches of 8
    assert!((stats[0].total_loss / 8.0 - stats[0].mean_loss).abs() < 1e-12);

    assert!(accuracy(&net, &data).unwrap() >= 0.9);
}

#[test]
fn test_same_seed_trains_identical_networks() {
    let data = toy_set();
    let train = || {
        let mut rng = StdRng::seed_from_u64(7);
        let mut net = Network::new(TOY, &mut rng);
        train_loop(&mut net, &data, &toy_config(3), &mut rng).unwrap();
        net
    };
    assert_eq!(train(), train());
}

#[test]
fn test_train_network_persists_a_loadable_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("toy.json");
    let data = toy_set();

    let net = train_network_with(TOY, &data, &toy_config(2).with_seed(1), &path).unwrap();
    let loaded = Network::load_archive_with(&path, TOY).unwrap();
    assert_eq!(loaded, net);

    // a toy archive is not a digit model
    assert!(matches!(Network::load_archive(&path), Err(Error::CorruptModel(_))));
}

#[test]
fn test_wrong_input_width_aborts_training() {
    let data = toy_set();
    let mut rng = StdRng::seed_from_u64(0);
    let mut net = Network::new(Topology::new(5, 4, 4, 2), &mut rng);
    let before = net.clone();
    assert!(matches!(
        train_loop(&mut net, &data, &toy_config(1), &mut rng),
        Err(Error::Dataset(_))
    ));
    assert_eq!(net, before);
}

#[test]
fn test_out_of_range_label_aborts_training() {
    let mut data = toy_set();
    data.labels[3] = 2;
    let mut rng = StdRng::seed_from_u64(0);
    let mut net = Network::new(TOY, &mut rng);
    assert!(matches!(
        train_loop(&mut net, &data, &toy_config(1), &mut rng),
        Err(Error::Dataset(_))
    ));
}

#[test]
fn test_default_config_uses_fixed_hyperparameters() {
    let config = TrainConfig::default();
    assert_eq!(config.epochs, 120);
    assert_eq!(config.batch_size, 128);
    assert_eq!(config.learning_rate, 0.005);
    assert!(config.seed.is_none());
}
