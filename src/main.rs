//! digit-mlp command line.
//!
//! Run with:
//!   cargo run --release -- train --data-dir mnist --out model.json.gz
//!   cargo run --release -- evaluate --data-dir mnist --model model.json.gz
//!   cargo run --release -- predict --model model.json.gz digit.png
//!
//! Set `RUST_LOG=debug` to see preprocessing and archive details.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use digit_mlp::dataset::{self, Split};
use digit_mlp::train::{self, train_config};
use digit_mlp::{classify_image, Network, TrainConfig};

#[derive(Parser)]
#[command(name = "digit-mlp", version, about = "Train and run the handwritten digit MLP")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a fresh network on the MNIST training split and save it.
    Train {
        /// Directory holding the MNIST IDX files (plain or .gz).
        #[arg(long, default_value = "mnist")]
        data_dir: PathBuf,
        /// Where to write the model archive (.gz for compression).
        #[arg(long, default_value = "model.json.gz")]
        out: PathBuf,
        #[arg(long, default_value_t = train_config::EPOCHS)]
        epochs: usize,
        #[arg(long, default_value_t = train_config::BATCH_SIZE)]
        batch_size: usize,
        #[arg(long, default_value_t = train_config::LEARNING_RATE)]
        learning_rate: f64,
        /// Seed for initialization and shuffling; random if omitted.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Report train and test accuracy of a saved model.
    Evaluate {
        #[arg(long, default_value = "mnist")]
        data_dir: PathBuf,
        #[arg(long, default_value = "model.json.gz")]
        model: PathBuf,
    },
    /// Classify one image file and print the prediction as JSON.
    Predict {
        #[arg(long, default_value = "model.json.gz")]
        model: PathBuf,
        image: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> digit_mlp::Result<()> {
    match cli.command {
        Command::Train { data_dir, out, epochs, batch_size, learning_rate, seed } => {
            let data = dataset::load_split(&data_dir, Split::Train)?;
            let mut config = TrainConfig::new(epochs, batch_size, learning_rate);
            config.seed = seed;
            let network = train::train_network(&data, &config, &out)?;

            if let Ok(test) = dataset::load_split(&data_dir, Split::Test) {
                log::info!("test accuracy: {:.4}", train::accuracy(&network, &test)?);
            }
        }
        Command::Evaluate { data_dir, model } => {
            let network = Network::load_archive(&model)?;
            for split in [Split::Train, Split::Test] {
                let data = dataset::load_split(&data_dir, split)?;
                println!("{:?} accuracy: {:.4}", split, train::accuracy(&network, &data)?);
            }
        }
        Command::Predict { model, image } => {
            let network = Network::load_archive(&model)?;
            let bytes = std::fs::read(&image)?;
            let prediction = classify_image(&network, &bytes)?;
            let json = serde_json::to_string(&prediction)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            println!("{}", json);
        }
    }
    Ok(())
}
