/// digit-mlp inference server
///
/// Loads the model archive once and answers `POST /predict` with the
/// predicted digit and its class probabilities. Served by a synchronous
/// tiny_http server, one thread per request.
///
/// Run with:
///   cargo run --bin server --release -- --model model.json.gz
///
/// Request body: `{"image": "data:image/png;base64,...."}`

mod handlers;
mod routes;
mod state;
mod util;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tiny_http::Server;

use digit_mlp::Network;
use state::ServerState;

#[derive(Parser)]
#[command(name = "server", version, about = "Serve digit predictions over HTTP")]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1:8000")]
    addr: String,
    /// Model archive written by `digit-mlp train`.
    #[arg(long, default_value = "model.json.gz")]
    model: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // A bad archive is fatal: there is nothing to serve without weights.
    let network = match Network::load_archive(&args.model) {
        Ok(n) => n,
        Err(e) => {
            log::error!("cannot load model {}: {}", args.model.display(), e);
            process::exit(1);
        }
    };
    let shared_state = Arc::new(ServerState::new(network));

    let server = match Server::http(&args.addr) {
        Ok(s) => s,
        Err(e) => {
            log::error!("failed to bind {}: {}", args.addr, e);
            process::exit(1);
        }
    };
    log::info!("serving {} on http://{}", args.model.display(), args.addr);

    // Requests only read the shared weights, so they run in parallel without locking.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
}
