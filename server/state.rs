use std::sync::Arc;

use digit_mlp::Network;

/// Process-wide serving state: loaded once at startup, read-only afterwards.
pub struct ServerState {
    pub network: Network,
}

impl ServerState {
    pub fn new(network: Network) -> Self {
        ServerState { network }
    }
}

/// Shared state type: an `Arc<ServerState>` passed to every handler.
pub type SharedState = Arc<ServerState>;
