use base64::{engine::general_purpose::STANDARD, Engine};

/// Extracts the raw bytes from a `data:<mime>;base64,<payload>` URL.
///
/// Anything after the first comma is the payload; a string without a comma is
/// treated as bare base64.
pub fn decode_data_url(s: &str) -> Result<Vec<u8>, String> {
    let payload = match s.split_once(',') {
        Some((_, payload)) => payload,
        None => s,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| format!("invalid base64 image payload: {}", e))
}
