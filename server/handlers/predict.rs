use std::io::{Cursor, Read};

use serde::Deserialize;
use tiny_http::{Request, Response};

use digit_mlp::{classify_image, Error};

use crate::routes::{json_error, json_response};
use crate::state::SharedState;
use crate::util::data_url::decode_data_url;

/// Largest request body accepted; a 280x280 canvas PNG is well under this.
pub const MAX_BODY_BYTES: u64 = 8 * 1024 * 1024;

#[derive(Deserialize)]
struct PredictRequest {
    /// Data URL (or bare base64) of the drawn image.
    image: String,
}

// ---------------------------------------------------------------------------
// POST /predict
// ---------------------------------------------------------------------------

/// Decodes the uploaded image, runs it through the network and returns
/// `{"prediction": n, "probabilities": [...]}`. A blank image answers with
/// `prediction: -1` and no probabilities; undecodable input is a 400.
pub fn handle(request: &mut Request, state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let body = match read_body(request.as_reader(), MAX_BODY_BYTES) {
        Ok(Some(body)) => body,
        Ok(None) => {
            return json_error(413, &format!("request body exceeds {} bytes", MAX_BODY_BYTES))
        }
        Err(e) => return json_error(400, &format!("could not read request body: {}", e)),
    };

    let payload: PredictRequest = match serde_json::from_str(&body) {
        Ok(p) => p,
        Err(e) => return json_error(400, &format!("expected {{\"image\": ...}}: {}", e)),
    };

    let bytes = match decode_data_url(&payload.image) {
        Ok(b) => b,
        Err(msg) => return json_error(400, &msg),
    };

    match classify_image(&state.network, &bytes) {
        Ok(prediction) => {
            log::info!("predicted {} from {} byte image", prediction.prediction, bytes.len());
            match serde_json::to_string(&prediction) {
                Ok(json) => json_response(200, json),
                Err(e) => json_error(500, &e.to_string()),
            }
        }
        Err(e @ Error::Decode(_)) => json_error(400, &e.to_string()),
        Err(e) => {
            log::error!("prediction failed: {}", e);
            json_error(500, &e.to_string())
        }
    }
}

/// Reads at most `limit` bytes; `None` when the body is longer than that.
fn read_body(reader: &mut dyn Read, limit: u64) -> std::io::Result<Option<String>> {
    let mut body = String::new();
    reader.take(limit + 1).read_to_string(&mut body)?;
    if body.len() as u64 > limit {
        return Ok(None);
    }
    Ok(Some(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_at_the_limit_is_read() {
        let mut input: &[u8] = b"{\"image\": \"\"}";
        let limit = input.len() as u64;
        assert_eq!(read_body(&mut input, limit).unwrap().as_deref(), Some("{\"image\": \"\"}"));
    }

    #[test]
    fn oversized_body_is_refused() {
        let big = vec![b'a'; 1025];
        let mut input: &[u8] = &big;
        assert_eq!(read_body(&mut input, 1024).unwrap(), None);
    }
}
