use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::handlers::http::utils::json_response::deliver_error_json;

/// Largest request body we will buffer. Readings and profile edits are
/// tiny; anything bigger is abuse.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Collect and parse a JSON request body.
///
/// `Err` carries a ready-made 400 response so handlers can bail with
/// `return Ok(resp)` instead of re-stating the error mapping each time.
pub async fn parse_json_body<T: DeserializeOwned>(
    req: Request<hyper::body::Incoming>,
) -> Result<std::result::Result<T, Response<Full<Bytes>>>> {
    let body = req
        .into_body()
        .collect()
        .await
        .context("Failed to read request body")?
        .to_bytes();

    if body.len() > MAX_BODY_BYTES {
        warn!("Rejected oversized request body ({} bytes)", body.len());
        return Ok(Err(deliver_error_json(
            "BAD_REQUEST",
            "Request body too large",
            StatusCode::BAD_REQUEST,
        )?));
    }

    match serde_json::from_slice::<T>(&body) {
        Ok(value) => Ok(Ok(value)),
        Err(e) => {
            warn!("Rejected malformed JSON body: {}", e);
            Ok(Err(deliver_error_json(
                "BAD_REQUEST",
                "Invalid JSON body",
                StatusCode::BAD_REQUEST,
            )?))
        }
    }
}
