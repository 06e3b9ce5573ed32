use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode, header};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};

use crate::auth::AuthError;

/// Serialize any `Serialize` type and deliver it as a JSON response.
/// This is the primary helper all handlers should use instead of
/// writing their own one-off serialization + response-building blocks.
pub fn deliver_serialized_json<T: Serialize>(
    data: &T,
    status: StatusCode,
) -> Result<Response<Full<Bytes>>> {
    let json = serde_json::to_string(data).context("Failed to serialize response")?;

    debug!("Delivering serialized JSON response, size: {} bytes", json.len());

    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .map_err(|e| anyhow!("Failed to build JSON response: {}", e))?;

    Ok(response)
}

/// Delivers a JSON error response with the specified error code, message, and status.
pub fn deliver_error_json(
    error_code: &str,
    message: &str,
    status: StatusCode,
) -> Result<Response<Full<Bytes>>> {
    error!(
        "Delivering error JSON: {} - {} ({})",
        status.as_u16(),
        error_code,
        message
    );

    let envelope = shared::types::ErrorResponse::new(error_code, message);
    let json = serde_json::to_string(&envelope).context("Failed to serialize error envelope")?;

    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .map_err(|e: http::Error| {
            error!("Failed to build error JSON response: {}", e);
            anyhow!("Failed to build error JSON response: {}", e)
        })?;

    Ok(response)
}

/// Delivers a success JSON response with optional data.
pub fn deliver_success_json<T: Serialize>(data: Option<T>) -> Result<Response<Full<Bytes>>> {
    let response_body = match data {
        Some(d) => json!({
            "status": "success",
            "data": d
        }),
        None => json!({
            "status": "success"
        }),
    };

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(response_body.to_string())))
        .map_err(|e: http::Error| {
            error!("Failed to build success JSON response: {}", e);
            anyhow!("Failed to build success JSON response: {}", e)
        })?;

    Ok(response)
}

/// Map an auth failure to its wire form. Status and code come from the
/// error itself so the 401/403 split stays in one place.
pub fn deliver_auth_error(err: &AuthError) -> Result<Response<Full<Bytes>>> {
    deliver_error_json(err.code(), &err.to_string(), err.status())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_keep_their_status() {
        let resp = deliver_auth_error(&AuthError::MissingCredential).unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = deliver_auth_error(&AuthError::OwnershipDenied).unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn error_json_sets_content_type() {
        let resp = deliver_error_json("NOT_FOUND", "Endpoint not found", StatusCode::NOT_FOUND)
            .unwrap();
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
