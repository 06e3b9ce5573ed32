use serde::{Deserialize, Serialize};

/// Wire envelope for every failed request: `{status, code, message}` with
/// `status` fixed to `"error"`. Authorization failures, validation errors
/// and database faults all serialize through this one shape, so clients can
/// branch on `code` without caring which layer rejected them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    /// Machine-readable kind, e.g. `OWNERSHIP_DENIED` or `INVALID_TOKEN`.
    pub code: String,
    /// Human-readable detail. Deliberately generic for denials.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            status: "error".to_string(),
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_always_error() {
        let resp = ErrorResponse::new("OWNERSHIP_DENIED", "Access denied");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "OWNERSHIP_DENIED");
    }
}
