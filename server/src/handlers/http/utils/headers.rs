use hyper::Request;
use hyper::header::HeaderMap;
use tracing::debug;

/// Header carrying the device API key. The only accepted spelling — keys
/// sent in `Authorization` are not device credentials.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Extract a header value as a string
pub fn get_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(|s| {
        debug!("Retrieved header: {}", name);
        s.to_string()
    })
}

/// Raw `Authorization` header, scheme and all. Prefix handling belongs to
/// the session verifier so malformed schemes are classified there.
pub fn get_authorization(req: &Request<hyper::body::Incoming>) -> Option<String> {
    get_header_value(req.headers(), "authorization")
}

/// Raw device API key header value.
pub fn get_api_key(req: &Request<hyper::body::Incoming>) -> Option<String> {
    get_header_value(req.headers(), API_KEY_HEADER)
}
