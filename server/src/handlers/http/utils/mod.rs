pub mod body;
pub mod headers;
pub mod json_response;
pub mod validate;

pub use body::parse_json_body;
pub use json_response::{deliver_auth_error, deliver_error_json, deliver_serialized_json, deliver_success_json};
pub use validate::profile_field_error;
