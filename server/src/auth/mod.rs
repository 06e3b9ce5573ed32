//! The authorization core.
//!
//! Two credential kinds reach this server: human users present a signed
//! session JWT (`Authorization: Bearer <token>`), physical devices present
//! their static API key (`X-API-KEY: <key>`). Both are normalised behind the
//! [`Verifier`] trait: a verifier turns a raw header value into a typed
//! principal or a terminal [`AuthError`]. The router (see
//! `handlers::http::routes`) is the guard — it runs the verifier a route
//! demands before the handler and passes the principal by parameter, so no
//! handler ever re-validates a credential or digs identity out of ambient
//! state.
//!
//! Ownership decisions on top of a verified identity live in [`policy`].

pub mod device_key;
pub mod error;
pub mod identity;
pub mod policy;
pub mod session;

pub use device_key::DeviceKeyVerifier;
pub use error::AuthError;
pub use identity::{DeviceIdentity, Identity};
pub use policy::{Decision, authorize, require_device_access};
pub use session::SessionVerifier;

/// A credential verifier: raw header value in, typed principal out.
///
/// `raw` is `None` when the request carried no credential at all; verifiers
/// map that to [`AuthError::MissingCredential`] rather than treating absence
/// and malformation the same.
///
/// The session variant is pure; the device variant performs one registry
/// read, hence the async contract for both.
pub trait Verifier {
    type Principal;

    fn verify(
        &self,
        raw: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Self::Principal, AuthError>> + Send;
}
