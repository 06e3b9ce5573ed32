use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::auth::Verifier;
use crate::auth::error::AuthError;
use crate::auth::identity::DeviceIdentity;
use crate::database::devices as db_devices;

/// Device credential verifier.
///
/// A device authenticates with the static API key minted at creation time,
/// presented in the `X-API-KEY` header. This is the single accepted
/// convention — a key sent as a raw `Authorization` value is rejected, so
/// the credential-acceptance surface stays one header wide.
///
/// Verification is one exact-match indexed lookup against the device
/// registry. The comparison is the database's; no timing-safe equality is
/// attempted here (known limitation, see DESIGN.md).
pub struct DeviceKeyVerifier<'a> {
    db: &'a SqlitePool,
}

impl<'a> DeviceKeyVerifier<'a> {
    pub fn new(db: &'a SqlitePool) -> Self {
        Self { db }
    }
}

impl Verifier for DeviceKeyVerifier<'_> {
    type Principal = DeviceIdentity;

    async fn verify(&self, raw: Option<&str>) -> Result<DeviceIdentity, AuthError> {
        let key = raw.filter(|k| !k.is_empty()).ok_or(AuthError::MissingCredential)?;

        let device = db_devices::get_device_by_api_key(self.db, key)
            .await?
            .ok_or_else(|| {
                warn!("Rejected unknown device API key");
                AuthError::InvalidCredential
            })?;

        debug!(
            "Device key verified: device_id={} owner={}",
            device.id, device.user_id
        );

        Ok(DeviceIdentity {
            device_id: device.id,
            owner_user_id: device.user_id,
        })
    }
}
