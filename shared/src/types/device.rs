use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Device wire types
// ---------------------------------------------------------------------------

/// Body of `POST /api/devices`. The owner is always the authenticated caller
/// — there is deliberately no `user_id` field to spoof.
#[derive(Debug, Deserialize)]
pub struct NewDeviceData {
    pub name: String,
    /// Sampling interval in seconds.
    #[serde(default = "default_delay")]
    pub delay: i64,
}

fn default_delay() -> i64 {
    10
}

/// Body of `POST /api/admin/devices`. Unlike the user-tier create, the
/// target owner is named explicitly; the route is admin-only.
#[derive(Debug, Deserialize)]
pub struct AdminNewDeviceData {
    pub user_id: i64,
    pub name: String,
    #[serde(default = "default_delay")]
    pub delay: i64,
}

/// Body of `PUT /api/devices/:device_id`.
#[derive(Debug, Deserialize)]
pub struct DeviceUpdateData {
    pub current_state: Option<String>,
    pub delay: Option<i64>,
}

/// Public view of a device row.
///
/// `api_key` is only populated in the creation response — the one moment the
/// key is handed to the client for flashing onto the device. List and read
/// endpoints leave it out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub delay: i64,
    pub current_state: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_is_omitted_when_absent() {
        let info = DeviceInfo {
            id: 1,
            user_id: 2,
            name: "pulse-1".into(),
            api_key: None,
            delay: 10,
            current_state: "inactive".into(),
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("api_key").is_none());
    }

    #[test]
    fn delay_defaults_to_ten() {
        let data: NewDeviceData = serde_json::from_str(r#"{"name":"pulse-1"}"#).unwrap();
        assert_eq!(data.delay, 10);
    }

    #[test]
    fn admin_create_requires_a_target_owner() {
        let data: AdminNewDeviceData =
            serde_json::from_str(r#"{"user_id":7,"name":"pulse-1"}"#).unwrap();
        assert_eq!(data.user_id, 7);
        assert_eq!(data.delay, 10);

        // No owner named, no device.
        assert!(serde_json::from_str::<AdminNewDeviceData>(r#"{"name":"pulse-1"}"#).is_err());
    }
}
