use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sensor reading wire types
// ---------------------------------------------------------------------------

/// Body of `POST /api/ingest` — one measurement pushed by a device.
///
/// There is no `device_id` field: the reading is attributed to the device
/// that authenticated via `X-API-KEY`, never to a body-supplied id.
#[derive(Debug, Deserialize)]
pub struct ReadingData {
    /// Heart rate, beats per minute.
    pub bpm: f64,
    /// Blood oxygen saturation, percent.
    pub spo2: f64,
    /// Body temperature, degrees Celsius.
    pub temp: f64,
}

/// Public view of a stored reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingInfo {
    pub id: i64,
    pub device_id: i64,
    pub bpm: f64,
    pub spo2: f64,
    pub temp: f64,
    pub recorded_at: i64,
}
