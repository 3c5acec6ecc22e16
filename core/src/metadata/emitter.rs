use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// GeoJSON point describing where an emitter sits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<f64>,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64, altitude: Option<f64>) -> Self {
        let mut coordinates = vec![longitude, latitude];
        coordinates.extend(altitude);
        Self {
            kind: "Point".to_string(),
            coordinates,
        }
    }
}

/// Transmitting hardware details; unset fields are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmitterDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Transmit power in dBm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_tx: Option<f64>,
    /// Effective isotropic radiated power in dBm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_eirp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geolocation: Option<GeoPoint>,
}

impl EmitterDetail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
