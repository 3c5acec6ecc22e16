use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Annotation key under which the signal detail object is stored.
pub const DETAIL_KEY: &str = "signal:detail";

/// Analog/digital split of the SigMF `signal` extension `type` field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Analog,
    Digital,
}

/// Structured description of a signal's class and parameters.
///
/// Every field is optional; fields left unset are skipped when the record is
/// serialized, so annotations only ever carry what a waveform actually set.
/// The modulation/class name lives in `class_name` and is written under the
/// external key `"class"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalDetail {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub signal_type: Option<SignalType>,
    #[serde(rename = "class", default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier_variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplexing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplexing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise_voltage: Option<f64>,
}

/// A single typed assignment accepted by [`SignalDetail::set`].
#[derive(Debug, Clone, PartialEq)]
pub enum DetailField {
    Type(SignalType),
    Class(String),
    Order(u32),
    CarrierVariant(String),
    SymbolVariant(String),
    Duplexing(String),
    Multiplexing(String),
    MultipleAccess(String),
    Spreading(String),
    Bandwidth(f64),
    Channel(u32),
    ClassVariant(String),
    Snr(String),
    NoiseVoltage(f64),
}

impl SignalDetail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns one field; the type of the value is the only check.
    pub fn set(&mut self, field: DetailField) -> &mut Self {
        match field {
            DetailField::Type(value) => self.signal_type = Some(value),
            DetailField::Class(value) => self.class_name = Some(value),
            DetailField::Order(value) => self.order = Some(value),
            DetailField::CarrierVariant(value) => self.carrier_variant = Some(value),
            DetailField::SymbolVariant(value) => self.symbol_variant = Some(value),
            DetailField::Duplexing(value) => self.duplexing = Some(value),
            DetailField::Multiplexing(value) => self.multiplexing = Some(value),
            DetailField::MultipleAccess(value) => self.multiple_access = Some(value),
            DetailField::Spreading(value) => self.spreading = Some(value),
            DetailField::Bandwidth(value) => self.bandwidth = Some(value),
            DetailField::Channel(value) => self.channel = Some(value),
            DetailField::ClassVariant(value) => self.class_variant = Some(value),
            DetailField::Snr(value) => self.snr = Some(value),
            DetailField::NoiseVoltage(value) => self.noise_voltage = Some(value),
        }
        self
    }

    /// Serializes the set fields into a flat JSON object.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Same as [`to_map`](Self::to_map), wrapped under `"signal:detail"`.
    pub fn to_nested(&self) -> Map<String, Value> {
        let mut outer = Map::new();
        outer.insert(DETAIL_KEY.to_string(), Value::Object(self.to_map()));
        outer
    }
}
