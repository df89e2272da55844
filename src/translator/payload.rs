//! Inbound upload format of the Luftdaten firmware and the per-request
//! context taken from HTTP headers.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::value::RawValue;
use std::fmt;

use super::error::TranslateError;

/// Reading kind that carries the upload interval in milliseconds.
pub const INTERVAL_KIND: &str = "interval";

/// Body of a `POST /luftdaten/json2mqtt` request.
///
/// Unknown top level fields (`esp8266id`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundPayload {
    pub software_version: Option<String>,
    pub sensordatavalues: Vec<SensorReading>,
}

impl InboundPayload {
    /// Decodes a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, TranslateError> {
        serde_json::from_slice(body).map_err(|e| TranslateError::MalformedPayload(e.to_string()))
    }

    /// Firmware version, treating an empty string like an absent one.
    pub fn firmware(&self) -> Option<&str> {
        self.software_version.as_deref().filter(|v| !v.is_empty())
    }

    /// Upload interval in whole seconds. When several `interval` readings
    /// are present the last one counts. Missing or unparsable intervals
    /// count as 0.
    pub fn interval_seconds(&self) -> u64 {
        let Some(reading) = self
            .sensordatavalues
            .iter()
            .rev()
            .find(|r| r.kind == INTERVAL_KIND)
        else {
            return 0;
        };

        match reading.value.as_millis() {
            Some(ms) => ms / 1000,
            None => {
                tracing::warn!("Ignoring unparsable interval value '{}'", reading.value);
                0
            }
        }
    }
}

/// One entry of `sensordatavalues`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SensorReading {
    #[serde(rename = "value_type")]
    pub kind: String,
    pub value: ReadingValue,
}

/// Measurement value as sent by the device.
///
/// The firmware sends strings, but any other JSON value is accepted too.
/// Values are republished as text without validation: strings unquoted,
/// everything else exactly as it appeared in the body (`7.60` stays `7.60`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadingValue {
    Text(String),
    /// Raw JSON number
    Number(String),
    /// Raw JSON of a boolean, null, array or object
    Other(String),
}

impl<'de> Deserialize<'de> for ReadingValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        let text = raw.get();
        match text.as_bytes().first() {
            Some(b'"') => serde_json::from_str(text)
                .map(ReadingValue::Text)
                .map_err(de::Error::custom),
            Some(b'-' | b'0'..=b'9') => Ok(ReadingValue::Number(text.to_string())),
            _ => Ok(ReadingValue::Other(text.to_string())),
        }
    }
}

impl ReadingValue {
    fn as_millis(&self) -> Option<u64> {
        match self {
            ReadingValue::Text(s) | ReadingValue::Number(s) => {
                let s = s.trim();
                s.parse::<u64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && *f >= 0.0)
                        .map(|f| f as u64)
                })
            }
            ReadingValue::Other(_) => None,
        }
    }
}

impl fmt::Display for ReadingValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadingValue::Text(s) | ReadingValue::Number(s) | ReadingValue::Other(s) => {
                f.write_str(s)
            }
        }
    }
}

/// Identifiers of the uploading device, built per request from headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Hardware id (`X-MAC-ID`), used in topics and unique ids
    pub device_id: String,
    /// Sensor model string (`X-Sensor`), e.g. `esp8266-1234567`
    pub sensor_label: Option<String>,
    /// Address of the device, published as its configuration url
    pub client_address: Option<String>,
}
