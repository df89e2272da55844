//! # Translator
//!
//! Turns one Luftdaten upload into the ordered list of MQTT messages the
//! bridge publishes for it:
//!
//! ```text
//! {topic_root}{device_id}/firmware                     firmware version (if sent)
//! {discovery_prefix}/sensor/{unique_id}/config         retained discovery config  ┐ per known
//! {topic_root}{device_id}/{kind}                       raw value                  ┘ reading
//! ```
//!
//! The translator only holds its topic roots and is shared between request
//! handlers without locking. Publishing is left to [`crate::mqtt`].

pub mod discovery;
pub mod error;
pub mod payload;
pub mod sensors;

pub use discovery::{DiscoveryConfig, DiscoveryDevice, DiscoveryOrigin};
pub use error::TranslateError;
pub use payload::{InboundPayload, ReadingValue, RequestContext, SensorReading};
pub use sensors::{lookup, Appearance, SensorMetadata, SENSORS};

use crate::config::BridgeConfig;
use crate::mqtt::message_manager::PublishIntent;
use tracing::{debug, trace};

/// Discovery configs expire after this many missed upload intervals.
pub const EXPIRY_FACTOR: u64 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translator {
    topic_root: String,
    discovery_prefix: String,
}

impl Translator {
    /// `topic_root` is prepended verbatim to the device id, so it usually
    /// ends with `/`.
    pub fn new(topic_root: impl Into<String>, discovery_prefix: impl Into<String>) -> Self {
        Self {
            topic_root: topic_root.into(),
            discovery_prefix: discovery_prefix.into(),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(&config.mqtt_topic, &config.discovery_prefix)
    }

    pub fn topic_prefix(&self, device_id: &str) -> String {
        format!("{}{}", self.topic_root, device_id)
    }

    pub fn discovery_topic(&self, unique_id: &str) -> String {
        format!("{}/sensor/{}/config", self.discovery_prefix, unique_id)
    }

    /// Translates one upload. Either every intent of the upload is returned
    /// or none.
    pub fn translate(
        &self,
        payload: &InboundPayload,
        ctx: &RequestContext,
    ) -> Result<Vec<PublishIntent>, TranslateError> {
        let topic_prefix = self.topic_prefix(&ctx.device_id);
        let firmware = payload.firmware();
        let mut intents = Vec::with_capacity(payload.sensordatavalues.len() * 2 + 1);

        if let Some(version) = firmware {
            intents.push(PublishIntent::transient(
                format!("{}/firmware", topic_prefix),
                version,
            ));
        }

        let expire_after = EXPIRY_FACTOR.saturating_mul(payload.interval_seconds());

        for reading in &payload.sensordatavalues {
            let Some(meta) = sensors::lookup(&reading.kind) else {
                trace!("Skipping unknown reading '{}'", reading.kind);
                continue;
            };

            let sensor_label = ctx
                .sensor_label
                .as_deref()
                .filter(|label| !label.is_empty())
                .ok_or_else(|| {
                    TranslateError::MalformedPayload(
                        "sensor label header is required to name entities".to_string(),
                    )
                })?;

            let unique_id = unique_id(&ctx.device_id, &reading.kind);
            let device = DiscoveryDevice {
                identifiers: vec![ctx.device_id.to_lowercase()],
                name: device_name(sensor_label),
                model: format!("DIY {}", sensor_label),
                sw_version: firmware.map(str::to_string),
                manufacturer: discovery::MANUFACTURER.to_string(),
                configuration_url: ctx
                    .client_address
                    .as_ref()
                    .map(|addr| format!("http://{}", addr)),
            };
            let topic = self.discovery_topic(&unique_id);
            let config =
                DiscoveryConfig::for_sensor(meta, &topic_prefix, unique_id, device, expire_after);

            intents.push(PublishIntent::retained(topic, config.to_json()?));
            intents.push(PublishIntent::transient(
                format!("{}/{}", topic_prefix, reading.kind),
                reading.value.to_string(),
            ));
        }

        debug!(
            "Translated upload of {} into {} messages",
            ctx.device_id,
            intents.len()
        );
        Ok(intents)
    }
}

/// Stable, lowercase entity id of one channel of one device.
pub fn unique_id(device_id: &str, kind: &str) -> String {
    format!("luftdaten-{}-{}", device_id, kind).to_lowercase()
}

/// `esp8266-1234567` becomes `Luftdaten 1234567`.
pub fn device_name(sensor_label: &str) -> String {
    let suffix = sensor_label.rsplit('-').next().unwrap_or(sensor_label);
    format!("Luftdaten {}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const EXAMPLE: &[u8] = br#"{"software_version":"NRZ-2020-133","sensordatavalues":[{"value_type":"SDS_P1","value":"7.60"},{"value_type":"interval","value":"145000"}]}"#;

    fn translator() -> Translator {
        Translator::new("luftdaten/", "homeassistant")
    }

    fn ctx() -> RequestContext {
        RequestContext {
            device_id: "ABC123".to_string(),
            sensor_label: Some("esp8266-ABC123".to_string()),
            client_address: Some("192.168.1.50".to_string()),
        }
    }

    fn single(kind: &str, value: &str) -> InboundPayload {
        InboundPayload {
            software_version: None,
            sensordatavalues: vec![SensorReading {
                kind: kind.to_string(),
                value: ReadingValue::Text(value.to_string()),
            }],
        }
    }

    #[test]
    fn translates_example_upload() {
        let payload = InboundPayload::from_slice(EXAMPLE).unwrap();
        let intents = translator().translate(&payload, &ctx()).unwrap();

        assert_eq!(intents.len(), 3);
        assert_eq!(
            intents[0],
            PublishIntent::transient("luftdaten/ABC123/firmware", "NRZ-2020-133")
        );
        assert_eq!(
            intents[1].topic,
            "homeassistant/sensor/luftdaten-abc123-sds_p1/config"
        );
        assert!(intents[1].retain);
        assert_eq!(
            intents[2],
            PublishIntent::transient("luftdaten/ABC123/SDS_P1", "7.60")
        );

        let config: Value = serde_json::from_str(&intents[1].payload).unwrap();
        assert_eq!(config["expire_after"], 580);
        assert_eq!(config["~"], "luftdaten/ABC123");
        assert_eq!(config["name"], "Luftdaten ABC123 PM10");
        assert_eq!(config["unique_id"], "luftdaten-abc123-sds_p1");
        assert_eq!(config["force_update"], false);
        assert_eq!(config["qos"], 0);
        assert_eq!(config["entity_category"], "diagnostic");
        assert_eq!(config["device"]["identifiers"][0], "abc123");
        assert_eq!(config["device"]["model"], "DIY esp8266-ABC123");
        assert_eq!(config["device"]["sw_version"], "NRZ-2020-133");
        assert_eq!(config["device"]["manufacturer"], "DIY Luftdaten");
        assert_eq!(
            config["device"]["configuration_url"],
            "http://192.168.1.50"
        );
        assert_eq!(config["origin"]["name"], "luftdaten2mqtt");
    }

    #[test]
    fn every_known_kind_yields_config_then_value() {
        for sensor in SENSORS {
            let intents = translator()
                .translate(&single(sensor.kind, "1"), &ctx())
                .unwrap();

            assert_eq!(intents.len(), 2, "{}", sensor.kind);
            assert!(intents[0].retain);
            assert!(intents[0].topic.ends_with("/config"));
            assert_eq!(intents[1].topic, format!("luftdaten/ABC123/{}", sensor.kind));
            assert!(!intents[1].retain);

            let config: Value = serde_json::from_str(&intents[0].payload).unwrap();
            assert!(
                config.get("device_class").is_some() != config.get("icon").is_some(),
                "{}",
                sensor.kind
            );
            assert_eq!(config["expire_after"], 0);
        }
    }

    #[test]
    fn unknown_kinds_produce_nothing() {
        for kind in ["samples", "min_micro", "max_micro", "interval", "sds_p1"] {
            let intents = translator().translate(&single(kind, "5"), &ctx()).unwrap();
            assert!(intents.is_empty(), "{}", kind);
        }
    }

    #[test]
    fn unknown_kinds_need_no_sensor_label() {
        let ctx = RequestContext {
            sensor_label: None,
            ..ctx()
        };
        let intents = translator().translate(&single("samples", "5"), &ctx).unwrap();
        assert!(intents.is_empty());
    }

    #[test]
    fn missing_sensor_label_rejects_whole_upload() {
        let ctx = RequestContext {
            sensor_label: None,
            ..ctx()
        };
        let payload = InboundPayload::from_slice(EXAMPLE).unwrap();
        let err = translator().translate(&payload, &ctx).unwrap_err();
        assert!(matches!(err, TranslateError::MalformedPayload(_)));
    }

    #[test]
    fn firmware_only_when_version_present() {
        let mut payload = single("humidity", "40.2");
        let intents = translator().translate(&payload, &ctx()).unwrap();
        assert!(intents.iter().all(|i| !i.topic.ends_with("/firmware")));

        payload.software_version = Some(String::new());
        let intents = translator().translate(&payload, &ctx()).unwrap();
        assert!(intents.iter().all(|i| !i.topic.ends_with("/firmware")));

        payload.software_version = Some("NRZ-2024-135".to_string());
        let intents = translator().translate(&payload, &ctx()).unwrap();
        assert_eq!(intents[0].topic, "luftdaten/ABC123/firmware");
        assert_eq!(intents.len(), 3);
    }

    #[test]
    fn readings_keep_input_order() {
        let payload = InboundPayload::from_slice(
            br#"{"sensordatavalues":[{"value_type":"BME280_pressure","value":"100480.50"},{"value_type":"samples","value":"880"},{"value_type":"signal","value":"-71"}]}"#,
        )
        .unwrap();
        let topics: Vec<_> = translator()
            .translate(&payload, &ctx())
            .unwrap()
            .into_iter()
            .map(|i| i.topic)
            .collect();

        assert_eq!(
            topics,
            vec![
                "homeassistant/sensor/luftdaten-abc123-bme280_pressure/config",
                "luftdaten/ABC123/BME280_pressure",
                "homeassistant/sensor/luftdaten-abc123-signal/config",
                "luftdaten/ABC123/signal",
            ]
        );
    }

    #[test]
    fn numeric_values_are_published_verbatim() {
        let payload = InboundPayload::from_slice(
            br#"{"sensordatavalues":[{"value_type":"SDS_P1","value":7.60},{"value_type":"debug","value":true},{"value_type":"extra","value":null},{"value_type":"interval","value":145000}]}"#,
        )
        .unwrap();
        let intents = translator().translate(&payload, &ctx()).unwrap();

        assert_eq!(intents.len(), 2);
        assert_eq!(
            intents[1],
            PublishIntent::transient("luftdaten/ABC123/SDS_P1", "7.60")
        );
        let config: Value = serde_json::from_str(&intents[0].payload).unwrap();
        assert_eq!(config["expire_after"], 580);
    }

    #[test]
    fn unique_id_is_stable_and_lowercase() {
        assert_eq!(unique_id("ABC123", "SDS_P1"), "luftdaten-abc123-sds_p1");
        assert_eq!(unique_id("ABC123", "SDS_P1"), unique_id("ABC123", "SDS_P1"));
        assert_ne!(unique_id("ABC123", "SDS_P1"), unique_id("ABC124", "SDS_P1"));
        assert_ne!(unique_id("ABC123", "SDS_P1"), unique_id("ABC123", "SDS_P2"));
    }

    #[test]
    fn device_name_uses_last_label_segment() {
        assert_eq!(device_name("esp8266-ABC123"), "Luftdaten ABC123");
        assert_eq!(device_name("esp32-dev-42"), "Luftdaten 42");
        assert_eq!(device_name("plain"), "Luftdaten plain");
    }

    #[test]
    fn discovery_prefix_is_configurable() {
        let translator = Translator::new("sensors/", "ha");
        let intents = translator.translate(&single("PMS_P0", "3"), &ctx()).unwrap();
        assert_eq!(intents[0].topic, "ha/sensor/luftdaten-abc123-pms_p0/config");
        assert_eq!(intents[1].topic, "sensors/ABC123/PMS_P0");
    }

    #[test]
    fn pressure_config_converts_to_hectopascal() {
        let intents = translator()
            .translate(&single("BMP280_pressure", "100480"), &ctx())
            .unwrap();
        let config: DiscoveryConfig = serde_json::from_str(&intents[0].payload).unwrap();

        assert_eq!(config.unit_of_measurement, "hPa");
        assert_eq!(config.device_class.as_deref(), Some("pressure"));
        assert!(config.value_template.is_some());
        assert_eq!(config.state_class.as_deref(), Some("measurement"));
        assert_eq!(intents[1].payload, "100480");
    }
}
