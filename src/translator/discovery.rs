//! Home Assistant MQTT discovery documents.
//!
//! One [`DiscoveryConfig`] is published (retained) per sensor channel so Home
//! Assistant creates the entity on its own. Optional fields are left out of
//! the JSON instead of being sent as `null`.

use serde::{Deserialize, Serialize};

use super::sensors::SensorMetadata;

pub const MANUFACTURER: &str = "DIY Luftdaten";
pub const ENTITY_CATEGORY: &str = "diagnostic";

/// Entity config of one sensor channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Base topic, referenced as `~` by `state_topic`
    #[serde(rename = "~")]
    pub base_topic: String,
    pub name: String,
    pub state_topic: String,
    pub force_update: bool,
    pub qos: u8,
    pub unique_id: String,
    pub unit_of_measurement: String,
    pub device: DiscoveryDevice,
    /// Seconds without a new value until the entity becomes unavailable
    pub expire_after: u64,
    pub entity_category: String,
    pub origin: DiscoveryOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_class: Option<String>,
}

/// Physical device all channels of one sensor station are grouped under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryDevice {
    pub identifiers: Vec<String>,
    pub name: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
    pub manufacturer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_url: Option<String>,
}

/// Names the software that published the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryOrigin {
    pub name: String,
    pub sw_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_url: Option<String>,
}

impl Default for DiscoveryOrigin {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            sw_version: env!("CARGO_PKG_VERSION").to_string(),
            support_url: option_env!("CARGO_PKG_HOMEPAGE")
                .filter(|url| !url.is_empty())
                .map(str::to_string),
        }
    }
}

impl DiscoveryConfig {
    /// Builds the config for one channel from its static metadata. The
    /// entity is named after the device followed by the friendly name.
    pub fn for_sensor(
        meta: &SensorMetadata,
        topic_prefix: &str,
        unique_id: String,
        device: DiscoveryDevice,
        expire_after: u64,
    ) -> Self {
        Self {
            base_topic: topic_prefix.to_string(),
            name: format!("{} {}", device.name, meta.friendly_name),
            state_topic: format!("~/{}", meta.kind),
            force_update: false,
            qos: 0,
            unique_id,
            unit_of_measurement: meta.unit.to_string(),
            device,
            expire_after,
            entity_category: ENTITY_CATEGORY.to_string(),
            origin: DiscoveryOrigin::default(),
            device_class: meta.device_class().map(str::to_string),
            icon: meta.icon().map(str::to_string),
            value_template: meta.value_template.map(str::to_string),
            state_class: meta.state_class.map(str::to_string),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
