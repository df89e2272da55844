//! Static knowledge about the measurement kinds Luftdaten firmware reports.
//!
//! Adding support for another sensor means adding a row to [`SENSORS`].

const MICROGRAMS_PER_CUBIC_METER: &str = "µg/m³";
const CELSIUS: &str = "°C";
const PERCENT: &str = "%";
const HECTOPASCAL: &str = "hPa";
const DBM: &str = "dBm";

const MEASUREMENT: Option<&str> = Some("measurement");
const PASCAL_TO_HECTOPASCAL: Option<&str> = Some("{{ (value | float / 100) | round(1) }}");

/// How Home Assistant should present an entity: a device class, or an icon
/// for kinds it has no class for. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    DeviceClass(&'static str),
    Icon(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorMetadata {
    pub kind: &'static str,
    pub friendly_name: &'static str,
    pub unit: &'static str,
    pub appearance: Appearance,
    pub value_template: Option<&'static str>,
    pub state_class: Option<&'static str>,
}

impl SensorMetadata {
    pub fn device_class(&self) -> Option<&'static str> {
        match self.appearance {
            Appearance::DeviceClass(class) => Some(class),
            Appearance::Icon(_) => None,
        }
    }

    pub fn icon(&self) -> Option<&'static str> {
        match self.appearance {
            Appearance::Icon(icon) => Some(icon),
            Appearance::DeviceClass(_) => None,
        }
    }
}

const fn temperature(kind: &'static str) -> SensorMetadata {
    SensorMetadata {
        kind,
        friendly_name: "Temperature",
        unit: CELSIUS,
        appearance: Appearance::DeviceClass("temperature"),
        value_template: None,
        state_class: MEASUREMENT,
    }
}

const fn humidity(kind: &'static str) -> SensorMetadata {
    SensorMetadata {
        kind,
        friendly_name: "Humidity",
        unit: PERCENT,
        appearance: Appearance::DeviceClass("humidity"),
        value_template: None,
        state_class: MEASUREMENT,
    }
}

// Devices report pascal, entities are shown in hPa.
const fn pressure(kind: &'static str) -> SensorMetadata {
    SensorMetadata {
        kind,
        friendly_name: "Pressure",
        unit: HECTOPASCAL,
        appearance: Appearance::DeviceClass("pressure"),
        value_template: PASCAL_TO_HECTOPASCAL,
        state_class: MEASUREMENT,
    }
}

const fn particulate(
    kind: &'static str,
    friendly_name: &'static str,
    icon: &'static str,
) -> SensorMetadata {
    SensorMetadata {
        kind,
        friendly_name,
        unit: MICROGRAMS_PER_CUBIC_METER,
        appearance: Appearance::Icon(icon),
        value_template: None,
        state_class: MEASUREMENT,
    }
}

pub static SENSORS: &[SensorMetadata] = &[
    temperature("temperature"),
    humidity("humidity"),
    temperature("BME280_temperature"),
    humidity("BME280_humidity"),
    pressure("BME280_pressure"),
    temperature("BMP_temperature"),
    pressure("BMP_pressure"),
    temperature("BMP280_temperature"),
    pressure("BMP280_pressure"),
    particulate("SDS_P1", "PM10", "mdi:thought-bubble"),
    particulate("SDS_P2", "PM2.5", "mdi:thought-bubble-outline"),
    SensorMetadata {
        kind: "signal",
        friendly_name: "Wifi signal",
        unit: DBM,
        appearance: Appearance::DeviceClass("signal_strength"),
        value_template: None,
        state_class: MEASUREMENT,
    },
    temperature("HTU21D_temperature"),
    humidity("HTU21D_humidity"),
    particulate("SPS30_P0", "PM1", "mdi:cloud"),
    particulate("SPS30_P2", "PM2.5", "mdi:thought-bubble-outline"),
    particulate("SPS30_P4", "PM4", "mdi:cloud-outline"),
    particulate("SPS30_P1", "PM10", "mdi:thought-bubble"),
    particulate("PMS_P0", "PM1", "mdi:cloud"),
    particulate("PMS_P1", "PM10", "mdi:thought-bubble"),
    particulate("PMS_P2", "PM2.5", "mdi:thought-bubble-outline"),
];

/// Metadata for a reading kind, `None` for kinds the bridge does not know.
pub fn lookup(kind: &str) -> Option<&'static SensorMetadata> {
    SENSORS.iter().find(|s| s.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn kinds_are_unique() {
        let kinds: HashSet<_> = SENSORS.iter().map(|s| s.kind).collect();
        assert_eq!(kinds.len(), SENSORS.len());
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(lookup("SDS_P1").map(|s| s.friendly_name), Some("PM10"));
        assert!(lookup("sds_p1").is_none());
        assert!(lookup("interval").is_none());
        assert!(lookup("samples").is_none());
    }

    #[test]
    fn every_kind_has_class_or_icon() {
        for sensor in SENSORS {
            assert!(
                sensor.device_class().is_some() != sensor.icon().is_some(),
                "{} must have exactly one of device class and icon",
                sensor.kind
            );
        }
    }

    #[test]
    fn particulate_matter_uses_icons() {
        let sensor = lookup("SPS30_P4").unwrap();
        assert_eq!(sensor.icon(), Some("mdi:cloud-outline"));
        assert_eq!(sensor.unit, "µg/m³");
    }
}
