use rumqttc::MqttOptions;
use std::time::Duration;

use crate::config::BridgeConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    /// Username and password, `None` connects anonymously
    pub credentials: Option<(String, String)>,
    pub keep_alive: Duration,
}

impl MqttConfig {
    pub fn from_bridge(config: &BridgeConfig) -> Self {
        let credentials = config.mqtt_user.as_ref().map(|user| {
            (
                user.clone(),
                config.mqtt_pass.clone().unwrap_or_default(),
            )
        });

        MqttConfig {
            host: config.mqtt_host.clone(),
            port: config.mqtt_port,
            client_id: config.mqtt_client_id.clone(),
            credentials,
            keep_alive: Duration::from_secs(30),
        }
    }

    pub fn options(&self) -> MqttOptions {
        let mut mqtt_options = MqttOptions::new(&self.client_id, &self.host, self.port);
        mqtt_options
            .set_keep_alive(self.keep_alive)
            .set_clean_session(true);
        if let Some((user, pw)) = &self.credentials {
            mqtt_options.set_credentials(user, pw);
        }
        mqtt_options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_without_user() {
        let mut bridge = BridgeConfig::default();
        bridge.mqtt_pass = Some("secret".to_string());
        let config = MqttConfig::from_bridge(&bridge);
        assert_eq!(config.credentials, None);
        assert_eq!(config.options().credentials(), None);
    }

    #[test]
    fn user_without_password() {
        let mut bridge = BridgeConfig::default();
        bridge.mqtt_user = Some("bridge".to_string());
        let config = MqttConfig::from_bridge(&bridge);
        assert_eq!(
            config.credentials,
            Some(("bridge".to_string(), String::new()))
        );
    }

    #[test]
    fn options_follow_config() {
        let mut bridge = BridgeConfig::default();
        bridge.mqtt_host = "broker.lan".to_string();
        bridge.mqtt_port = 8883;
        let options = MqttConfig::from_bridge(&bridge).options();
        assert_eq!(
            options.broker_address(),
            ("broker.lan".to_string(), 8883)
        );
        assert_eq!(options.client_id(), "luftdaten2mqtt");
        assert_eq!(options.keep_alive(), Duration::from_secs(30));
    }
}
