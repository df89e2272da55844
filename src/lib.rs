//! # luftdaten2mqtt
//!
//! Receives measurement uploads from Luftdaten air-quality sensors over HTTP
//! and republishes them to an MQTT broker, together with Home Assistant
//! discovery configs so every sensor channel shows up as an entity.
//!
//! ```text
//! src/
//! ├── config.rs     - BridgeConfig: defaults, TOML file, environment
//! ├── translator/   - payload → ordered publish intents (the core)
//! ├── mqtt/         - broker connection, event loop and publisher task
//! └── http/         - axum routes feeding the translator
//! ```

pub mod config;
pub mod http;
pub mod mqtt;
pub mod translator;
