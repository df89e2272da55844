//! # MQTT Integration Module
//!
//! Owns the broker connection of the bridge. Request handlers never talk to
//! the broker directly: they hand the intents of one upload to the publisher
//! task as a single batch, which keeps the order within an upload intact
//! (firmware first, every discovery config before its data point).
//!
//! ```text
//! mqtt/
//! ├── config.rs           - Broker address, client id and credentials
//! ├── error.rs            - Startup failures and their exit codes
//! ├── message_manager.rs  - PublishIntent and the batch channel
//! └── mqtt_handler.rs     - Connection, event loop and publisher tasks
//! ```
//!
//! ## Connection Lifecycle
//!
//! The first connection attempt happens before the HTTP listener starts; a
//! refusal ends the process with the code from [`MqttError::exit_code`].
//! After that the event loop task keeps polling rumqttc, which reconnects
//! on its own. Publish failures are logged and never reach HTTP callers.

pub mod config;
pub mod error;
pub mod message_manager;
pub mod mqtt_handler;

pub use config::MqttConfig;
pub use error::MqttError;
pub use message_manager::{IntentBatch, MsgManager, PublishIntent};
pub use mqtt_handler::{MqttHandler, MqttTasks, PublishStats};
