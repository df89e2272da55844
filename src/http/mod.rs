//! HTTP endpoints the sensors upload to.

pub mod error;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::mqtt::IntentBatch;
use crate::translator::Translator;

pub use error::ErrorResponse;

pub const UPLOAD_PATH: &str = "/luftdaten/json2mqtt";
pub const HEALTH_PATH: &str = "/health";

/// Header carrying the hardware id of the uploading device.
pub const DEVICE_ID_HEADER: &str = "x-mac-id";
/// Header carrying the sensor model string, e.g. `esp8266-1234567`.
pub const SENSOR_HEADER: &str = "x-sensor";

#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<Translator>,
    pub intents: mpsc::Sender<IntentBatch>,
}

impl AppState {
    pub fn new(translator: Translator, intents: mpsc::Sender<IntentBatch>) -> Self {
        Self {
            translator: Arc::new(translator),
            intents,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(UPLOAD_PATH, post(handlers::upload_handler))
        .route(HEALTH_PATH, get(handlers::health_handler))
        .with_state(state)
}
