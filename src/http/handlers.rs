use axum::body::Bytes;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use std::net::SocketAddr;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, warn};

use super::{AppState, ErrorResponse, DEVICE_ID_HEADER, SENSOR_HEADER};
use crate::translator::{InboundPayload, RequestContext};

const OK_BODY: &str = "OK";

/// Liveness probe.
pub async fn health_handler() -> &'static str {
    OK_BODY
}

/// Accepts one upload of a sensor station and queues its messages.
///
/// Uploads without a device id are acknowledged but ignored. The answer never
/// waits for the broker: when the publish queue is full the upload is dropped.
pub async fn upload_handler(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, ErrorResponse> {
    let Some(device_id) = header_value(&headers, DEVICE_ID_HEADER) else {
        warn!("Ignoring upload without {} header", DEVICE_ID_HEADER);
        return Ok(OK_BODY);
    };

    let payload = InboundPayload::from_slice(&body)
        .inspect_err(|e| warn!("Rejecting upload of {}: {}", device_id, e))?;
    debug!("json req received from {}: {:?}", device_id, payload);

    let ctx = RequestContext {
        device_id,
        sensor_label: header_value(&headers, SENSOR_HEADER),
        client_address: connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()),
    };
    let intents = state
        .translator
        .translate(&payload, &ctx)
        .inspect_err(|e| warn!("Rejecting upload of {}: {}", ctx.device_id, e))?;

    if intents.is_empty() {
        return Ok(OK_BODY);
    }

    match state.intents.try_send(intents) {
        Ok(()) => Ok(OK_BODY),
        // Broker backlog is not the device's problem.
        Err(TrySendError::Full(dropped)) => {
            warn!(
                "Publish queue full, dropping {} messages of {}",
                dropped.len(),
                ctx.device_id
            );
            Ok(OK_BODY)
        }
        Err(TrySendError::Closed(_)) => {
            error!("Publisher is gone, dropping upload of {}", ctx.device_id);
            Err(ErrorResponse::service_unavailable(
                "MQTT publisher is not running",
            ))
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
