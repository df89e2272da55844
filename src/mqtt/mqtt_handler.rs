use std::time::Duration;

use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, Outgoing, Packet, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::config::MqttConfig;
use super::error::MqttError;
use super::message_manager::{IntentBatch, PublishIntent};

/// Capacity of rumqttc's request queue between client and event loop
const REQUEST_CAPACITY: usize = 100;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// At-least-once delivery for every message the bridge sends
pub const PUBLISH_QOS: QoS = QoS::AtLeastOnce;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishStats {
    pub batches: usize,
    pub messages_sent: usize,
    pub failures: usize,
}

/// Broker connection after a successful handshake.
pub struct MqttHandler {
    client: AsyncClient,
    eventloop: EventLoop,
}

/// Background tasks owning the broker connection.
pub struct MqttTasks {
    pub publisher: JoinHandle<PublishStats>,
    pub event_loop: JoinHandle<()>,
}

impl MqttHandler {
    /// Connects and waits for the broker's ConnAck.
    ///
    /// A refusal or network failure here is fatal for the bridge; later
    /// connection losses are retried by the event loop task.
    pub async fn connect(config: &MqttConfig) -> Result<Self, MqttError> {
        info!(
            "Connecting to MQTT broker {}:{} as '{}'",
            config.host, config.port, config.client_id
        );
        let (client, mut eventloop) = AsyncClient::new(config.options(), REQUEST_CAPACITY);

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(MqttError::from_return_code(ack.code));
                    }
                    info!("Connected to MQTT broker");
                    return Ok(MqttHandler { client, eventloop });
                }
                Ok(event) => trace!(?event, "Waiting for ConnAck"),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Starts the event loop and the publisher. Both stop after `token` is
    /// cancelled and the publisher has flushed what was already queued.
    pub fn spawn(
        self,
        pending: mpsc::Receiver<IntentBatch>,
        token: CancellationToken,
    ) -> MqttTasks {
        let event_loop = tokio::spawn(drive_event_loop(self.eventloop, token.clone()));
        let publisher = tokio::spawn(run_publisher(self.client, pending, token));
        MqttTasks {
            publisher,
            event_loop,
        }
    }
}

impl MqttTasks {
    pub async fn join(self) {
        match self.publisher.await {
            Ok(stats) => info!(
                "Publisher stopped after {} messages in {} batches ({} failed)",
                stats.messages_sent, stats.batches, stats.failures
            ),
            Err(e) => error!("Publisher task failed: {}", e),
        }
        if let Err(e) = self.event_loop.await {
            error!("MQTT event loop task failed: {}", e);
        }
    }
}

/// Publishes batches in arrival order, each batch in its own order.
pub async fn run_publisher(
    client: AsyncClient,
    mut pending: mpsc::Receiver<IntentBatch>,
    token: CancellationToken,
) -> PublishStats {
    let mut stats = PublishStats::default();

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            batch = pending.recv() => {
                match batch {
                    Some(batch) => publish_batch(&client, batch, &mut stats).await,
                    None => break,
                }
            }
        }
    }

    // Requests accepted before shutdown still go out.
    pending.close();
    while let Some(batch) = pending.recv().await {
        publish_batch(&client, batch, &mut stats).await;
    }

    if let Err(e) = client.disconnect().await {
        warn!("Failed to request disconnect: {}", e);
    }
    stats
}

async fn publish_batch(client: &AsyncClient, batch: IntentBatch, stats: &mut PublishStats) {
    stats.batches += 1;
    for intent in batch {
        debug!("publishing to broker: {}", intent);
        let PublishIntent {
            topic,
            payload,
            retain,
        } = intent;
        match client
            .publish(topic, PUBLISH_QOS, retain, payload.into_bytes())
            .await
        {
            Ok(()) => stats.messages_sent += 1,
            Err(e) => {
                stats.failures += 1;
                error!("Failed to publish: {}", e);
            }
        }
    }
}

async fn drive_event_loop(mut eventloop: EventLoop, token: CancellationToken) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => info!("Reconnected to MQTT broker"),
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                info!("Disconnected from MQTT broker");
                break;
            }
            Ok(event) => trace!(?event, "MQTT event"),
            Err(e) => {
                if token.is_cancelled() {
                    debug!("MQTT event loop stopping: {}", e);
                    break;
                }
                warn!("MQTT connection error: {}, retrying", e);
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                }
            }
        }
    }
}
