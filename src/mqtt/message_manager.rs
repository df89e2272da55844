use std::fmt;
use tokio::sync::mpsc;

/// A single message the bridge wants on the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishIntent {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

impl PublishIntent {
    /// Message that stays on the broker for late subscribers.
    pub fn retained(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        PublishIntent {
            topic: topic.into(),
            payload: payload.into(),
            retain: true,
        }
    }

    pub fn transient(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        PublishIntent {
            topic: topic.into(),
            payload: payload.into(),
            retain: false,
        }
    }
}

impl fmt::Display for PublishIntent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}' '{}'", self.topic, self.payload)?;
        if self.retain {
            write!(f, " (retained)")?;
        }
        Ok(())
    }
}

/// Intents of one request, published in order.
pub type IntentBatch = Vec<PublishIntent>;

/// Channel between request handlers and the publisher task.
pub struct MsgManager {
    pub outgoing: mpsc::Sender<IntentBatch>,
    pub pending: mpsc::Receiver<IntentBatch>,
}

impl MsgManager {
    pub fn new(capacity: usize) -> Self {
        let (outgoing, pending) = mpsc::channel(capacity);
        MsgManager { outgoing, pending }
    }
}
