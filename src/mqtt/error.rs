use rumqttc::{ConnectReturnCode, ConnectionError};
use thiserror::Error;

/// Reasons the broker connection could not be established at startup.
///
/// Each reason maps to its own process exit code.
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("Broker refused the protocol version")]
    ProtocolMismatch,

    #[error("Broker rejected the client id")]
    BadClientId,

    #[error("Broker unavailable: {0}")]
    BrokerUnavailable(String),

    #[error("Broker rejected username or password")]
    BadCredentials,

    #[error("Client is not authorized to connect")]
    NotAuthorized,

    #[error("Connection failed: {0}")]
    Unknown(String),
}

impl MqttError {
    pub fn exit_code(&self) -> i32 {
        match self {
            MqttError::ProtocolMismatch => 1,
            MqttError::BadClientId => 2,
            MqttError::BrokerUnavailable(_) => 3,
            MqttError::BadCredentials => 4,
            MqttError::NotAuthorized => 5,
            MqttError::Unknown(_) => 6,
        }
    }

    pub fn from_return_code(code: ConnectReturnCode) -> Self {
        match code {
            ConnectReturnCode::RefusedProtocolVersion => MqttError::ProtocolMismatch,
            ConnectReturnCode::BadClientId => MqttError::BadClientId,
            ConnectReturnCode::ServiceUnavailable => {
                MqttError::BrokerUnavailable("service unavailable".to_string())
            }
            ConnectReturnCode::BadUserNamePassword => MqttError::BadCredentials,
            ConnectReturnCode::NotAuthorized => MqttError::NotAuthorized,
            other => MqttError::Unknown(format!("unexpected return code {:?}", other)),
        }
    }
}

impl From<ConnectionError> for MqttError {
    fn from(e: ConnectionError) -> Self {
        match e {
            ConnectionError::ConnectionRefused(code) => MqttError::from_return_code(code),
            e @ (ConnectionError::Io(_) | ConnectionError::NetworkTimeout) => {
                MqttError::BrokerUnavailable(e.to_string())
            }
            other => MqttError::Unknown(other.to_string()),
        }
    }
}
