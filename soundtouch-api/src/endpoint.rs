//! Device addressing

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ApiError, Result};

/// Default port of the HTTP command protocol
pub const DEFAULT_COMMAND_PORT: u16 = 8090;

/// Default port of the WebSocket event protocol
pub const DEFAULT_EVENT_PORT: u16 = 8080;

/// Where a device listens for commands and pushes events
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    host: String,
    command_port: u16,
    event_port: u16,
}

impl DeviceEndpoint {
    /// Endpoint on the default ports
    ///
    /// Fails with [`ApiError::InvalidParameter`] if `host` is not a bare
    /// hostname or IP address.
    pub fn new(host: impl Into<String>) -> Result<Self> {
        let host = host.into();
        let parsed = Url::parse(&format!("http://{}/", host))
            .map_err(|e| ApiError::InvalidParameter(format!("Invalid host '{}': {}", host, e)))?;

        let valid = parsed.host_str().is_some()
            && parsed.port().is_none()
            && parsed.path() == "/"
            && parsed.username().is_empty();
        if !valid {
            return Err(ApiError::InvalidParameter(format!(
                "Invalid host '{}': expected a hostname or IP address",
                host
            )));
        }

        Ok(Self {
            host,
            command_port: DEFAULT_COMMAND_PORT,
            event_port: DEFAULT_EVENT_PORT,
        })
    }

    pub fn with_ports(mut self, command_port: u16, event_port: u16) -> Self {
        self.command_port = command_port;
        self.event_port = event_port;
        self
    }

    pub fn with_command_port(mut self, command_port: u16) -> Self {
        self.command_port = command_port;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn command_port(&self) -> u16 {
        self.command_port
    }

    pub fn event_port(&self) -> u16 {
        self.event_port
    }

    /// `http://{host}:{command_port}/{action}`
    pub fn command_url(&self, action: &str) -> String {
        format!("http://{}:{}/{}", self.host, self.command_port, action)
    }

    /// `ws://{host}:{event_port}`
    pub fn events_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.event_port)
    }
}
