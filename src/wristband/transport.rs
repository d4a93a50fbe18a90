use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("wireless adapter is not available on this host")]
    Unsupported,

    #[error("device selection was cancelled")]
    Cancelled,

    #[error("no matching wristband found nearby")]
    NotFound,

    #[error("wristband does not expose the notification service")]
    ServiceMissing,

    #[error("wristband did not respond in time")]
    Timeout,

    #[error("link error: {0}")]
    Link(String),
}

/// What a scan asks the host to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFilter {
    pub services: Vec<Uuid>,
    pub name_prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub id: String,
    pub name: Option<String>,
}

/// Writable characteristic on a connected wristband.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    async fn write(&self, payload: &[u8]) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// An open session. `closed` resolves (or its sender drops) when the
/// link is lost.
pub struct Link {
    pub channel: Arc<dyn CommandChannel>,
    pub closed: oneshot::Receiver<()>,
}

/// Host wireless stack.
#[async_trait]
pub trait WristbandTransport: Send + Sync {
    fn is_supported(&self) -> bool;

    /// Whether the radio is switched on right now.
    async fn is_available(&self) -> Result<bool, TransportError>;

    async fn request_device(&self, filter: &ScanFilter) -> Result<DiscoveredDevice, TransportError>;

    /// Open a session and resolve `service`/`characteristic` on it.
    async fn connect(
        &self,
        device: &DiscoveredDevice,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<Link, TransportError>;
}

/// Transport for hosts without a wireless stack.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAdapter;

#[async_trait]
impl WristbandTransport for NoAdapter {
    fn is_supported(&self) -> bool {
        false
    }

    async fn is_available(&self) -> Result<bool, TransportError> {
        Ok(false)
    }

    async fn request_device(&self, _filter: &ScanFilter) -> Result<DiscoveredDevice, TransportError> {
        Err(TransportError::Unsupported)
    }

    async fn connect(
        &self,
        _device: &DiscoveredDevice,
        _service: Uuid,
        _characteristic: Uuid,
    ) -> Result<Link, TransportError> {
        Err(TransportError::Unsupported)
    }
}
