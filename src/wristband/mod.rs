//! Wristband pager: discovers, connects and buzzes customer wristbands.
//!
//! Everything here is best effort. Failures are logged, announced on the
//! event channel as user-facing notices, and reported as `false`/`None`;
//! nothing propagates into the order lifecycle.

mod matcher;
mod transport;

pub use matcher::{DeviceMatcher, NameOrSuffixMatcher};
pub use transport::{
    CommandChannel, DiscoveredDevice, Link, NoAdapter, ScanFilter, TransportError,
    WristbandTransport,
};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::Order;

pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x4fafc201_1fb5_459e_8fcc_c5c9c331914b);
pub const CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0xbeb5483e_36e1_4688_b7f5_ea07361b26a8);
pub const DEFAULT_NAME_PREFIX: &str = "WB-";
pub const DEFAULT_PATTERN: u8 = 1;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct WristbandSettings {
    pub service: Uuid,
    pub characteristic: Uuid,
    pub name_prefix: String,
    /// Upper bound on every transport call.
    pub operation_timeout: Duration,
    pub default_pattern: u8,
}

impl Default for WristbandSettings {
    fn default() -> Self {
        WristbandSettings {
            service: SERVICE_UUID,
            characteristic: CHARACTERISTIC_UUID,
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            operation_timeout: Duration::from_secs(crate::config::DEFAULT_WRISTBAND_TIMEOUT_SECS),
            default_pattern: DEFAULT_PATTERN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedDevice {
    pub id: String,
    pub name: Option<String>,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    Scanning,
    Connected { id: String, name: Option<String> },
    Disconnected { id: String },
    Notice { level: NoticeLevel, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    NoWristband,
    NotConnected,
    Delivered,
    Failed,
}

struct Connection {
    device: ConnectedDevice,
    channel: Arc<dyn CommandChannel>,
    generation: u64,
}

type ConnectionMap = Arc<Mutex<IndexMap<String, Connection>>>;

pub struct WristbandGateway {
    transport: Arc<dyn WristbandTransport>,
    settings: WristbandSettings,
    matcher: Arc<dyn DeviceMatcher>,
    clock: Arc<dyn Clock>,
    connections: ConnectionMap,
    generation: AtomicU64,
    events: broadcast::Sender<GatewayEvent>,
}

impl WristbandGateway {
    pub fn new(
        transport: Arc<dyn WristbandTransport>,
        settings: WristbandSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        if !transport.is_supported() {
            tracing::warn!("no wireless adapter, wristband notifications disabled");
        }
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        WristbandGateway {
            matcher: Arc::new(NameOrSuffixMatcher::new(settings.name_prefix.clone())),
            transport,
            settings,
            clock,
            connections: Arc::new(Mutex::new(IndexMap::new())),
            generation: AtomicU64::new(0),
            events,
        }
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn DeviceMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.events.subscribe()
    }

    pub fn is_supported(&self) -> bool {
        self.transport.is_supported()
    }

    pub async fn check_availability(&self) -> bool {
        if !self.is_supported() {
            return false;
        }
        match self.bounded(self.transport.is_available()).await {
            Ok(available) => available,
            Err(e) => {
                tracing::warn!(error = %e, "availability check failed");
                false
            }
        }
    }

    /// Ask the host for a nearby wristband. `None` when unsupported,
    /// cancelled, nothing found or the scan failed.
    pub async fn scan(&self) -> Option<DiscoveredDevice> {
        if !self.is_supported() {
            self.notice(NoticeLevel::Error, "Wristband pairing is not supported on this device");
            return None;
        }

        self.emit(GatewayEvent::Scanning);
        let filter = ScanFilter {
            services: vec![self.settings.service],
            name_prefix: Some(self.settings.name_prefix.clone()),
        };

        match self.bounded(self.transport.request_device(&filter)).await {
            Ok(device) => {
                tracing::debug!(id = %device.id, name = ?device.name, "wristband discovered");
                Some(device)
            }
            Err(TransportError::NotFound) => {
                self.notice(NoticeLevel::Warning, "No wristbands found nearby");
                None
            }
            Err(TransportError::Cancelled) => {
                self.notice(NoticeLevel::Info, "Wristband pairing cancelled");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "wristband scan failed");
                self.notice(NoticeLevel::Error, "Wristband scan failed");
                None
            }
        }
    }

    /// Open a session to `device` and track it until it disconnects.
    /// Returns the device id.
    pub async fn connect(&self, device: DiscoveredDevice) -> Option<String> {
        tracing::info!(id = %device.id, name = ?device.name, "connecting to wristband");

        let connect = self.transport.connect(
            &device,
            self.settings.service,
            self.settings.characteristic,
        );
        let link = match self.bounded(connect).await {
            Ok(link) => link,
            Err(e) => {
                tracing::error!(id = %device.id, error = %e, "wristband connection failed");
                self.notice(NoticeLevel::Error, "Failed to connect to wristband");
                return None;
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let connected = ConnectedDevice {
            id: device.id.clone(),
            name: device.name.clone(),
            connected_at: self.clock.now(),
        };
        lock(&self.connections).insert(
            device.id.clone(),
            Connection {
                device: connected,
                channel: link.channel,
                generation,
            },
        );
        self.watch_link(device.id.clone(), generation, link.closed);

        let label = device.name.clone().unwrap_or_else(|| device.id.clone());
        self.emit(GatewayEvent::Connected {
            id: device.id.clone(),
            name: device.name,
        });
        self.notice(NoticeLevel::Success, format!("Connected to {}", label));

        Some(device.id)
    }

    fn watch_link(&self, id: String, generation: u64, closed: tokio::sync::oneshot::Receiver<()>) {
        let connections = Arc::clone(&self.connections);
        let events = self.events.clone();

        tokio::spawn(async move {
            let _ = closed.await;
            let removed = {
                let mut map = lock(&connections);
                match map.get(&id) {
                    Some(conn) if conn.generation == generation => map.shift_remove(&id),
                    _ => None,
                }
            };
            if removed.is_some() {
                tracing::info!(id = %id, "wristband link lost");
                let _ = events.send(GatewayEvent::Disconnected { id });
            }
        });
    }

    /// Scan and connect in one go. Returns the label to put on the order:
    /// the device name, or its id when unnamed.
    pub async fn pair(&self) -> Option<String> {
        let device = self.scan().await?;
        let label = device.name.clone().unwrap_or_else(|| device.id.clone());
        match self.connect(device).await {
            Some(_) => Some(label),
            None => {
                self.notice(
                    NoticeLevel::Warning,
                    "Make sure the wristband is powered on and nearby",
                );
                None
            }
        }
    }

    pub async fn disconnect(&self, device_id: &str) {
        let Some(conn) = lock(&self.connections).shift_remove(device_id) else {
            return;
        };

        if let Err(e) = self.bounded(conn.channel.disconnect()).await {
            tracing::warn!(id = device_id, error = %e, "wristband disconnect failed");
        }
        self.emit(GatewayEvent::Disconnected {
            id: device_id.to_string(),
        });
        self.notice(NoticeLevel::Info, "Wristband disconnected");
    }

    /// Write `V<pattern>` to the device. `false` if it is not connected or
    /// the write fails.
    pub async fn send_signal(&self, device_id: &str, pattern: u8) -> bool {
        let channel = lock(&self.connections)
            .get(device_id)
            .map(|conn| Arc::clone(&conn.channel));
        let Some(channel) = channel else {
            tracing::warn!(id = device_id, "wristband not connected");
            return false;
        };

        let command = format!("V{}", pattern);
        match self.bounded(channel.write(command.as_bytes())).await {
            Ok(()) => {
                tracing::info!(id = device_id, pattern, "vibration sent");
                true
            }
            Err(e) => {
                tracing::error!(id = device_id, error = %e, "vibration write failed");
                self.notice(NoticeLevel::Error, "Failed to notify wristband");
                false
            }
        }
    }

    /// Connection order is preserved.
    pub fn list_connected(&self) -> Vec<ConnectedDevice> {
        lock(&self.connections)
            .values()
            .map(|conn| conn.device.clone())
            .collect()
    }

    pub fn is_connected(&self, device_id: &str) -> bool {
        lock(&self.connections).contains_key(device_id)
    }

    pub fn connected_count(&self) -> usize {
        lock(&self.connections).len()
    }

    /// First live connection the matcher accepts for `wristband_id`.
    pub fn find_for_wristband(&self, wristband_id: &str) -> Option<ConnectedDevice> {
        lock(&self.connections)
            .values()
            .find(|conn| self.matcher.matches(wristband_id, &conn.device))
            .map(|conn| conn.device.clone())
    }

    /// Buzz the wristband assigned to `order`, if any is connected.
    pub async fn notify_order(&self, order: &Order) -> NotifyOutcome {
        let wristband_id = order.wristband_id.as_deref().map(str::trim);
        let Some(wristband_id) = wristband_id.filter(|w| !w.is_empty()) else {
            self.notice(NoticeLevel::Warning, "No wristband assigned to this order");
            return NotifyOutcome::NoWristband;
        };
        let Some(device) = self.find_for_wristband(wristband_id) else {
            self.notice(
                NoticeLevel::Error,
                "Wristband is not connected. Please pair the wristband first.",
            );
            return NotifyOutcome::NotConnected;
        };

        if self
            .send_signal(&device.id, self.settings.default_pattern)
            .await
        {
            self.notice(NoticeLevel::Success, "Customer notified via wristband");
            NotifyOutcome::Delivered
        } else {
            NotifyOutcome::Failed
        }
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, TransportError>>,
    ) -> Result<T, TransportError> {
        tokio::time::timeout(self.settings.operation_timeout, op)
            .await
            .unwrap_or(Err(TransportError::Timeout))
    }

    fn emit(&self, event: GatewayEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn notice(&self, level: NoticeLevel, message: impl Into<String>) {
        self.emit(GatewayEvent::Notice {
            level,
            message: message.into(),
        });
    }
}

fn lock(connections: &Mutex<IndexMap<String, Connection>>) -> MutexGuard<'_, IndexMap<String, Connection>> {
    connections.lock().unwrap_or_else(|e| e.into_inner())
}
