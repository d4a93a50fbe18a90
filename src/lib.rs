mod cli;
mod clock;
mod config;
mod db;
mod error;
mod lifecycle;
mod models;
mod refresh;
mod repository;
mod wristband;


pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Settings;
pub use db::{generate_id, Collection, Store};
pub use error::{PosError, PosResult, StoreError};
pub use lifecycle::{
    check_transition, next_order_number, round_money, OrderStatus, PaymentMethod, PaymentStatus,
    Totals,
};
pub use models::*;
pub use refresh::RefreshLoop;
pub use repository::{
    format_elapsed, Categories, Customers, DateRange, KitchenTicket, MenuItems, Orders,
    PopularItem, Reports, Repository, RepositoryOptions, SalesReport, TodayStats, Urgency,
};
pub use wristband::{
    CommandChannel, ConnectedDevice, DeviceMatcher, DiscoveredDevice, GatewayEvent, Link,
    NameOrSuffixMatcher, NoAdapter, NoticeLevel, NotifyOutcome, ScanFilter, TransportError,
    WristbandGateway, WristbandSettings, WristbandTransport, CHARACTERISTIC_UUID,
    DEFAULT_NAME_PREFIX, SERVICE_UUID,
};

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// The services a front end needs, built once at start-up and shared.
pub struct PosApp {
    pub settings: Settings,
    pub repository: Arc<Repository>,
    pub gateway: Arc<WristbandGateway>,
}

impl PosApp {
    /// Open the store at `settings.database_path`, seed it on first run and
    /// set up the gateway over `transport`.
    pub fn open(settings: Settings, transport: Arc<dyn WristbandTransport>) -> PosResult<Self> {
        let store = Store::open(&settings.database_path)?;
        Self::assemble(settings, store, transport, Arc::new(SystemClock))
    }

    pub fn in_memory(
        settings: Settings,
        transport: Arc<dyn WristbandTransport>,
        clock: Arc<dyn Clock>,
    ) -> PosResult<Self> {
        Self::assemble(settings, Store::open_in_memory()?, transport, clock)
    }

    fn assemble(
        settings: Settings,
        store: Store,
        transport: Arc<dyn WristbandTransport>,
        clock: Arc<dyn Clock>,
    ) -> PosResult<Self> {
        let store = match settings.storage_quota_bytes {
            Some(quota) => store.with_quota(quota),
            None => store,
        };
        store.initialize()?;

        let repository = Repository::new(
            Arc::new(store),
            Arc::clone(&clock),
            settings.repository_options(),
        );
        repository.init()?;

        let gateway = WristbandGateway::new(transport, settings.wristband.clone(), clock);
        tracing::info!(path = %settings.database_path.display(), "point of sale ready");

        Ok(PosApp {
            settings,
            repository: Arc::new(repository),
            gateway: Arc::new(gateway),
        })
    }
}

/// Install the fmt subscriber on stderr. `filter` wins over `RUST_LOG`;
/// the fallback is `info`.
pub fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Entry point of the operator binary.
pub fn run() -> PosResult<()> {
    cli::run()
}
