//! Settings loaded from the environment (and `.env` when present).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::repository::RepositoryOptions;
use crate::wristband::WristbandSettings;

pub const DEFAULT_DATABASE_PATH: &str = "restaurant_pos.db";
pub const DEFAULT_STORAGE_QUOTA_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_TAX_RATE: f64 = 0.05;
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;
pub const DEFAULT_WRISTBAND_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DASHBOARD_REFRESH_SECS: u64 = 30;
pub const DEFAULT_KITCHEN_REFRESH_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: PathBuf,
    /// `None` disables the per-value size check.
    pub storage_quota_bytes: Option<usize>,
    pub tax_rate: f64,
    pub low_stock_threshold: u32,
    pub restore_stock_on_cancel: bool,
    pub wristband: WristbandSettings,
    pub dashboard_refresh: Duration,
    pub kitchen_refresh: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            storage_quota_bytes: Some(DEFAULT_STORAGE_QUOTA_BYTES),
            tax_rate: DEFAULT_TAX_RATE,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            restore_stock_on_cancel: false,
            wristband: WristbandSettings::default(),
            dashboard_refresh: Duration::from_secs(DEFAULT_DASHBOARD_REFRESH_SECS),
            kitchen_refresh: Duration::from_secs(DEFAULT_KITCHEN_REFRESH_SECS),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Settings::default();
        let quota = parse_var("POS_STORAGE_QUOTA_BYTES", DEFAULT_STORAGE_QUOTA_BYTES);

        Settings {
            database_path: env::var("POS_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            storage_quota_bytes: (quota > 0).then_some(quota),
            tax_rate: parse_var("POS_TAX_RATE", DEFAULT_TAX_RATE),
            low_stock_threshold: parse_var("POS_LOW_STOCK_THRESHOLD", DEFAULT_LOW_STOCK_THRESHOLD),
            restore_stock_on_cancel: parse_var("POS_RESTORE_STOCK_ON_CANCEL", false),
            wristband: WristbandSettings {
                name_prefix: env::var("POS_WRISTBAND_NAME_PREFIX")
                    .unwrap_or(defaults.wristband.name_prefix),
                operation_timeout: Duration::from_secs(parse_var(
                    "POS_WRISTBAND_TIMEOUT_SECS",
                    DEFAULT_WRISTBAND_TIMEOUT_SECS,
                )),
                ..defaults.wristband
            },
            dashboard_refresh: Duration::from_secs(parse_var(
                "POS_DASHBOARD_REFRESH_SECS",
                DEFAULT_DASHBOARD_REFRESH_SECS,
            )),
            kitchen_refresh: Duration::from_secs(parse_var(
                "POS_KITCHEN_REFRESH_SECS",
                DEFAULT_KITCHEN_REFRESH_SECS,
            )),
        }
    }

    pub fn repository_options(&self) -> RepositoryOptions {
        RepositoryOptions {
            tax_rate: self.tax_rate,
            restore_stock_on_cancel: self.restore_stock_on_cancel,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, "unparseable setting, using default");
            default
        }),
        Err(_) => default,
    }
}
