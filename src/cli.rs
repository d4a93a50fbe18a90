use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::error::{PosError, PosResult, StoreError};
use crate::lifecycle::OrderStatus;
use crate::refresh::RefreshLoop;
use crate::repository::{DateRange, Repository};
use crate::wristband::NoAdapter;
use crate::{init_tracing, PosApp};

#[derive(Parser, Debug)]
#[command(name = "restaurant-pos", version, about = "Restaurant point of sale back office")]
struct Cli {
    /// Database file (overrides POS_DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `restaurant_pos_lib=trace`
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the store and seed the default menu
    Init,
    /// Write every collection as one JSON document
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load a JSON document produced by `export`
    Import { file: PathBuf },
    /// Today's figures; `--watch` keeps refreshing until Ctrl-C
    Stats {
        #[arg(long)]
        watch: bool,
    },
    /// Items at or below the stock threshold
    LowStock {
        #[arg(long)]
        threshold: Option<u32>,
    },
    /// Best selling items
    Popular {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Sales over a period: today, week, month or all
    Sales {
        #[arg(long, default_value = "today")]
        range: DateRange,
    },
    /// List orders, optionally by status
    Orders {
        #[arg(long)]
        status: Option<OrderStatus>,
    },
    /// Kitchen queue; `--watch` keeps refreshing until Ctrl-C
    Kitchen {
        #[arg(long)]
        watch: bool,
    },
}

pub(crate) fn run() -> PosResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref());

    let mut settings = Settings::from_env();
    if let Some(path) = cli.database {
        settings.database_path = path;
    }
    let app = PosApp::open(settings, Arc::new(NoAdapter))?;
    let repo = &app.repository;

    match cli.command {
        Command::Init => {
            let counts = serde_json::json!({
                "categories": repo.categories().list().len(),
                "menuItems": repo.menu_items().list().len(),
                "orders": repo.orders().list().len(),
                "customers": repo.customers().list().len(),
            });
            print_json(&counts)
        }
        Command::Export { output } => {
            let snapshot = repo.store().export_all();
            match output {
                Some(path) => std::fs::write(&path, snapshot).map_err(StoreError::from)?,
                None => println!("{}", snapshot),
            }
            Ok(())
        }
        Command::Import { file } => {
            let snapshot = std::fs::read_to_string(&file).map_err(StoreError::from)?;
            if repo.store().import_all(&snapshot) {
                Ok(())
            } else {
                Err(PosError::Validation(format!(
                    "{} is not a valid backup",
                    file.display()
                )))
            }
        }
        Command::Stats { watch: false } => print_stats(&app),
        Command::Stats { watch: true } => {
            let app = Arc::new(app);
            let period = app.settings.dashboard_refresh;
            watch(period, move || {
                if let Err(e) = print_stats(&app) {
                    tracing::error!(error = %e, "dashboard refresh failed");
                }
            })
        }
        Command::LowStock { threshold } => {
            let threshold = threshold.unwrap_or(app.settings.low_stock_threshold);
            print_json(&repo.reports().low_stock(threshold))
        }
        Command::Popular { limit } => print_json(&repo.reports().popular(limit)),
        Command::Sales { range } => print_json(&repo.reports().sales(range)),
        Command::Orders { status } => {
            let orders = match status {
                Some(status) => repo.orders().by_status(status),
                None => repo.orders().visible(),
            };
            print_json(&orders)
        }
        Command::Kitchen { watch: false } => print_json(&repo.reports().kitchen_tickets()),
        Command::Kitchen { watch: true } => {
            let repo = Arc::clone(repo);
            watch(app.settings.kitchen_refresh, move || print_kitchen(&repo))
        }
    }
}

/// Render now, then again every `period` until Ctrl-C.
fn watch<F>(period: Duration, render: F) -> PosResult<()>
where
    F: Fn() + Send + 'static,
{
    let runtime = tokio::runtime::Runtime::new().map_err(StoreError::from)?;

    runtime.block_on(async move {
        render();
        let mut refresh = RefreshLoop::spawn(period, render);
        let stopped = tokio::signal::ctrl_c().await;
        refresh.stop();
        stopped.map_err(StoreError::from)
    })?;

    Ok(())
}

fn print_stats(app: &PosApp) -> PosResult<()> {
    let reports = app.repository.reports();
    let stats = serde_json::json!({
        "today": reports.today(),
        "activeOrders": reports.active_order_count(),
        "lowStock": reports.low_stock(app.settings.low_stock_threshold).len(),
        "wristbandsSupported": app.gateway.is_supported(),
        "wristbandsConnected": app.gateway.connected_count(),
    });
    print_json(&stats)
}

fn print_kitchen(repo: &Repository) {
    let tickets = repo.reports().kitchen_tickets();
    println!("--- {} active order(s) ---", tickets.len());
    for ticket in tickets {
        println!(
            "#{} {:<20} {:>8} {}{}",
            ticket.order.order_number,
            ticket.order.customer_name,
            ticket.elapsed,
            ticket.order.status,
            if ticket.urgent { " !" } else { "" }
        );
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> PosResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(StoreError::from)?;
    println!("{}", text);
    Ok(())
}
