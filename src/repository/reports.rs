//! Read-only aggregates for the dashboard, inventory, reports and kitchen views.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::lifecycle::{round_money, OrderStatus, PaymentMethod, PaymentStatus};
use crate::models::{MenuItem, Order};
use crate::repository::Repository;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    pub total_orders: usize,
    pub active_orders: usize,
    pub completed_orders: usize,
    pub revenue: f64,
    pub avg_order_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularItem {
    #[serde(flatten)]
    pub item: MenuItem,
    pub order_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    Today,
    /// Last 7 days.
    Week,
    /// Last 30 days.
    Month,
    All,
}

impl DateRange {
    fn contains(self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            DateRange::Today => created_at.date_naive() == now.date_naive(),
            DateRange::Week => created_at >= now - Duration::days(7),
            DateRange::Month => created_at >= now - Duration::days(30),
            DateRange::All => true,
        }
    }
}

impl std::str::FromStr for DateRange {
    type Err = crate::error::PosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(DateRange::Today),
            "week" => Ok(DateRange::Week),
            "month" => Ok(DateRange::Month),
            "all" => Ok(DateRange::All),
            other => Err(crate::error::PosError::Validation(format!(
                "Unknown date range: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub total_orders: usize,
    pub revenue: f64,
    pub avg_order_value: f64,
    pub items_sold: u32,
    /// Paid revenue per `YYYY-MM-DD`.
    pub revenue_by_day: BTreeMap<String, f64>,
    /// Paid revenue per method; every method is present.
    pub payment_methods: BTreeMap<PaymentMethod, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Normal,
    Warning,
    Danger,
}

impl Urgency {
    fn for_minutes(minutes: i64) -> Self {
        if minutes > 20 {
            Urgency::Danger
        } else if minutes > 10 {
            Urgency::Warning
        } else {
            Urgency::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KitchenTicket {
    pub order: Order,
    pub elapsed: String,
    pub elapsed_minutes: i64,
    pub urgency: Urgency,
    /// Waiting more than 15 minutes.
    pub urgent: bool,
}

pub struct Reports<'a> {
    repo: &'a Repository,
}

impl<'a> Reports<'a> {
    pub(super) fn new(repo: &'a Repository) -> Self {
        Reports { repo }
    }

    pub fn today(&self) -> TodayStats {
        let now = self.repo.now();
        let orders: Vec<Order> = self
            .repo
            .orders()
            .list()
            .into_iter()
            .filter(|o| DateRange::Today.contains(o.created_at, now))
            .collect();
        let (revenue, avg_order_value) = paid_revenue(&orders);

        TodayStats {
            total_orders: orders.len(),
            active_orders: orders.iter().filter(|o| o.is_active()).count(),
            completed_orders: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Completed)
                .count(),
            revenue,
            avg_order_value,
        }
    }

    /// Items with stock at or below `threshold`, lowest first.
    pub fn low_stock(&self, threshold: u32) -> Vec<MenuItem> {
        let mut items: Vec<MenuItem> = self
            .repo
            .menu_items()
            .list()
            .into_iter()
            .filter(|i| i.stock <= threshold)
            .collect();
        items.sort_by_key(|i| i.stock);
        items
    }

    /// Catalog items ranked by quantity sold across every order. Ties keep
    /// catalog order.
    pub fn popular(&self, limit: usize) -> Vec<PopularItem> {
        let mut sold: HashMap<String, u32> = HashMap::new();
        for order in self.repo.orders().list() {
            for line in order.items {
                *sold.entry(line.id).or_default() += line.quantity;
            }
        }

        let mut ranked: Vec<PopularItem> = self
            .repo
            .menu_items()
            .list()
            .into_iter()
            .map(|item| PopularItem {
                order_count: sold.get(&item.id).copied().unwrap_or(0),
                item,
            })
            .collect();
        ranked.sort_by(|a, b| b.order_count.cmp(&a.order_count));
        ranked.truncate(limit);
        ranked
    }

    pub fn sales(&self, range: DateRange) -> SalesReport {
        let now = self.repo.now();
        let orders: Vec<Order> = self
            .repo
            .orders()
            .list()
            .into_iter()
            .filter(|o| range.contains(o.created_at, now))
            .collect();
        let (revenue, avg_order_value) = paid_revenue(&orders);

        let mut revenue_by_day: BTreeMap<String, f64> = BTreeMap::new();
        let mut payment_methods: BTreeMap<PaymentMethod, f64> =
            PaymentMethod::ALL.into_iter().map(|m| (m, 0.0)).collect();
        for order in orders.iter().filter(|o| o.payment_status == PaymentStatus::Paid) {
            let day = order.created_at.format("%Y-%m-%d").to_string();
            let entry = revenue_by_day.entry(day).or_default();
            *entry = round_money(*entry + order.total);

            if let Some(method) = order.payment_method {
                let entry = payment_methods.entry(method).or_default();
                *entry = round_money(*entry + order.total);
            }
        }

        SalesReport {
            total_orders: orders.len(),
            revenue,
            avg_order_value,
            items_sold: orders.iter().map(Order::item_count).sum(),
            revenue_by_day,
            payment_methods,
        }
    }

    /// Orders the kitchen is working on, with how long each has waited.
    pub fn kitchen_tickets(&self) -> Vec<KitchenTicket> {
        let now = self.repo.now();
        self.repo
            .orders()
            .kitchen_queue()
            .into_iter()
            .map(|order| {
                let minutes = (now - order.created_at).num_minutes();
                KitchenTicket {
                    elapsed: format_elapsed(order.created_at, now),
                    elapsed_minutes: minutes,
                    urgency: Urgency::for_minutes(minutes),
                    urgent: minutes > 15,
                    order,
                }
            })
            .collect()
    }

    /// Badge count for the orders view.
    pub fn active_order_count(&self) -> usize {
        self.repo.orders().active().len()
    }
}

/// Sum and mean of the paid orders' totals.
fn paid_revenue(orders: &[Order]) -> (f64, f64) {
    let paid: Vec<f64> = orders
        .iter()
        .filter(|o| o.payment_status == PaymentStatus::Paid)
        .map(|o| o.total)
        .collect();
    let revenue = round_money(paid.iter().sum());
    let avg = if paid.is_empty() {
        0.0
    } else {
        round_money(revenue / paid.len() as f64)
    };
    (revenue, avg)
}

/// `1h 5m`, `4m 30s` or `12s`.
pub fn format_elapsed(start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - start).num_seconds().max(0);
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
