use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PosError, PosResult};
use crate::lifecycle::{OrderStatus, PaymentMethod, PaymentStatus};

pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";
pub const DEFAULT_CATEGORY_ICON: &str = "🍽️";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewCategory {
    pub name: String,
    pub icon: Option<String>,
}

impl NewCategory {
    pub fn validate(&self) -> PosResult<()> {
        require_name(Some(self.name.as_str()), "Category name")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub order: Option<u32>,
}

impl CategoryUpdate {
    pub fn validate(&self) -> PosResult<()> {
        require_name(self.name.as_deref(), "Category name")
    }

    pub fn apply_to(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name.trim().to_string();
        }
        if let Some(icon) = self.icon {
            category.icon = icon;
        }
        if let Some(order) = self.order {
            category.order = order;
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub category_id: String,
    pub stock: u32,
    #[serde(default)]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    pub name: String,
    pub price: f64,
    pub category_id: String,
    pub stock: u32,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl NewMenuItem {
    pub fn validate(&self) -> PosResult<()> {
        require_name(Some(self.name.as_str()), "Item name")?;
        require_price(self.price)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub category_id: Option<String>,
    pub stock: Option<u32>,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl MenuItemUpdate {
    pub fn validate(&self) -> PosResult<()> {
        require_name(self.name.as_deref(), "Item name")?;
        match self.price {
            Some(price) => require_price(price),
            None => Ok(()),
        }
    }

    pub fn apply_to(self, item: &mut MenuItem) {
        if let Some(name) = self.name {
            item.name = name.trim().to_string();
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(category_id) = self.category_id {
            item.category_id = category_id;
        }
        if let Some(stock) = self.stock {
            item.stock = stock;
        }
        if let Some(icon) = self.icon {
            item.icon = icon;
        }
        if self.image.is_some() {
            item.image = self.image;
        }
        if self.description.is_some() {
            item.description = self.description;
        }
    }
}

/// One line of a cart or a placed order. `id` is the menu item id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderLine {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub items: Vec<OrderLine>,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub customer_id: Option<String>,
    pub customer_name: String,
    #[serde(default)]
    pub wristband_id: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<OrderLine>,
    pub customer_name: Option<String>,
    pub customer_id: Option<String>,
    pub wristband_id: Option<String>,
    pub notes: Option<String>,
}

impl NewOrder {
    pub fn validate(&self) -> PosResult<()> {
        if self.items.is_empty() {
            return Err(PosError::Validation("Cart is empty".to_string()));
        }
        if let Some(line) = self.items.iter().find(|line| line.quantity == 0) {
            return Err(PosError::Validation(format!(
                "Quantity for {} must be at least 1",
                line.name
            )));
        }
        Ok(())
    }

    /// Trimmed customer name, or the walk-in placeholder when blank.
    pub fn resolved_customer_name(&self) -> String {
        self.customer_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(WALK_IN_CUSTOMER)
            .to_string()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    pub wristband_id: Option<String>,
}

impl OrderUpdate {
    pub fn apply_to(self, order: &mut Order) {
        if let Some(name) = self.customer_name {
            order.customer_name = name;
        }
        if let Some(notes) = self.notes {
            order.notes = notes;
        }
        // A blank id unassigns the wristband.
        if let Some(wristband_id) = self.wristband_id {
            order.wristband_id = Some(wristband_id).filter(|w| !w.trim().is_empty());
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub total_orders: u32,
    #[serde(default)]
    pub total_spent: f64,
    #[serde(default)]
    pub last_visit: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NewCustomer {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

impl NewCustomer {
    pub fn validate(&self) -> PosResult<()> {
        require_name(Some(self.name.as_str()), "Customer name")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

impl CustomerUpdate {
    pub fn validate(&self) -> PosResult<()> {
        require_name(self.name.as_deref(), "Customer name")
    }

    pub fn apply_to(self, customer: &mut Customer) {
        if let Some(name) = self.name {
            customer.name = name.trim().to_string();
        }
        if let Some(phone) = self.phone {
            customer.phone = phone;
        }
        if let Some(email) = self.email {
            customer.email = email;
        }
        if let Some(notes) = self.notes {
            customer.notes = notes;
        }
    }
}

fn require_name(name: Option<&str>, label: &str) -> PosResult<()> {
    match name {
        Some(name) if name.trim().is_empty() => {
            Err(PosError::Validation(format!("{} is required", label)))
        }
        _ => Ok(()),
    }
}

fn require_price(price: f64) -> PosResult<()> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(PosError::Validation(format!(
            "Price must be greater than zero, got {}",
            price
        )))
    }
}
