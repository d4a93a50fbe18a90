use chrono::{DateTime, Utc};

use crate::db::{generate_id, Collection};
use crate::error::PosResult;
use crate::lifecycle::round_money;
use crate::models::{Customer, CustomerUpdate, NewCustomer, Order};
use crate::repository::Repository;

pub struct Customers<'a> {
    repo: &'a Repository,
}

impl<'a> Customers<'a> {
    pub(super) fn new(repo: &'a Repository) -> Self {
        Customers { repo }
    }

    pub fn list(&self) -> Vec<Customer> {
        self.repo.load_collection(Collection::Customers)
    }

    pub fn get(&self, id: &str) -> Option<Customer> {
        self.list().into_iter().find(|c| c.id == id)
    }

    /// Case-insensitive lookup on the trimmed name.
    pub fn find_by_name(&self, name: &str) -> Option<Customer> {
        let wanted = normalize_name(name);
        self.list()
            .into_iter()
            .find(|c| normalize_name(&c.name) == wanted)
    }

    pub fn add(&self, customer: NewCustomer) -> PosResult<Customer> {
        customer.validate()?;
        let _guard = self.repo.lock_writes();

        let mut customers: Vec<Customer> = self.repo.read_collection(Collection::Customers)?;
        let created = Customer {
            id: generate_id("cust"),
            name: customer.name.trim().to_string(),
            phone: customer.phone.unwrap_or_default(),
            email: customer.email.unwrap_or_default(),
            notes: customer.notes.unwrap_or_default(),
            total_orders: 0,
            total_spent: 0.0,
            last_visit: None,
            created_at: self.repo.now(),
        };
        customers.push(created.clone());
        self.repo.save_collection(Collection::Customers, &customers)?;

        tracing::info!(id = %created.id, "customer added");
        Ok(created)
    }

    pub fn update(&self, id: &str, update: CustomerUpdate) -> PosResult<Option<Customer>> {
        update.validate()?;
        let _guard = self.repo.lock_writes();

        let mut customers: Vec<Customer> = self.repo.read_collection(Collection::Customers)?;
        let Some(customer) = customers.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        update.apply_to(customer);
        let updated = customer.clone();
        self.repo.save_collection(Collection::Customers, &customers)?;

        Ok(Some(updated))
    }

    /// Orders keep their `customer_id` after the customer is gone.
    pub fn delete(&self, id: &str) -> PosResult<()> {
        let _guard = self.repo.lock_writes();

        let mut customers: Vec<Customer> = self.repo.read_collection(Collection::Customers)?;
        customers.retain(|c| c.id != id);
        self.repo.save_collection(Collection::Customers, &customers)
    }

    pub fn orders_for(&self, customer_id: &str) -> Vec<Order> {
        self.repo
            .orders()
            .list()
            .into_iter()
            .filter(|o| o.customer_id.as_deref() == Some(customer_id))
            .collect()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Find the customer by name or create one, counting one more visit of
/// `order_total`. Returns the customer id.
pub(crate) fn record_visit(
    customers: &mut Vec<Customer>,
    name: &str,
    order_total: f64,
    at: DateTime<Utc>,
) -> String {
    let wanted = normalize_name(name);

    if let Some(existing) = customers
        .iter_mut()
        .find(|c| normalize_name(&c.name) == wanted)
    {
        existing.total_orders += 1;
        existing.total_spent = round_money(existing.total_spent + order_total);
        existing.last_visit = Some(at);
        return existing.id.clone();
    }

    let created = Customer {
        id: generate_id("cust"),
        name: name.trim().to_string(),
        phone: String::new(),
        email: String::new(),
        notes: String::new(),
        total_orders: 1,
        total_spent: order_total,
        last_visit: Some(at),
        created_at: at,
    };
    let id = created.id.clone();
    customers.push(created);
    tracing::info!(id = %id, "customer created from order");
    id
}
