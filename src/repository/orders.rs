use serde::Serialize;
use serde_json::Value;

use crate::db::{generate_id, Collection};
use crate::error::{PosError, PosResult};
use crate::lifecycle::{
    check_transition, next_order_number, OrderStatus, PaymentMethod, PaymentStatus, Totals,
};
use crate::models::{Customer, MenuItem, NewOrder, Order, OrderUpdate, WALK_IN_CUSTOMER};
use crate::repository::customers::record_visit;
use crate::repository::menu_items::apply_stock_delta;
use crate::repository::Repository;

pub struct Orders<'a> {
    repo: &'a Repository,
}

impl<'a> Orders<'a> {
    pub(super) fn new(repo: &'a Repository) -> Self {
        Orders { repo }
    }

    /// Most recent first.
    pub fn list(&self) -> Vec<Order> {
        self.repo.load_collection(Collection::Orders)
    }

    pub fn get(&self, id: &str) -> Option<Order> {
        self.list().into_iter().find(|o| o.id == id)
    }

    pub fn by_status(&self, status: OrderStatus) -> Vec<Order> {
        self.filtered(|o| o.status == status)
    }

    /// Neither completed nor cancelled.
    pub fn active(&self) -> Vec<Order> {
        self.filtered(Order::is_active)
    }

    /// Everything except cancelled orders.
    pub fn visible(&self) -> Vec<Order> {
        self.filtered(|o| o.status != OrderStatus::Cancelled)
    }

    /// Pending or preparing, in list order.
    pub fn kitchen_queue(&self) -> Vec<Order> {
        self.filtered(|o| o.status.in_kitchen())
    }

    fn filtered(&self, keep: impl Fn(&Order) -> bool) -> Vec<Order> {
        self.list().into_iter().filter(|o| keep(o)).collect()
    }

    /// Place an order: record the customer visit, number the order,
    /// take its quantities out of stock and store it as pending/unpaid.
    ///
    /// Stock is not checked against the cart; decrements stop at zero.
    pub fn create(&self, new_order: NewOrder) -> PosResult<Order> {
        new_order.validate()?;
        let _guard = self.repo.lock_writes();

        let now = self.repo.now();
        let totals = Totals::for_lines(&new_order.items, self.repo.options().tax_rate);
        let customer_name = new_order.resolved_customer_name();

        let mut customers: Vec<Customer> = self.repo.read_collection(Collection::Customers)?;
        let mut customer_id = new_order.customer_id.clone();
        if customer_name != WALK_IN_CUSTOMER {
            customer_id = Some(record_visit(
                &mut customers,
                &customer_name,
                totals.total,
                now,
            ));
        }

        let mut orders: Vec<Order> = self.repo.read_collection(Collection::Orders)?;
        let order = Order {
            id: generate_id("order"),
            order_number: next_order_number(&orders, now),
            items: new_order.items,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            status: OrderStatus::Pending,
            customer_id,
            customer_name,
            wristband_id: new_order.wristband_id.filter(|w| !w.trim().is_empty()),
            payment_method: None,
            payment_status: PaymentStatus::Unpaid,
            paid_at: None,
            notes: new_order.notes.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        let mut menu_items: Vec<MenuItem> = self.repo.read_collection(Collection::MenuItems)?;
        for line in &order.items {
            if apply_stock_delta(&mut menu_items, &line.id, -i64::from(line.quantity)).is_none() {
                tracing::warn!(item = %line.id, "ordered item is not in the catalog");
            }
        }

        orders.insert(0, order.clone());

        self.repo.store().write_batch(&[
            batch_entry(Collection::Customers, &customers)?,
            batch_entry(Collection::MenuItems, &menu_items)?,
            batch_entry(Collection::Orders, &orders)?,
        ])?;

        tracing::info!(
            id = %order.id,
            number = %order.order_number,
            total = order.total,
            lines = order.items.len(),
            "order created"
        );
        Ok(order)
    }

    pub fn update(&self, id: &str, update: OrderUpdate) -> PosResult<Option<Order>> {
        self.modify(id, |order| {
            update.apply_to(order);
            Ok(())
        })
    }

    pub fn delete(&self, id: &str) -> PosResult<()> {
        let _guard = self.repo.lock_writes();

        let mut orders: Vec<Order> = self.repo.read_collection(Collection::Orders)?;
        orders.retain(|o| o.id != id);
        self.repo.save_collection(Collection::Orders, &orders)
    }

    /// Move the order along the state machine. Illegal moves are rejected
    /// with `PosError::IllegalTransition`; `Ok(None)` means no such order.
    pub fn update_status(&self, id: &str, status: OrderStatus) -> PosResult<Option<Order>> {
        let _guard = self.repo.lock_writes();

        let mut orders: Vec<Order> = self.repo.read_collection(Collection::Orders)?;
        let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        let from = order.status;
        check_transition(from, status)?;
        order.status = status;
        order.updated_at = self.repo.now();
        let updated = order.clone();

        if status == OrderStatus::Cancelled && self.repo.options().restore_stock_on_cancel {
            let mut menu_items: Vec<MenuItem> = self.repo.read_collection(Collection::MenuItems)?;
            for line in &updated.items {
                apply_stock_delta(&mut menu_items, &line.id, i64::from(line.quantity));
            }
            self.repo.store().write_batch(&[
                batch_entry(Collection::MenuItems, &menu_items)?,
                batch_entry(Collection::Orders, &orders)?,
            ])?;
        } else {
            self.repo.save_collection(Collection::Orders, &orders)?;
        }

        tracing::info!(id, %from, to = %status, "order status changed");
        Ok(Some(updated))
    }

    pub fn cancel(&self, id: &str) -> PosResult<Option<Order>> {
        self.update_status(id, OrderStatus::Cancelled)
    }

    /// Mark the order paid. Status is left alone; callers complete the
    /// order with a separate `update_status`.
    pub fn complete_payment(&self, id: &str, method: PaymentMethod) -> PosResult<Option<Order>> {
        let paid_at = self.repo.now();
        let paid = self.modify(id, |order| {
            order.payment_method = Some(method);
            order.payment_status = PaymentStatus::Paid;
            order.paid_at = Some(paid_at);
            Ok(())
        })?;

        if paid.is_some() {
            tracing::info!(id, %method, "payment completed");
        }
        Ok(paid)
    }

    fn modify(
        &self,
        id: &str,
        change: impl FnOnce(&mut Order) -> PosResult<()>,
    ) -> PosResult<Option<Order>> {
        let _guard = self.repo.lock_writes();

        let mut orders: Vec<Order> = self.repo.read_collection(Collection::Orders)?;
        let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        change(order)?;
        order.updated_at = self.repo.now();
        let updated = order.clone();
        self.repo.save_collection(Collection::Orders, &orders)?;

        Ok(Some(updated))
    }
}

fn batch_entry<T: Serialize>(
    collection: Collection,
    records: &[T],
) -> PosResult<(&'static str, Value)> {
    let value = serde_json::to_value(records).map_err(|e| PosError::Storage(e.into()))?;
    Ok((collection.key(), value))
}
