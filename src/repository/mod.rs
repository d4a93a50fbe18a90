//! Domain repository: CRUD and business rules over the stored collections.

mod categories;
mod customers;
mod menu_items;
mod orders;
mod reports;
mod seed;

pub use categories::Categories;
pub use customers::Customers;
pub use menu_items::MenuItems;
pub use orders::Orders;
pub use reports::{
    format_elapsed, DateRange, KitchenTicket, PopularItem, Reports, SalesReport, TodayStats,
    Urgency,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::Clock;
use crate::db::{Collection, Store};
use crate::error::PosResult;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepositoryOptions {
    pub tax_rate: f64,
    /// Return an order's quantities to stock when it is cancelled.
    pub restore_stock_on_cancel: bool,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        RepositoryOptions {
            tax_rate: crate::config::DEFAULT_TAX_RATE,
            restore_stock_on_cancel: false,
        }
    }
}

/// Owns every entity collection. Callers get snapshots; mutations go
/// back through the write operations of the sub-APIs.
pub struct Repository {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    options: RepositoryOptions,
    write_lock: Mutex<()>,
}

impl Repository {
    pub fn new(store: Arc<Store>, clock: Arc<dyn Clock>, options: RepositoryOptions) -> Self {
        Repository {
            store,
            clock,
            options,
            write_lock: Mutex::new(()),
        }
    }

    /// Seed the default catalog and empty collections on first run.
    pub fn init(&self) -> PosResult<()> {
        let _guard = self.lock_writes();

        if !self.store.contains(Collection::Categories.key()) {
            self.save_collection(Collection::Categories, &seed::categories())?;
            tracing::info!("seeded default categories");
        }
        if !self.store.contains(Collection::MenuItems.key()) {
            self.save_collection(Collection::MenuItems, &seed::menu_items(self.now()))?;
            tracing::info!("seeded default menu items");
        }
        for collection in [Collection::Orders, Collection::Customers] {
            if !self.store.contains(collection.key()) {
                self.store.write(collection.key(), &Vec::<()>::new())?;
            }
        }

        Ok(())
    }

    pub fn categories(&self) -> Categories<'_> {
        Categories::new(self)
    }

    pub fn menu_items(&self) -> MenuItems<'_> {
        MenuItems::new(self)
    }

    pub fn orders(&self) -> Orders<'_> {
        Orders::new(self)
    }

    pub fn customers(&self) -> Customers<'_> {
        Customers::new(self)
    }

    pub fn reports(&self) -> Reports<'_> {
        Reports::new(self)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn options(&self) -> RepositoryOptions {
        self.options
    }

    pub(crate) fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Serializes load-mutate-save sequences within the process.
    pub(crate) fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn load_collection<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        self.store.load(collection.key(), Vec::new())
    }

    /// Read for a load-mutate-save. Unlike `load_collection`, a value that
    /// does not decode is an error, so it is never overwritten.
    pub(crate) fn read_collection<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> PosResult<Vec<T>> {
        match self.store.read(collection.key()) {
            Ok(records) => Ok(records.unwrap_or_default()),
            Err(e) => {
                tracing::error!(collection = collection.name(), error = %e, "stored collection is unreadable");
                Err(e.into())
            }
        }
    }

    pub(crate) fn save_collection<T: Serialize>(
        &self,
        collection: Collection,
        records: &[T],
    ) -> PosResult<()> {
        self.store.write(collection.key(), records).map_err(|e| {
            tracing::error!(collection = collection.name(), error = %e, "failed to persist collection");
            e.into()
        })
    }
}
