use crate::db::{generate_id, Collection};
use crate::error::{PosError, PosResult};
use crate::models::{MenuItem, MenuItemUpdate, NewMenuItem};
use crate::repository::Repository;

pub struct MenuItems<'a> {
    repo: &'a Repository,
}

impl<'a> MenuItems<'a> {
    pub(super) fn new(repo: &'a Repository) -> Self {
        MenuItems { repo }
    }

    pub fn list(&self) -> Vec<MenuItem> {
        self.repo.load_collection(Collection::MenuItems)
    }

    pub fn get(&self, id: &str) -> Option<MenuItem> {
        self.list().into_iter().find(|i| i.id == id)
    }

    pub fn by_category(&self, category_id: &str) -> Vec<MenuItem> {
        self.list()
            .into_iter()
            .filter(|i| i.category_id == category_id)
            .collect()
    }

    pub fn add(&self, item: NewMenuItem) -> PosResult<MenuItem> {
        item.validate()?;
        let _guard = self.repo.lock_writes();

        let mut items: Vec<MenuItem> = self.repo.read_collection(Collection::MenuItems)?;
        let created = MenuItem {
            id: generate_id("item"),
            name: item.name.trim().to_string(),
            price: item.price,
            category_id: item.category_id,
            stock: item.stock,
            icon: item.icon.unwrap_or_default(),
            image: item.image,
            description: item.description,
            created_at: Some(self.repo.now()),
            updated_at: None,
        };
        items.push(created.clone());
        self.repo.save_collection(Collection::MenuItems, &items)?;

        tracing::info!(id = %created.id, name = %created.name, "menu item added");
        Ok(created)
    }

    /// The category is not checked for existence.
    pub fn update(&self, id: &str, update: MenuItemUpdate) -> PosResult<Option<MenuItem>> {
        update.validate()?;
        let _guard = self.repo.lock_writes();

        let mut items: Vec<MenuItem> = self.repo.read_collection(Collection::MenuItems)?;
        let Some(item) = items.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        update.apply_to(item);
        item.updated_at = Some(self.repo.now());
        let updated = item.clone();
        self.repo.save_collection(Collection::MenuItems, &items)?;

        Ok(Some(updated))
    }

    pub fn delete(&self, id: &str) -> PosResult<()> {
        let _guard = self.repo.lock_writes();

        let mut items: Vec<MenuItem> = self.repo.read_collection(Collection::MenuItems)?;
        items.retain(|i| i.id != id);
        self.repo.save_collection(Collection::MenuItems, &items)
    }

    /// Add `delta` (possibly negative) to the stock, never going below zero.
    pub fn adjust_stock(&self, id: &str, delta: i64) -> PosResult<Option<MenuItem>> {
        let _guard = self.repo.lock_writes();

        let mut items: Vec<MenuItem> = self.repo.read_collection(Collection::MenuItems)?;
        let adjusted = apply_stock_delta(&mut items, id, delta).cloned();
        if adjusted.is_some() {
            self.repo.save_collection(Collection::MenuItems, &items)?;
        }

        Ok(adjusted)
    }

    pub fn restock(&self, id: &str, quantity: u32) -> PosResult<Option<MenuItem>> {
        if quantity == 0 {
            return Err(PosError::Validation(
                "Restock quantity must be at least 1".to_string(),
            ));
        }
        let restocked = self.adjust_stock(id, i64::from(quantity))?;
        if let Some(item) = &restocked {
            tracing::info!(id, quantity, stock = item.stock, "item restocked");
        }
        Ok(restocked)
    }

    /// Restock every item at or below `threshold`; returns how many were touched.
    pub fn restock_low_stock(&self, threshold: u32, quantity: u32) -> PosResult<usize> {
        if quantity == 0 {
            return Err(PosError::Validation(
                "Restock quantity must be at least 1".to_string(),
            ));
        }
        let _guard = self.repo.lock_writes();

        let mut items: Vec<MenuItem> = self.repo.read_collection(Collection::MenuItems)?;
        let mut touched = 0;
        for item in items.iter_mut().filter(|i| i.stock <= threshold) {
            item.stock = item.stock.saturating_add(quantity);
            touched += 1;
        }
        if touched > 0 {
            self.repo.save_collection(Collection::MenuItems, &items)?;
        }

        tracing::info!(touched, quantity, "bulk restock");
        Ok(touched)
    }
}

/// Clamped stock change on an in-memory catalog.
pub(crate) fn apply_stock_delta<'i>(
    items: &'i mut [MenuItem],
    id: &str,
    delta: i64,
) -> Option<&'i MenuItem> {
    let item = items.iter_mut().find(|i| i.id == id)?;
    let next = (i64::from(item.stock) + delta).clamp(0, i64::from(u32::MAX));
    item.stock = next as u32;
    Some(&*item)
}
