use crate::db::{generate_id, Collection};
use crate::error::PosResult;
use crate::models::{Category, CategoryUpdate, NewCategory, DEFAULT_CATEGORY_ICON};
use crate::repository::Repository;

pub struct Categories<'a> {
    repo: &'a Repository,
}

impl<'a> Categories<'a> {
    pub(super) fn new(repo: &'a Repository) -> Self {
        Categories { repo }
    }

    pub fn list(&self) -> Vec<Category> {
        self.repo.load_collection(Collection::Categories)
    }

    pub fn get(&self, id: &str) -> Option<Category> {
        self.list().into_iter().find(|c| c.id == id)
    }

    pub fn add(&self, category: NewCategory) -> PosResult<Category> {
        category.validate()?;
        let _guard = self.repo.lock_writes();

        let mut categories: Vec<Category> = self.repo.read_collection(Collection::Categories)?;
        let created = Category {
            id: generate_id("cat"),
            name: category.name.trim().to_string(),
            icon: category
                .icon
                .unwrap_or_else(|| DEFAULT_CATEGORY_ICON.to_string()),
            order: categories.len() as u32 + 1,
        };
        categories.push(created.clone());
        self.repo.save_collection(Collection::Categories, &categories)?;

        tracing::info!(id = %created.id, name = %created.name, "category added");
        Ok(created)
    }

    pub fn update(&self, id: &str, update: CategoryUpdate) -> PosResult<Option<Category>> {
        update.validate()?;
        let _guard = self.repo.lock_writes();

        let mut categories: Vec<Category> = self.repo.read_collection(Collection::Categories)?;
        let Some(category) = categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        update.apply_to(category);
        let updated = category.clone();
        self.repo.save_collection(Collection::Categories, &categories)?;

        Ok(Some(updated))
    }

    /// Menu items pointing at the category are left as they are.
    pub fn delete(&self, id: &str) -> PosResult<()> {
        let _guard = self.repo.lock_writes();

        let mut categories: Vec<Category> = self.repo.read_collection(Collection::Categories)?;
        categories.retain(|c| c.id != id);
        self.repo.save_collection(Collection::Categories, &categories)
    }
}
