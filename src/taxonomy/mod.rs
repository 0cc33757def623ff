//! The user's dictionary of reusable bilingual prompt modifiers.

pub mod router;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::utils::ids::next_id;

pub const DEFAULT_CATEGORY_NAME: &str = "New Folder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierEntry {
    pub id: String,
    pub zh: String,
    pub en: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub modifiers: Vec<ModifierEntry>,
}

impl Category {
    pub fn modifier(&self, modifier_id: &str) -> Option<&ModifierEntry> {
        self.modifiers.iter().find(|entry| entry.id == modifier_id)
    }
}

/// Ordered category list with copy-on-write updates: every mutation swaps in
/// a new `Arc`, so a snapshot handed out earlier never changes underneath
/// its holder.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyStore {
    categories: Arc<Vec<Category>>,
}

fn fresh_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = next_id();
        if !taken(&id) {
            return id;
        }
    }
}

fn required(value: &str, field: &'static str) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::BlankField(field));
    }
    Ok(trimmed.to_string())
}

impl TaxonomyStore {
    pub fn new(categories: Vec<Category>) -> Result<Self, StoreError> {
        let mut seen = HashSet::new();
        for category in &categories {
            if !seen.insert(category.id.as_str()) {
                return Err(StoreError::DuplicateId(category.id.clone()));
            }
        }
        Ok(Self {
            categories: Arc::new(categories),
        })
    }

    pub fn snapshot(&self) -> Arc<Vec<Category>> {
        Arc::clone(&self.categories)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    fn position(&self, id: &str) -> Result<usize, StoreError> {
        self.categories
            .iter()
            .position(|category| category.id == id)
            .ok_or_else(|| StoreError::CategoryNotFound(id.to_string()))
    }

    fn replace(&mut self, next: Vec<Category>) {
        self.categories = Arc::new(next);
    }

    /// Appends an empty category. A blank name becomes "New Folder".
    pub fn create_category(&mut self, name: &str) -> Category {
        let name = match name.trim() {
            "" => DEFAULT_CATEGORY_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        let id = fresh_id(|candidate| self.get(candidate).is_some());
        let category = Category {
            id,
            name,
            modifiers: Vec::new(),
        };

        let mut next = (*self.categories).clone();
        next.push(category.clone());
        self.replace(next);
        debug!("Created category {} ({})", category.id, category.name);
        category
    }

    pub fn rename_category(&mut self, id: &str, new_name: &str) -> Result<(), StoreError> {
        let new_name = required(new_name, "category name")?;
        let index = self.position(id)?;
        let mut next = (*self.categories).clone();
        next[index].name = new_name;
        self.replace(next);
        Ok(())
    }

    /// Removes the category together with every modifier it owns.
    pub fn delete_category(&mut self, id: &str) -> Result<Category, StoreError> {
        let index = self.position(id)?;
        let mut next = (*self.categories).clone();
        let removed = next.remove(index);
        self.replace(next);
        debug!(
            "Deleted category {} with {} modifier(s)",
            removed.id,
            removed.modifiers.len()
        );
        Ok(removed)
    }

    pub fn add_modifier(
        &mut self,
        category_id: &str,
        zh: &str,
        en: &str,
    ) -> Result<ModifierEntry, StoreError> {
        let zh = required(zh, "Chinese keyword")?;
        let en = required(en, "English keyword")?;
        let index = self.position(category_id)?;

        let mut next = (*self.categories).clone();
        let category = &mut next[index];
        let id = fresh_id(|candidate| category.modifier(candidate).is_some());
        let entry = ModifierEntry { id, zh, en };
        category.modifiers.push(entry.clone());
        self.replace(next);
        Ok(entry)
    }

    pub fn remove_modifier(
        &mut self,
        category_id: &str,
        modifier_id: &str,
    ) -> Result<ModifierEntry, StoreError> {
        let index = self.position(category_id)?;
        let mut next = (*self.categories).clone();
        let modifiers = &mut next[index].modifiers;
        let position = modifiers
            .iter()
            .position(|entry| entry.id == modifier_id)
            .ok_or_else(|| StoreError::ModifierNotFound {
                category_id: category_id.to_string(),
                modifier_id: modifier_id.to_string(),
            })?;
        let removed = modifiers.remove(position);
        self.replace(next);
        Ok(removed)
    }
}
