use serde::{Deserialize, Serialize};

use crate::collection::PromptRecord;
use crate::error::StoreError;

pub const ALL_CATEGORY: &str = "all";
pub const FAVORITES_CATEGORY: &str = "favorites";

/// Which records the gallery sidebar selection admits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Favorites,
    Tag(String),
}

impl CategoryFilter {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(ALL_CATEGORY) {
            Self::All
        } else if value.eq_ignore_ascii_case(FAVORITES_CATEGORY) {
            Self::Favorites
        } else {
            Self::Tag(value.to_string())
        }
    }

    fn admits(&self, record: &PromptRecord) -> bool {
        match self {
            Self::All => true,
            Self::Favorites => record.bookmarked,
            Self::Tag(tag) => record.tags.iter().any(|candidate| candidate == tag),
        }
    }
}

fn matches_query(record: &PromptRecord, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let lowered = query.to_lowercase();
    record.title.to_lowercase().contains(&lowered)
        || record.prompt_text.to_lowercase().contains(&lowered)
        || record
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(&lowered))
        // Chinese text has no case, so it is compared as typed.
        || record
            .prompt_text_zh
            .as_deref()
            .is_some_and(|zh| zh.contains(query))
}

/// A record is shown when it satisfies both the text query and the
/// sidebar category.
pub fn matches(record: &PromptRecord, query: &str, category: &CategoryFilter) -> bool {
    matches_query(record, query) && category.admits(record)
}

/// Sidebar entry of the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCategory {
    pub id: String,
    pub label: String,
    pub label_zh: String,
}

impl FilterCategory {
    pub fn new(id: &str, label: &str, label_zh: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            label_zh: label_zh.to_string(),
        }
    }

    pub fn is_protected(&self) -> bool {
        self.id == ALL_CATEGORY || self.id == FAVORITES_CATEGORY
    }

    pub fn filter(&self) -> CategoryFilter {
        CategoryFilter::parse(&self.id)
    }
}

/// Ordered sidebar entries. "all" and "favorites" cannot be removed.
#[derive(Debug, Clone, Default)]
pub struct GalleryFilters {
    entries: Vec<FilterCategory>,
}

impl GalleryFilters {
    pub fn new(entries: Vec<FilterCategory>) -> Self {
        let mut filters = Self::default();
        for entry in entries {
            filters.add(entry);
        }
        filters
    }

    pub fn entries(&self) -> &[FilterCategory] {
        &self.entries
    }

    /// Adds or relabels an entry. Returns `false` when the id was known.
    pub fn add(&mut self, entry: FilterCategory) -> bool {
        match self.entries.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => {
                *existing = entry;
                false
            }
            None => {
                self.entries.push(entry);
                true
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Result<FilterCategory, StoreError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| StoreError::CategoryNotFound(id.to_string()))?;
        if self.entries[index].is_protected() {
            return Err(StoreError::ProtectedCategory(id.to_string()));
        }
        Ok(self.entries.remove(index))
    }
}
