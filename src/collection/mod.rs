//! The in-memory gallery of prompt records.

pub mod filters;
pub mod models;

use std::collections::HashSet;

use tracing::debug;

use crate::error::StoreError;

pub use filters::{CategoryFilter, FilterCategory, GalleryFilters};
pub use models::{parse_tag_list, PromptPatch, PromptRecord};

/// Newest-first list of prompt records.
#[derive(Debug, Clone, Default)]
pub struct PromptCollection {
    records: Vec<PromptRecord>,
}

impl PromptCollection {
    /// `records` are taken in display order (newest first).
    pub fn new(records: Vec<PromptRecord>) -> Result<Self, StoreError> {
        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.id.as_str()) {
                return Err(StoreError::DuplicateId(record.id.clone()));
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[PromptRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PromptRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut PromptRecord, StoreError> {
        self.records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| StoreError::RecordNotFound(id.to_string()))
    }

    pub fn add(&mut self, record: PromptRecord) -> Result<(), StoreError> {
        if self.get(&record.id).is_some() {
            return Err(StoreError::DuplicateId(record.id));
        }
        debug!("Adding prompt record {} ({})", record.id, record.title);
        self.records.insert(0, record);
        Ok(())
    }

    pub fn update(&mut self, id: &str, patch: PromptPatch) -> Result<&PromptRecord, StoreError> {
        let record = self.get_mut(id)?;
        patch.apply_to(record);
        Ok(record)
    }

    pub fn delete(&mut self, id: &str) -> Result<PromptRecord, StoreError> {
        let index = self
            .records
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| StoreError::RecordNotFound(id.to_string()))?;
        Ok(self.records.remove(index))
    }

    /// Flips the bookmark and returns the new value.
    pub fn toggle_bookmark(&mut self, id: &str) -> Result<bool, StoreError> {
        let record = self.get_mut(id)?;
        record.bookmarked = !record.bookmarked;
        Ok(record.bookmarked)
    }

    pub fn filter<'a>(
        &'a self,
        query: &'a str,
        category: &'a CategoryFilter,
    ) -> impl Iterator<Item = &'a PromptRecord> + 'a {
        self.records
            .iter()
            .filter(move |record| filters::matches(record, query, category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, text: &str, tags: &[&str]) -> PromptRecord {
        PromptRecord::new(title, text, "https://example.test/img.png", "tester")
            .with_tags(tags.iter().copied())
    }

    fn collection() -> PromptCollection {
        let mut collection = PromptCollection::default();
        collection
            .add(record("Forest spirit", "A mystical forest spirit", &["fantasy"]))
            .expect("add");
        collection
            .add(record("Neon Samurai", "Rainy city at night", &["scifi"]))
            .expect("add");
        collection
            .add(record("Alley", "wet pavement", &["CyberPunk", "neon"]))
            .expect("add");
        collection
    }

    fn titles<'a>(iter: impl Iterator<Item = &'a PromptRecord>) -> Vec<&'a str> {
        iter.map(|record| record.title.as_str()).collect()
    }

    #[test]
    fn add_prepends_and_rejects_duplicates() {
        let mut collection = collection();
        assert_eq!(collection.records()[0].title, "Alley");
        let duplicate = collection.records()[1].clone();
        assert!(matches!(
            collection.add(duplicate),
            Err(StoreError::DuplicateId(_))
        ));
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn query_matches_title_text_and_tags_case_insensitively() {
        let mut collection = collection();
        let id = collection.records()[1].id.clone();
        collection
            .update(
                &id,
                PromptPatch {
                    title: Some("CYBERPUNK samurai".into()),
                    ..PromptPatch::default()
                },
            )
            .expect("update");

        let all = CategoryFilter::All;
        assert_eq!(
            titles(collection.filter("cyberpunk", &all)),
            vec!["Alley", "CYBERPUNK samurai"]
        );
        assert_eq!(titles(collection.filter("MYSTICAL", &all)), vec!["Forest spirit"]);
        assert_eq!(collection.filter("", &all).count(), 3);
    }

    #[test]
    fn favorites_with_empty_query_is_the_bookmarked_subset() {
        let mut collection = collection();
        let id = collection.records()[2].id.clone();
        assert!(collection.toggle_bookmark(&id).expect("toggle"));

        let favorites = CategoryFilter::Favorites;
        assert_eq!(titles(collection.filter("", &favorites)), vec!["Forest spirit"]);
    }

    #[test]
    fn toggling_twice_restores_the_original_value() {
        let mut collection = collection();
        let id = collection.records()[0].id.clone();
        let original = collection.get(&id).expect("record").bookmarked;
        collection.toggle_bookmark(&id).expect("toggle");
        collection.toggle_bookmark(&id).expect("toggle");
        assert_eq!(collection.get(&id).expect("record").bookmarked, original);
        assert!(collection.toggle_bookmark("missing").is_err());
    }

    #[test]
    fn deleted_records_disappear_from_results() {
        let mut collection = collection();
        let id = collection.records()[0].id.clone();
        let removed = collection.delete(&id).expect("delete");
        assert_eq!(removed.title, "Alley");
        let all = CategoryFilter::All;
        assert!(!collection.filter("neon", &all).any(|record| record.id == id));
        assert!(!collection.filter("", &all).any(|record| record.id == id));
        assert_eq!(collection.filter("pavement", &all).count(), 0);
        assert_eq!(
            collection.delete(&id),
            Err(StoreError::RecordNotFound(id.clone()))
        );
    }

    #[test]
    fn update_keeps_id_and_created_at() {
        let mut collection = collection();
        let before = collection.records()[0].clone();
        let after = collection
            .update(
                &before.id,
                PromptPatch {
                    prompt_text: Some("dry pavement".into()),
                    tags: Some(parse_tag_list("a, b")),
                    ..PromptPatch::default()
                },
            )
            .expect("update")
            .clone();
        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.prompt_text, "dry pavement");
        assert_eq!(after.tags, vec!["a", "b"]);
        assert!(collection.update("missing", PromptPatch::default()).is_err());
    }

    #[test]
    fn rejects_duplicate_ids_on_construction() {
        let one = record("a", "b", &[]);
        assert!(PromptCollection::new(vec![one.clone(), one]).is_err());
    }
}
