use crate::error::StoreError;
use crate::taxonomy::Category;

/// Analysis bucket name -> fragment of the taxonomy category id it usually
/// belongs to.
const BUCKET_CATEGORY_HINTS: [(&str, &str); 4] = [
    ("style", "aesthetics"),
    ("lighting", "lighting"),
    ("camera", "camera"),
    ("composition", "composition"),
];

fn hint_for_bucket(bucket: &str) -> Option<&'static str> {
    let bucket = bucket.trim();
    BUCKET_CATEGORY_HINTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(bucket))
        .map(|(_, fragment)| *fragment)
}

/// Default target category for an item extracted from `bucket`.
///
/// Mapped buckets prefer a category whose id equals the hint, then one whose
/// id contains it. Everything else falls back to the first category; `None`
/// only when there are no categories at all. This is a suggestion: nothing
/// is written here.
pub fn suggest_category<'a>(bucket: &str, categories: &'a [Category]) -> Option<&'a Category> {
    if let Some(fragment) = hint_for_bucket(bucket) {
        let exact = categories
            .iter()
            .find(|category| category.id.eq_ignore_ascii_case(fragment));
        let partial = || {
            categories
                .iter()
                .find(|category| category.id.to_ascii_lowercase().contains(fragment))
        };
        if let Some(category) = exact.or_else(partial) {
            return Some(category);
        }
    }
    categories.first()
}

/// Picks the category an item is finally filed into: the caller's explicit
/// choice when given (it must exist), otherwise the suggestion.
pub fn resolve_target<'a>(
    bucket: &str,
    override_id: Option<&str>,
    categories: &'a [Category],
) -> Result<&'a Category, StoreError> {
    match override_id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => categories
            .iter()
            .find(|category| category.id == id)
            .ok_or_else(|| StoreError::CategoryNotFound(id.to_string())),
        None => suggest_category(bucket, categories).ok_or(StoreError::NoTargetCategory),
    }
}
