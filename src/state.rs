use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::collection::{parse_tag_list, CategoryFilter, GalleryFilters, PromptCollection, PromptPatch, PromptRecord};
use crate::error::StoreError;
use crate::llm::{AnalysisBucket, AnalysisItem, EnhancedPrompt, PromptAnalysisResult};
use crate::options::OptionList;
use crate::seed;
use crate::taxonomy::{router, ModifierEntry, TaxonomyStore};

pub const UNTITLED_CREATION: &str = "Untitled Creation";
pub const LOCAL_AUTHOR: &str = "You";
pub const GENERATED_TAG: &str = "generated";

/// Everything a generation session produced, ready to be saved.
#[derive(Debug, Clone, Default)]
pub struct GenerationDraft {
    pub idea: String,
    pub style: String,
    pub aspect_ratio: String,
    pub enhanced: Option<EnhancedPrompt>,
    pub image_url: String,
    pub model_used: String,
}

/// Where an analysis item ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiledModifier {
    pub bucket: AnalysisBucket,
    pub category_id: String,
    /// `false` when the category came from the routing suggestion.
    pub chosen_by_caller: bool,
    pub modifier: ModifierEntry,
}

#[derive(Clone)]
pub struct AppState {
    pub prompts: Arc<Mutex<PromptCollection>>,
    pub taxonomy: Arc<Mutex<TaxonomyStore>>,
    pub gallery_filters: Arc<Mutex<GalleryFilters>>,
    pub styles: Arc<Mutex<OptionList>>,
    pub ratios: Arc<Mutex<OptionList>>,
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

impl AppState {
    pub fn new(
        prompts: PromptCollection,
        taxonomy: TaxonomyStore,
        gallery_filters: GalleryFilters,
        styles: OptionList,
        ratios: OptionList,
    ) -> Self {
        AppState {
            prompts: Arc::new(Mutex::new(prompts)),
            taxonomy: Arc::new(Mutex::new(taxonomy)),
            gallery_filters: Arc::new(Mutex::new(gallery_filters)),
            styles: Arc::new(Mutex::new(styles)),
            ratios: Arc::new(Mutex::new(ratios)),
        }
    }

    /// Session state populated with the built-in samples.
    pub fn seeded() -> Result<Self, StoreError> {
        Ok(Self::new(
            PromptCollection::new(seed::sample_prompts())?,
            TaxonomyStore::new(seed::taxonomy())?,
            seed::gallery_filters(),
            seed::default_styles(),
            seed::default_ratios(),
        ))
    }

    /// Saves a finished generation to the gallery and returns the new record.
    pub fn create_from_generation(&self, draft: GenerationDraft) -> Result<PromptRecord, StoreError> {
        let idea = draft.idea.trim();
        let title = non_blank(idea).unwrap_or(UNTITLED_CREATION);
        let (english, chinese) = match &draft.enhanced {
            Some(enhanced) => (
                non_blank(&enhanced.english_prompt).unwrap_or(idea),
                non_blank(&enhanced.chinese_translation).unwrap_or(idea),
            ),
            None => (idea, idea),
        };

        let record = PromptRecord::new(title, english, draft.image_url.as_str(), LOCAL_AUTHOR)
            .with_translation(chinese)
            .with_tags([draft.style.trim().to_lowercase(), GENERATED_TAG.to_string()])
            .with_model(draft.model_used.as_str())
            .with_aspect_ratio(draft.aspect_ratio.as_str());

        self.prompts.lock().add(record.clone())?;
        info!("Saved generation {} to the gallery", record.id);
        Ok(record)
    }

    /// Applies the edit form. `tags_csv` is the comma-separated tag field.
    pub fn edit_record(
        &self,
        id: &str,
        title: &str,
        prompt_text: &str,
        prompt_text_zh: &str,
        tags_csv: &str,
    ) -> Result<PromptRecord, StoreError> {
        let patch = PromptPatch {
            title: Some(title.trim().to_string()),
            prompt_text: Some(prompt_text.to_string()),
            prompt_text_zh: Some(prompt_text_zh.to_string()),
            tags: Some(parse_tag_list(tags_csv)),
            ..PromptPatch::default()
        };
        let mut prompts = self.prompts.lock();
        prompts.update(id, patch).cloned()
    }

    /// Files one decomposed item into the taxonomy, either into
    /// `override_category` or the routed suggestion for its bucket.
    pub fn file_analysis_item(
        &self,
        bucket: AnalysisBucket,
        item: &AnalysisItem,
        override_category: Option<&str>,
    ) -> Result<FiledModifier, StoreError> {
        let mut taxonomy = self.taxonomy.lock();
        let category_id =
            router::resolve_target(bucket.key(), override_category, taxonomy.categories())?
                .id
                .clone();
        let modifier = taxonomy.add_modifier(&category_id, &item.zh, &item.en)?;
        info!(
            "Filed '{}' from {} into category {}",
            modifier.en,
            bucket.key(),
            category_id
        );
        Ok(FiledModifier {
            bucket,
            category_id,
            chosen_by_caller: override_category.is_some_and(|id| !id.trim().is_empty()),
            modifier,
        })
    }

    /// Files every item of a decomposition. `targets` maps a bucket to the
    /// category the caller picked for it; the last entry for a bucket wins
    /// and unnamed buckets fall back to the routing suggestion.
    pub fn merge_analysis(
        &self,
        analysis: &PromptAnalysisResult,
        targets: &[(AnalysisBucket, String)],
    ) -> Result<Vec<FiledModifier>, StoreError> {
        {
            let taxonomy = self.taxonomy.lock();
            if let Some((_, missing)) = targets
                .iter()
                .find(|(_, category_id)| taxonomy.get(category_id.trim()).is_none())
            {
                return Err(StoreError::CategoryNotFound(missing.trim().to_string()));
            }
        }

        let mut filed = Vec::with_capacity(analysis.total_items());
        for (bucket, items) in analysis.iter() {
            let target = targets
                .iter()
                .rev()
                .find(|(candidate, _)| *candidate == bucket)
                .map(|(_, category_id)| category_id.as_str());
            for item in items {
                filed.push(self.file_analysis_item(bucket, item, target)?);
            }
        }
        Ok(filed)
    }

    pub fn filtered_prompts(&self, query: &str, category: &str) -> Vec<PromptRecord> {
        let filter = CategoryFilter::parse(category);
        let prompts = self.prompts.lock();
        prompts.filter(query, &filter).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::seeded().expect("seed data is valid")
    }

    #[test]
    fn generation_with_enhancement() {
        let state = state();
        let record = state
            .create_from_generation(GenerationDraft {
                idea: "  a cat in space ".into(),
                style: "Oil Painting".into(),
                aspect_ratio: "16:9".into(),
                enhanced: Some(EnhancedPrompt {
                    english_prompt: "An astronaut cat".into(),
                    chinese_translation: "宇航员猫".into(),
                }),
                image_url: "data:image/png;base64,AAAA".into(),
                model_used: "gemini-2.5-flash-image".into(),
            })
            .expect("create");

        assert_eq!(record.title, "a cat in space");
        assert_eq!(record.prompt_text, "An astronaut cat");
        assert_eq!(record.prompt_text_zh.as_deref(), Some("宇航员猫"));
        assert_eq!(record.tags, vec!["oil painting", GENERATED_TAG]);
        assert_eq!(record.author, LOCAL_AUTHOR);
        assert_eq!(record.likes, 0);
        assert_eq!(record.aspect_ratio.as_deref(), Some("16:9"));
        assert_eq!(state.prompts.lock().records()[0].id, record.id);
    }

    #[test]
    fn generation_without_idea_or_enhancement() {
        let state = state();
        let record = state
            .create_from_generation(GenerationDraft {
                style: "Sketch".into(),
                image_url: "img".into(),
                ..GenerationDraft::default()
            })
            .expect("create");
        assert_eq!(record.title, UNTITLED_CREATION);
        assert_eq!(record.prompt_text, "");
        assert!(record.prompt_text_zh.is_none());

        let plain = state
            .create_from_generation(GenerationDraft {
                idea: "lighthouse".into(),
                image_url: "img".into(),
                ..GenerationDraft::default()
            })
            .expect("create");
        assert_eq!(plain.prompt_text, "lighthouse");
        assert_eq!(plain.prompt_text_zh.as_deref(), Some("lighthouse"));
        assert_eq!(plain.tags, vec![GENERATED_TAG]);
    }

    #[test]
    fn edit_parses_tags() {
        let state = state();
        let record = state
            .edit_record("2", "Spirit", "forest", "森林", "fantasy, , magic,fantasy")
            .expect("edit");
        assert_eq!(record.tags, vec!["fantasy", "magic"]);
        assert_eq!(record.prompt_text_zh.as_deref(), Some("森林"));
        assert_eq!(
            state.edit_record("404", "x", "y", "z", ""),
            Err(StoreError::RecordNotFound("404".into()))
        );
    }

    #[test]
    fn analysis_items_follow_the_router_unless_overridden() {
        let state = state();
        let item = AnalysisItem {
            en: "Rim Light".into(),
            zh: "轮廓光".into(),
        };

        let routed = state
            .file_analysis_item(AnalysisBucket::Lighting, &item, None)
            .expect("file");
        assert_eq!(routed.category_id, "lighting");

        let unmapped = state
            .file_analysis_item(AnalysisBucket::Subject, &item, None)
            .expect("file");
        assert_eq!(unmapped.category_id, "aesthetics");

        let chosen = state
            .file_analysis_item(AnalysisBucket::Lighting, &item, Some("camera"))
            .expect("file");
        assert_eq!(chosen.category_id, "camera");

        assert_eq!(
            state.file_analysis_item(AnalysisBucket::Style, &item, Some("ghost")),
            Err(StoreError::CategoryNotFound("ghost".into()))
        );
    }

    #[test]
    fn merge_honors_caller_targets_per_bucket() {
        let state = state();
        let analysis = PromptAnalysisResult {
            artists: vec![AnalysisItem {
                en: "Moebius".into(),
                zh: "墨比斯".into(),
            }],
            lighting: vec![AnalysisItem {
                en: "Rim Light".into(),
                zh: "轮廓光".into(),
            }],
            ..PromptAnalysisResult::default()
        };

        let filed = state
            .merge_analysis(&analysis, &[(AnalysisBucket::Artists, "camera".into())])
            .expect("merge");
        assert_eq!(filed.len(), 2);
        let artists = filed
            .iter()
            .find(|entry| entry.bucket == AnalysisBucket::Artists)
            .expect("artists filed");
        assert_eq!(artists.category_id, "camera");
        assert!(artists.chosen_by_caller);
        let lighting = filed
            .iter()
            .find(|entry| entry.bucket == AnalysisBucket::Lighting)
            .expect("lighting filed");
        assert_eq!(lighting.category_id, "lighting");
        assert!(!lighting.chosen_by_caller);

        let taxonomy = state.taxonomy.lock();
        let camera = taxonomy.get("camera").expect("camera");
        assert!(camera.modifiers.iter().any(|m| m.en == "Moebius"));
        let aesthetics = taxonomy.get("aesthetics").expect("aesthetics");
        assert!(aesthetics.modifiers.iter().all(|m| m.en != "Moebius"));
    }

    #[test]
    fn merge_with_unknown_target_fails() {
        let state = state();
        let analysis = PromptAnalysisResult {
            subject: vec![AnalysisItem {
                en: "Knight".into(),
                zh: "骑士".into(),
            }],
            ..PromptAnalysisResult::default()
        };
        assert_eq!(
            state.merge_analysis(&analysis, &[(AnalysisBucket::Subject, "ghost".into())]),
            Err(StoreError::CategoryNotFound("ghost".into()))
        );
        let taxonomy = state.taxonomy.lock();
        assert!(taxonomy
            .categories()
            .iter()
            .all(|category| category.modifiers.iter().all(|m| m.en != "Knight")));
    }

    #[test]
    fn filing_fails_without_categories() {
        let state = AppState::new(
            PromptCollection::default(),
            TaxonomyStore::default(),
            seed::gallery_filters(),
            seed::default_styles(),
            seed::default_ratios(),
        );
        let item = AnalysisItem {
            en: "Bokeh".into(),
            zh: "散景".into(),
        };
        assert_eq!(
            state.file_analysis_item(AnalysisBucket::Camera, &item, None),
            Err(StoreError::NoTargetCategory)
        );
    }

    #[test]
    fn filtered_prompts_combine_query_and_category() {
        let state = state();
        let cyberpunk = state.filtered_prompts("cyberpunk", "all");
        assert_eq!(cyberpunk.len(), 1);
        assert_eq!(cyberpunk[0].id, "1");

        assert_eq!(state.filtered_prompts("", "3d").len(), 1);
        assert!(state.filtered_prompts("", "favorites").is_empty());
        assert_eq!(state.filtered_prompts("森林", "").len(), 1);
    }
}
