use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of enhance-and-translate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedPrompt {
    pub english_prompt: String,
    pub chinese_translation: String,
}

/// Bilingual cinematic narrative produced by reverse-describe-image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescription {
    pub en: String,
    pub zh: String,
}

impl ImageDescription {
    pub fn paragraphs_en(&self) -> impl Iterator<Item = &str> {
        split_paragraphs(&self.en)
    }

    pub fn paragraphs_zh(&self) -> impl Iterator<Item = &str> {
        split_paragraphs(&self.zh)
    }
}

fn split_paragraphs(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n").map(str::trim).filter(|p| !p.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisItem {
    pub en: String,
    pub zh: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisBucket {
    Subject,
    Style,
    Medium,
    Lighting,
    Camera,
    Artists,
    ColorPalette,
    AdditionalDetails,
}

impl AnalysisBucket {
    pub const ALL: [AnalysisBucket; 8] = [
        AnalysisBucket::Subject,
        AnalysisBucket::Style,
        AnalysisBucket::Medium,
        AnalysisBucket::Lighting,
        AnalysisBucket::Camera,
        AnalysisBucket::Artists,
        AnalysisBucket::ColorPalette,
        AnalysisBucket::AdditionalDetails,
    ];

    /// Wire key used in the response schema.
    pub fn key(self) -> &'static str {
        match self {
            AnalysisBucket::Subject => "subject",
            AnalysisBucket::Style => "style",
            AnalysisBucket::Medium => "medium",
            AnalysisBucket::Lighting => "lighting",
            AnalysisBucket::Camera => "camera",
            AnalysisBucket::Artists => "artists",
            AnalysisBucket::ColorPalette => "colorPalette",
            AnalysisBucket::AdditionalDetails => "additionalDetails",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AnalysisBucket::Subject => "Main subjects of the image",
            AnalysisBucket::Style => "Artistic styles (e.g., Cyberpunk, Oil Painting)",
            AnalysisBucket::Medium => "Art medium (e.g., Digital Illustration, Photo)",
            AnalysisBucket::Lighting => "Lighting conditions",
            AnalysisBucket::Camera => "Camera settings, angles, or lenses",
            AnalysisBucket::Artists => "Artists referenced",
            AnalysisBucket::ColorPalette => "Main colors",
            AnalysisBucket::AdditionalDetails => "Other descriptors",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.key() == key)
    }
}

/// Eight fixed buckets of bilingual keywords extracted from a prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptAnalysisResult {
    pub subject: Vec<AnalysisItem>,
    pub style: Vec<AnalysisItem>,
    pub medium: Vec<AnalysisItem>,
    pub lighting: Vec<AnalysisItem>,
    pub camera: Vec<AnalysisItem>,
    pub artists: Vec<AnalysisItem>,
    pub color_palette: Vec<AnalysisItem>,
    pub additional_details: Vec<AnalysisItem>,
}

impl PromptAnalysisResult {
    pub fn bucket(&self, bucket: AnalysisBucket) -> &[AnalysisItem] {
        match bucket {
            AnalysisBucket::Subject => &self.subject,
            AnalysisBucket::Style => &self.style,
            AnalysisBucket::Medium => &self.medium,
            AnalysisBucket::Lighting => &self.lighting,
            AnalysisBucket::Camera => &self.camera,
            AnalysisBucket::Artists => &self.artists,
            AnalysisBucket::ColorPalette => &self.color_palette,
            AnalysisBucket::AdditionalDetails => &self.additional_details,
        }
    }

    fn bucket_mut(&mut self, bucket: AnalysisBucket) -> &mut Vec<AnalysisItem> {
        match bucket {
            AnalysisBucket::Subject => &mut self.subject,
            AnalysisBucket::Style => &mut self.style,
            AnalysisBucket::Medium => &mut self.medium,
            AnalysisBucket::Lighting => &mut self.lighting,
            AnalysisBucket::Camera => &mut self.camera,
            AnalysisBucket::Artists => &mut self.artists,
            AnalysisBucket::ColorPalette => &mut self.color_palette,
            AnalysisBucket::AdditionalDetails => &mut self.additional_details,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnalysisBucket, &[AnalysisItem])> {
        AnalysisBucket::ALL
            .into_iter()
            .map(move |bucket| (bucket, self.bucket(bucket)))
    }

    pub fn total_items(&self) -> usize {
        self.iter().map(|(_, items)| items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }
}

// Provider output is loosely typed: buckets may be missing, null or a bare
// string, and items may be bare strings, half pairs or junk. Only a
// non-object top level fails the decode.
fn text_of(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn normalize_item(value: &Value) -> Option<AnalysisItem> {
    let (en, zh) = match value {
        Value::String(_) => (text_of(Some(value)), text_of(Some(value))),
        Value::Object(object) => (text_of(object.get("en")), text_of(object.get("zh"))),
        _ => return None,
    };
    match (en, zh) {
        (Some(en), Some(zh)) => Some(AnalysisItem { en, zh }),
        (Some(only), None) | (None, Some(only)) => Some(AnalysisItem {
            en: only.clone(),
            zh: only,
        }),
        (None, None) => None,
    }
}

fn normalize_bucket(value: Option<&Value>) -> Vec<AnalysisItem> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(normalize_item).collect(),
        Some(single @ Value::String(_)) => normalize_item(single).into_iter().collect(),
        _ => Vec::new(),
    }
}

impl From<&Map<String, Value>> for PromptAnalysisResult {
    fn from(raw: &Map<String, Value>) -> Self {
        let mut result = PromptAnalysisResult::default();
        for bucket in AnalysisBucket::ALL {
            *result.bucket_mut(bucket) = normalize_bucket(raw.get(bucket.key()));
        }
        result
    }
}

impl<'de> Deserialize<'de> for PromptAnalysisResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        Ok(PromptAnalysisResult::from(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_yields_all_eight_buckets() {
        let result: PromptAnalysisResult = serde_json::from_value(json!({})).expect("decode");
        assert!(result.is_empty());

        let encoded = serde_json::to_value(&result).expect("encode");
        let keys = encoded
            .as_object()
            .expect("object")
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        let mut expected = AnalysisBucket::ALL
            .iter()
            .map(|bucket| bucket.key().to_string())
            .collect::<Vec<_>>();
        expected.sort();
        let mut keys_sorted = keys;
        keys_sorted.sort();
        assert_eq!(keys_sorted, expected);
        assert!(encoded.as_object().expect("object").values().all(|v| v.is_array()));
    }

    #[test]
    fn normalizes_strings_nulls_and_half_pairs() {
        let result: PromptAnalysisResult = serde_json::from_value(json!({
            "style": ["Cyberpunk", { "en": "Oil Painting", "zh": "油画" }],
            "lighting": null,
            "colorPalette": [{ "zh": "霓虹粉" }, { "en": "  ", "zh": "" }],
            "unknownBucket": [1, 2, 3]
        }))
        .expect("decode");

        assert_eq!(
            result.style,
            vec![
                AnalysisItem { en: "Cyberpunk".into(), zh: "Cyberpunk".into() },
                AnalysisItem { en: "Oil Painting".into(), zh: "油画".into() },
            ]
        );
        assert!(result.lighting.is_empty());
        assert_eq!(
            result.color_palette,
            vec![AnalysisItem { en: "霓虹粉".into(), zh: "霓虹粉".into() }]
        );
        assert_eq!(result.total_items(), 3);
    }

    #[test]
    fn scalar_items_are_skipped_without_losing_the_rest() {
        let result: PromptAnalysisResult = serde_json::from_str(
            r#"{"subject":["cat", 42, null, {"en": 7, "zh": "猫"}],"camera":[["nested"]]}"#,
        )
        .expect("decode");
        assert_eq!(
            result.subject,
            vec![
                AnalysisItem { en: "cat".into(), zh: "cat".into() },
                AnalysisItem { en: "猫".into(), zh: "猫".into() },
            ]
        );
        assert!(result.camera.is_empty());
    }

    #[test]
    fn bare_string_bucket_becomes_one_item() {
        let result: PromptAnalysisResult =
            serde_json::from_str(r#"{"subject":["cat"],"style":"Cyberpunk","medium":3}"#)
                .expect("decode");
        assert_eq!(result.subject.len(), 1);
        assert_eq!(
            result.style,
            vec![AnalysisItem { en: "Cyberpunk".into(), zh: "Cyberpunk".into() }]
        );
        assert!(result.medium.is_empty());
    }

    #[test]
    fn non_object_top_level_still_fails() {
        assert!(serde_json::from_str::<PromptAnalysisResult>("[1, 2]").is_err());
        assert!(serde_json::from_str::<PromptAnalysisResult>("\"text\"").is_err());
    }

    #[test]
    fn bucket_keys_round_trip() {
        for bucket in AnalysisBucket::ALL {
            assert_eq!(AnalysisBucket::from_key(bucket.key()), Some(bucket));
        }
        assert_eq!(AnalysisBucket::from_key("composition"), None);
    }

    #[test]
    fn description_paragraphs_skip_blanks() {
        let description = ImageDescription {
            en: "First.\n\n\n\nSecond.".into(),
            zh: "第一段。".into(),
        };
        assert_eq!(description.paragraphs_en().collect::<Vec<_>>(), vec!["First.", "Second."]);
        assert_eq!(description.paragraphs_zh().count(), 1);
    }
}
