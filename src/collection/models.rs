use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::ids::next_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRecord {
    pub id: String,
    pub title: String,
    pub prompt_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_text_zh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub bookmarked: bool,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

impl PromptRecord {
    pub fn new(
        title: impl Into<String>,
        prompt_text: impl Into<String>,
        image_url: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: next_id(),
            title: title.into(),
            prompt_text: prompt_text.into(),
            prompt_text_zh: None,
            negative_prompt: None,
            tags: Vec::new(),
            image_url: image_url.into(),
            model_used: None,
            aspect_ratio: None,
            likes: 0,
            bookmarked: false,
            author: author.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    pub fn with_translation(mut self, prompt_text_zh: impl Into<String>) -> Self {
        self.prompt_text_zh = non_blank(prompt_text_zh.into());
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = non_blank(aspect_ratio.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_used = non_blank(model.into());
        self
    }
}

/// Partial update. `id` and `created_at` are deliberately absent.
/// For the optional text fields an empty string clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptPatch {
    pub title: Option<String>,
    pub prompt_text: Option<String>,
    pub prompt_text_zh: Option<String>,
    pub negative_prompt: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub model_used: Option<String>,
    pub aspect_ratio: Option<String>,
    pub likes: Option<u32>,
    pub bookmarked: Option<bool>,
    pub author: Option<String>,
}

impl PromptPatch {
    pub fn apply_to(self, record: &mut PromptRecord) {
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(prompt_text) = self.prompt_text {
            record.prompt_text = prompt_text;
        }
        if let Some(zh) = self.prompt_text_zh {
            record.prompt_text_zh = non_blank(zh);
        }
        if let Some(negative) = self.negative_prompt {
            record.negative_prompt = non_blank(negative);
        }
        if let Some(tags) = self.tags {
            record.tags = normalize_tags(tags);
        }
        if let Some(image_url) = self.image_url {
            record.image_url = image_url;
        }
        if let Some(model) = self.model_used {
            record.model_used = non_blank(model);
        }
        if let Some(ratio) = self.aspect_ratio {
            record.aspect_ratio = non_blank(ratio);
        }
        if let Some(likes) = self.likes {
            record.likes = likes;
        }
        if let Some(bookmarked) = self.bookmarked {
            record.bookmarked = bookmarked;
        }
        if let Some(author) = self.author {
            record.author = author;
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Trims, drops blanks and removes duplicates while keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.into().trim().to_string();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

/// Tags typed as "a, b, c".
pub fn parse_tag_list(input: &str) -> Vec<String> {
    normalize_tags(input.split(','))
}
