use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::{
    Config, DECOMPOSE_SYSTEM_PROMPT, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL,
    ENHANCE_SYSTEM_PROMPT, IMAGE_SYSTEM_PROMPT, REVERSE_SYSTEM_PROMPT, REVERSE_USER_PROMPT,
};
use crate::credentials::Credential;
use crate::llm::error::GatewayError;
use crate::llm::gemini::{build_safety_settings, truncate_for_log, GenerateContent};
use crate::llm::media::{prepare_inline_image, to_data_uri, InlineImage, DEFAULT_IMAGE_MIME};
use crate::llm::types::{AnalysisBucket, EnhancedPrompt, ImageDescription, PromptAnalysisResult};
use crate::utils::timing::log_llm_timing;

/// Aspect ratios the image model accepts.
pub const SUPPORTED_ASPECT_RATIOS: [&str; 5] = ["1:1", "3:4", "4:3", "16:9", "9:16"];
pub const FALLBACK_ASPECT_RATIO: &str = "1:1";

pub const ENHANCE_PARSE_ERROR: &str = "Parsing Error";
pub const TRANSLATION_UNAVAILABLE: &str = "Translation unavailable";
pub const REVERSE_PARSE_ERROR: &str = "解析错误 (Parsing Error)";

const PROVIDER: &str = "gemini";

/// Clamps any ratio outside the supported set to `1:1`.
pub fn sanitize_aspect_ratio(aspect_ratio: &str) -> &'static str {
    let trimmed = aspect_ratio.trim();
    SUPPORTED_ASPECT_RATIOS
        .iter()
        .copied()
        .find(|supported| *supported == trimmed)
        .unwrap_or(FALLBACK_ASPECT_RATIO)
}

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub text_model: String,
    pub image_model: String,
    pub temperature: f32,
    pub safety_profile: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            temperature: 0.7,
            safety_profile: "standard".to_string(),
        }
    }
}

impl GatewaySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            text_model: config.gemini_text_model.clone(),
            image_model: config.gemini_image_model.clone(),
            temperature: config.gemini_temperature,
            safety_profile: config.gemini_safety_settings.clone(),
        }
    }
}

/// Stateless facade over the provider. Holds no cross-call state, so
/// independent operations may run concurrently on a shared reference.
#[derive(Debug)]
pub struct AiGateway<T> {
    transport: T,
    credential: Option<Credential>,
    settings: GatewaySettings,
}

impl<T: GenerateContent> AiGateway<T> {
    pub fn new(transport: T, credential: Option<Credential>, settings: GatewaySettings) -> Self {
        Self {
            transport,
            credential,
            settings,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    fn credential(&self) -> Result<&Credential, GatewayError> {
        self.credential.as_ref().ok_or(GatewayError::MissingCredential)
    }

    pub async fn enhance_and_translate(
        &self,
        idea: &str,
        style: &str,
    ) -> Result<EnhancedPrompt, GatewayError> {
        let credential = self.credential()?;
        let idea = idea.trim();
        if idea.is_empty() {
            return Err(GatewayError::InvalidInput("idea must not be empty"));
        }

        let model = self.settings.text_model.as_str();
        let payload = build_enhance_payload(idea, style, &self.settings);
        let response = log_llm_timing(
            PROVIDER,
            model,
            "enhance_prompt",
            Some(json!({ "style": style, "ideaChars": idea.chars().count() })),
            || self.transport.generate_content(credential, model, payload),
        )
        .await?;

        Ok(parse_enhanced_prompt(&response.text(), idea))
    }

    pub async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<String, GatewayError> {
        let credential = self.credential()?;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GatewayError::InvalidInput("prompt must not be empty"));
        }

        let safe_ratio = sanitize_aspect_ratio(aspect_ratio);
        if safe_ratio != aspect_ratio.trim() {
            info!(
                "Aspect ratio '{}' is not supported by the image model; using {}",
                aspect_ratio, safe_ratio
            );
        }

        let model = self.settings.image_model.as_str();
        let payload = build_image_payload(prompt, safe_ratio, &self.settings);
        let response = log_llm_timing(
            PROVIDER,
            model,
            "generate_image",
            Some(json!({ "aspectRatio": safe_ratio })),
            || self.transport.generate_content(credential, model, payload),
        )
        .await?;

        let Some(image) = response.first_inline_image() else {
            if let Some(reason) = response.block_reason() {
                warn!("Image generation blocked by provider: {}", reason);
            }
            return Err(GatewayError::NoImageData {
                model: model.to_string(),
            });
        };
        let mime_type = image
            .mime_type
            .as_deref()
            .filter(|mime| !mime.trim().is_empty())
            .unwrap_or(DEFAULT_IMAGE_MIME);
        Ok(to_data_uri(mime_type, &image.data))
    }

    pub async fn reverse_describe_image(
        &self,
        image_data: &str,
    ) -> Result<ImageDescription, GatewayError> {
        let credential = self.credential()?;
        let image = prepare_inline_image(image_data)
            .ok_or(GatewayError::InvalidInput("image data must not be empty"))?;

        let model = self.settings.text_model.as_str();
        let metadata = json!({ "mimeType": image.mime_type, "dataLen": image.data.len() });
        let payload = build_reverse_payload(&image, &self.settings);
        let response = log_llm_timing(PROVIDER, model, "reverse_image", Some(metadata), || {
            self.transport.generate_content(credential, model, payload)
        })
        .await?;

        Ok(parse_image_description(&response.text()))
    }

    pub async fn decompose_prompt(
        &self,
        raw_text: &str,
    ) -> Result<PromptAnalysisResult, GatewayError> {
        let credential = self.credential()?;
        let raw_text = raw_text.trim();
        if raw_text.is_empty() {
            return Err(GatewayError::InvalidInput("prompt text must not be empty"));
        }

        let model = self.settings.text_model.as_str();
        let payload = build_decompose_payload(raw_text, &self.settings);
        let response = log_llm_timing(
            PROVIDER,
            model,
            "decompose_prompt",
            Some(json!({ "textChars": raw_text.chars().count() })),
            || self.transport.generate_content(credential, model, payload),
        )
        .await?;

        parse_analysis(&response.text())
    }
}

fn string_field(description: &str) -> Value {
    json!({ "type": "STRING", "description": description })
}

fn enhance_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "englishPrompt": string_field("The enhanced prompt in English"),
            "chineseTranslation": string_field("Chinese translation of the enhanced prompt"),
        },
        "required": ["englishPrompt", "chineseTranslation"],
        "propertyOrdering": ["englishPrompt", "chineseTranslation"],
    })
}

fn description_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "en": string_field("English narrative, paragraphs separated by \\n\\n"),
            "zh": string_field("Chinese narrative, paragraphs separated by \\n\\n"),
        },
        "required": ["en", "zh"],
        "propertyOrdering": ["en", "zh"],
    })
}

fn analysis_schema() -> Value {
    let item = json!({
        "type": "OBJECT",
        "properties": {
            "en": string_field("Professional English term"),
            "zh": string_field("Professional Chinese term"),
        },
        "required": ["en", "zh"],
    });

    let mut properties = serde_json::Map::new();
    for bucket in AnalysisBucket::ALL {
        properties.insert(
            bucket.key().to_string(),
            json!({ "type": "ARRAY", "items": item.clone(), "description": bucket.description() }),
        );
    }
    let keys = AnalysisBucket::ALL
        .iter()
        .map(|bucket| bucket.key())
        .collect::<Vec<_>>();

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": keys,
        "propertyOrdering": keys,
    })
}

fn build_enhance_payload(idea: &str, style: &str, settings: &GatewaySettings) -> Value {
    let user_content = format!(
        "Base Idea: {idea}\nTarget Style: {style}\n\nEnhance this prompt and provide translation:"
    );
    json!({
        "systemInstruction": { "parts": [{ "text": ENHANCE_SYSTEM_PROMPT }] },
        "contents": [{ "role": "user", "parts": [{ "text": user_content }] }],
        "generationConfig": {
            "temperature": settings.temperature,
            "responseMimeType": "application/json",
            "responseSchema": enhance_schema(),
        },
        "safetySettings": build_safety_settings(&settings.safety_profile),
    })
}

fn build_image_payload(prompt: &str, aspect_ratio: &str, settings: &GatewaySettings) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": IMAGE_SYSTEM_PROMPT }] },
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseModalities": ["TEXT", "IMAGE"],
            "imageConfig": { "aspectRatio": aspect_ratio },
        },
        "safetySettings": build_safety_settings(&settings.safety_profile),
    })
}

fn build_reverse_payload(image: &InlineImage, settings: &GatewaySettings) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": REVERSE_SYSTEM_PROMPT }] },
        "contents": [{ "role": "user", "parts": [
            { "inlineData": { "mimeType": image.mime_type, "data": image.data } },
            { "text": REVERSE_USER_PROMPT },
        ]}],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": description_schema(),
        },
        "safetySettings": build_safety_settings(&settings.safety_profile),
    })
}

fn build_decompose_payload(raw_text: &str, settings: &GatewaySettings) -> Value {
    let user_content = format!("Input Prompt: \"{raw_text}\"");
    json!({
        "systemInstruction": { "parts": [{ "text": DECOMPOSE_SYSTEM_PROMPT }] },
        "contents": [{ "role": "user", "parts": [{ "text": user_content }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": analysis_schema(),
        },
        "safetySettings": build_safety_settings(&settings.safety_profile),
    })
}

fn non_empty_str<'a>(object: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a str> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

/// Empty text is treated as `{}`, which falls back to the idea.
fn parse_enhanced_prompt(raw: &str, idea: &str) -> EnhancedPrompt {
    let source = if raw.trim().is_empty() { "{}" } else { raw.trim() };
    match serde_json::from_str::<Value>(source) {
        Ok(Value::Object(object)) => EnhancedPrompt {
            english_prompt: non_empty_str(&object, "englishPrompt")
                .unwrap_or(idea)
                .to_string(),
            chinese_translation: non_empty_str(&object, "chineseTranslation")
                .unwrap_or(TRANSLATION_UNAVAILABLE)
                .to_string(),
        },
        _ => {
            warn!(
                "Failed to parse enhanced prompt JSON; returning raw text: {}",
                truncate_for_log(raw, 200)
            );
            EnhancedPrompt {
                english_prompt: raw.to_string(),
                chinese_translation: ENHANCE_PARSE_ERROR.to_string(),
            }
        }
    }
}

fn parse_image_description(raw: &str) -> ImageDescription {
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(raw.trim()) {
        if let (Some(Value::String(en)), Some(Value::String(zh))) =
            (object.get("en"), object.get("zh"))
        {
            return ImageDescription {
                en: en.clone(),
                zh: zh.clone(),
            };
        }
    }

    warn!(
        "Failed to parse image description JSON; returning raw text: {}",
        truncate_for_log(raw, 200)
    );
    ImageDescription {
        en: raw.to_string(),
        zh: REVERSE_PARSE_ERROR.to_string(),
    }
}

fn parse_analysis(raw: &str) -> Result<PromptAnalysisResult, GatewayError> {
    let source = if raw.trim().is_empty() { "{}" } else { raw.trim() };
    serde_json::from_str::<PromptAnalysisResult>(source).map_err(|err| {
        warn!(
            "Failed to parse prompt analysis JSON: {} ({})",
            err,
            truncate_for_log(raw, 200)
        );
        GatewayError::MalformedResponse(err.to_string())
    })
}
