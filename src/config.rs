use std::env;
use std::path::PathBuf;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::warn;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub logs_dir: PathBuf,
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub gemini_text_model: String,
    pub gemini_image_model: String,
    pub gemini_temperature: f32,
    pub gemini_safety_settings: String,
    pub http_timeout_seconds: u64,
    pub local_store_path: PathBuf,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

/// First non-blank value among `names`, in order.
fn env_first_non_empty(names: &[&str]) -> String {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

pub(crate) fn normalize_gemini_safety_settings(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "standard".to_string();
    }

    let lowered = trimmed.to_lowercase();
    match lowered.as_str() {
        "permissive" | "off" | "none" => "permissive".to_string(),
        "standard" => "standard".to_string(),
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}'; defaulting to standard.",
                value
            );
            "standard".to_string()
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let gemini_temperature = env_f32("GEMINI_TEMPERATURE", 0.7);
        if !(0.0..=2.0).contains(&gemini_temperature) {
            return Err(anyhow::anyhow!(
                "GEMINI_TEMPERATURE must be between 0.0 and 2.0, got {}",
                gemini_temperature
            ));
        }

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            logs_dir: PathBuf::from(env_string("LOGS_DIR", "logs")),
            gemini_api_key: env_first_non_empty(&["GEMINI_API_KEY", "API_KEY"]),
            gemini_api_base: env_string("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            gemini_text_model: env_string("GEMINI_TEXT_MODEL", DEFAULT_TEXT_MODEL),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", DEFAULT_IMAGE_MODEL),
            gemini_temperature,
            gemini_safety_settings: normalize_gemini_safety_settings(env_string(
                "GEMINI_SAFETY_SETTINGS",
                "standard",
            )),
            http_timeout_seconds: env_u64("HTTP_TIMEOUT_SECONDS", 120).max(1),
            local_store_path: PathBuf::from(env_string(
                "LOCAL_STORE_PATH",
                "promptverse_store.json",
            )),
        })
    }
}

pub const ENHANCE_SYSTEM_PROMPT: &str = r#"You are an expert AI Art Prompt Engineer and Translator.
Your goal is to take a basic idea (which might be in Chinese or English) and a style, and expand it into a high-quality, descriptive prompt suitable for top-tier image generation models.

You MUST output a valid JSON object with exactly two fields:
1. "englishPrompt": The enhanced prompt in English. Focus on visual descriptors, lighting, texture, composition.
2. "chineseTranslation": A high-quality Chinese translation of the enhanced prompt.

Do NOT output markdown blocks. Output RAW JSON only."#;

pub const IMAGE_SYSTEM_PROMPT: &str =
    "Generate an image based on the prompt. CRITICAL: the response must be an image, NOT TEXT.";

pub const REVERSE_SYSTEM_PROMPT: &str = r#"# Role
You are a "Visual Narrative Architect". Analyze the image and rewrite it into a highly detailed, cinematic and technically precise description, delivered in English and in Chinese.

# Output Format
- Return a single JSON object with exactly two string keys: "en" (English narrative) and "zh" (the same narrative in fluent, professional Chinese).
- Inside each value use plain paragraphs only: no bullet points, no markdown. Separate paragraphs with a blank line ("\n\n").
- Style: photorealistic, narrative-driven, observational, technically precise, rich in adjectives.

# Structure (mandatory, in this order)
1. Overall Composition & Narrative: the macro structure (single frame, triptych, collage, portrait) and the overall mood or story flow.
2. Core Style & Environment: medium (e.g. Kodak Portra 400), lighting (e.g. hard natural daylight), contrast and setting.
3. Subject Details: clothing, accessories, makeup and styling in depth.
4. Sectional/Panel Deep Dive: for multi-panel images describe EACH panel individually (Top/Middle/Bottom or Left/Right): pose, gaze direction and, critically, any "out-of-bounds" element that breaks through or overlaps a panel border.
5. Technical & Negative Constraints: state the aspect ratio and what the style is explicitly NOT (e.g. "avoiding illustration or comic aesthetics").

# Example (English value only, emulate the register)
A real-life woman is presented in a vertical triptych collage composition, depicting three consecutive moments (a calm stance, a direct confrontation and a startled reaction).

The image is shot in a photorealistic, cinematic live-action style with subtle natural grain, hard natural daylight, a clear blue sky and deep depth of field.

The subject wears a cowboy hat, a short-sleeve button-up shirt and a brownish-red long skirt, with retro-inspired makeup and distinct red lipstick.

Top panel: the subject stands toward the right with arms crossed, looking toward the lower-left. Middle panel: she aims a firearm toward the lower-right; both she and the weapon break through the top and bottom panel borders, overlapping the frame lines. Bottom panel: she raises both hands defensively and overlaps the border lines, forming a layered composition.

The image maintains a 2:3 aspect ratio and a photorealistic live-action style, explicitly avoiding illustration or comic aesthetics."#;

pub const REVERSE_USER_PROMPT: &str =
    "Analyze this image and generate the bilingual cinematic narrative description following the protocol.";

pub const DECOMPOSE_SYSTEM_PROMPT: &str = r#"You are a bilingual (English/Chinese) AI art prompt analyst.
Break the given prompt down into structured components. If the input is messy or unstructured, extract the key concepts into the appropriate categories.
For EVERY extracted keyword return an object with two fields:
- "en": the professional English term
- "zh": the professional Chinese term
Provide both languages even when the source text was already in one of them. Leave a category as an empty array when nothing fits."#;
