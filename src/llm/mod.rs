pub mod error;
pub mod gateway;
pub mod gemini;
pub mod media;
pub mod types;

pub use error::GatewayError;
pub use gateway::{
    sanitize_aspect_ratio, AiGateway, GatewaySettings, FALLBACK_ASPECT_RATIO, SUPPORTED_ASPECT_RATIOS,
};
pub use gemini::{GeminiClient, GenerateContent};
pub use types::{AnalysisBucket, AnalysisItem, EnhancedPrompt, ImageDescription, PromptAnalysisResult};
