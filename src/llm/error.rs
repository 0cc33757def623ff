use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("No Gemini API key configured. Set GEMINI_API_KEY or run `promptverse key set <value>`.")]
    MissingCredential,

    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("No image data received from Gemini (model: {model})")]
    NoImageData { model: String },

    #[error("Gemini returned a malformed response: {0}")]
    MalformedResponse(String),

    #[error("Gemini request failed: {0}")]
    Transport(String),

    #[error("Gemini request failed with status {status}: {message}")]
    Provider { status: StatusCode, message: String },
}

impl GatewayError {
    /// True for failures where checking the credential is the sensible next step.
    pub fn is_auth_related(&self) -> bool {
        match self {
            GatewayError::MissingCredential => true,
            GatewayError::Provider { status, .. } => {
                *status == StatusCode::UNAUTHORIZED
                    || *status == StatusCode::FORBIDDEN
                    || *status == StatusCode::BAD_REQUEST
            }
            _ => false,
        }
    }
}
