#[derive(thiserror::Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Notion unavailable ({operation}): {reason}")]
    SourceUnavailable { operation: String, reason: String },

    #[error("Failed to decode Notion response ({operation}): {reason}")]
    Decode { operation: String, reason: String },
}

impl Error {
    pub fn missing_env(var: &str) -> Self {
        Error::Configuration(format!("{var} environment variable not set"))
    }

    pub fn source_unavailable(operation: &str, reason: impl Into<String>) -> Self {
        Error::SourceUnavailable {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}
