use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuneplanError {
    #[error("Invalid preferences: {0}")]
    InvalidPreferences(String),

    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Keychain error: {0}")]
    Keychain(String),

    #[error("Enhancement error: {0}")]
    Enhancement(String),
}

impl From<TuneplanError> for String {
    fn from(err: TuneplanError) -> Self {
        err.to_string()
    }
}

pub type Result<T> = std::result::Result<T, TuneplanError>;
