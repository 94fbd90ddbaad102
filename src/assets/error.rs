use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Unable to process file {0}, no handler implemented")]
    UnrecognizedExtension(String),

    #[error("Failed to load {kind} resource {name}: {reason}")]
    ParseFailure {
        kind: &'static str,
        name: String,
        reason: String,
    },

    #[error("{0}")]
    UnsupportedFeature(String),

    #[error("Failed to load resource from {url}: {reason}")]
    NetworkError { url: String, reason: String },

    #[error("Script {0} has no `void Start()` entry point")]
    MissingScriptEntryPoint(String),

    #[error("Script {name} failed: {reason}")]
    ScriptFailed { name: String, reason: String },

    #[error("Resource {0} not found")]
    NotFound(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl CacheError {
    pub fn parse(kind: &'static str, name: &str, reason: impl ToString) -> Self {
        CacheError::ParseFailure {
            kind,
            name: name.to_owned(),
            reason: reason.to_string(),
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
