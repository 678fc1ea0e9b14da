//! Error types for the Rosette reading core
//!
//! Each layer owns a thiserror enum; [`RosetteError`] aggregates them for
//! callers that do not care which layer failed.
//!
//! None of these represent "missing translation" or "cancelled job": those
//! are ordinary states, not errors.

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum RosetteError {
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Language error: {0}")]
    Language(#[from] LanguageError),
}

/// Failures of a single Wikipedia/Wikidata API call
///
/// Callers distinguish three outcomes: success, empty/not-found (an `Ok`
/// carrying `None` or an empty collection) and one of these variants.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Rate limited by {host}")]
    RateLimited { host: String },

    #[error("Unexpected status {status} from {host}")]
    Status { status: StatusCode, host: String },

    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API error {code}: {info}")]
    Api { code: String, info: String },
}

impl ClientError {
    /// Whether the caller should back off before the next request
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ClientError::RateLimited { .. })
    }
}

/// Terminal outcomes of the article resolver
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Article \"{term}\" not found")]
    NotFound { term: String },

    #[error("Entity {id} could not be loaded: {source}")]
    Entity {
        id: String,
        #[source]
        source: ClientError,
    },

    #[error("Entity {id} does not exist")]
    UnknownEntity { id: String },
}

/// Persistence failures of the key-value settings collaborator
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Invalid language configuration
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LanguageError {
    #[error("Unsupported language code '{code}'")]
    Unsupported { code: String },

    #[error("Language '{code}' listed more than once")]
    Duplicate { code: String },

    #[error("At least one display language is required")]
    Empty,
}

pub type Result<T> = std::result::Result<T, RosetteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_flag() {
        let err = ClientError::RateLimited {
            host: "en.wikipedia.org".to_string(),
        };
        assert!(err.is_rate_limited());

        let err = ClientError::Status {
            status: StatusCode::BAD_GATEWAY,
            host: "en.wikipedia.org".to_string(),
        };
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_not_found_message() {
        let err = ResolveError::NotFound {
            term: "Xyzzy".to_string(),
        };
        assert_eq!(err.to_string(), "Article \"Xyzzy\" not found");
    }

    #[test]
    fn test_error_conversion() {
        let err: RosetteError = LanguageError::Empty.into();
        assert!(matches!(err, RosetteError::Language(LanguageError::Empty)));
    }
}
