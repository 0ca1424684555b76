//! Error types for feishu-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Api, Config, Converter, etc.)
//! - A nested [`ApiError`] enum mirroring the remote API's failure surface
//! - Context information (tokens, remote error codes, config keys)

use thiserror::Error;

/// Result type alias for feishu-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for feishu-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "feishu.app_id")
        key: Option<String>,
    },

    /// The given URL does not match any supported document/folder/wiki shape
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Remote Open API call failed
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Block-to-Markdown conversion failed (malformed structured content)
    #[error("converter error: {0}")]
    Converter(String),

    /// Document type exists but is not supported for export
    #[error("not supported: {0}")]
    NotSupported(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Remote API errors, one variant per consumed capability
///
/// Each variant carries the opaque token the call was made with and the
/// remote error code/message so batch reports can surface the exact failure.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication (tenant access token) failed
    #[error("authentication failed: {message} (code {code})")]
    Auth {
        /// Remote error code
        code: i64,
        /// Remote error message
        message: String,
    },

    /// Listing a folder's or wiki node's children failed
    #[error("failed to list container {token}: {message} (code {code})")]
    List {
        /// The container token that was being listed
        token: String,
        /// Remote error code
        code: i64,
        /// Remote error message
        message: String,
    },

    /// Resolving a wiki node to its underlying object failed
    #[error("failed to resolve wiki node {token}: {message} (code {code})")]
    Resolve {
        /// The wiki node token that was being resolved
        token: String,
        /// Remote error code
        code: i64,
        /// Remote error message
        message: String,
    },

    /// Fetching a document's structured content failed
    #[error("failed to fetch document {token}: {message} (code {code})")]
    Fetch {
        /// The document token that was being fetched
        token: String,
        /// Remote error code
        code: i64,
        /// Remote error message
        message: String,
    },

    /// Downloading a binary asset failed
    #[error("failed to download asset {token}: {message} (code {code})")]
    Asset {
        /// The asset token that was being downloaded
        token: String,
        /// Remote error code
        code: i64,
        /// Remote error message
        message: String,
    },
}

impl ApiError {
    /// The remote error code carried by this error
    pub fn code(&self) -> i64 {
        match self {
            ApiError::Auth { code, .. }
            | ApiError::List { code, .. }
            | ApiError::Resolve { code, .. }
            | ApiError::Fetch { code, .. }
            | ApiError::Asset { code, .. } => *code,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_token_and_code() {
        let err = ApiError::List {
            token: "fldcnqquW1svRIY".into(),
            code: 1254005,
            message: "folder not found".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("fldcnqquW1svRIY"));
        assert!(msg.contains("1254005"));
        assert!(msg.contains("folder not found"));
    }

    #[test]
    fn api_error_wraps_into_error() {
        let err: Error = ApiError::Fetch {
            token: "doxcn123".into(),
            code: 99991663,
            message: "token invalid".into(),
        }
        .into();
        assert!(matches!(err, Error::Api(ApiError::Fetch { .. })));
        assert!(err.to_string().starts_with("API error:"));
    }

    #[test]
    fn api_error_code_accessor_covers_all_variants() {
        let variants = vec![
            ApiError::Auth {
                code: 1,
                message: "a".into(),
            },
            ApiError::List {
                token: "t".into(),
                code: 2,
                message: "b".into(),
            },
            ApiError::Resolve {
                token: "t".into(),
                code: 3,
                message: "c".into(),
            },
            ApiError::Fetch {
                token: "t".into(),
                code: 4,
                message: "d".into(),
            },
            ApiError::Asset {
                token: "t".into(),
                code: 5,
                message: "e".into(),
            },
        ];
        let codes: Vec<i64> = variants.iter().map(|v| v.code()).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn config_error_display_omits_key() {
        let err = Error::Config {
            message: "app_id is empty".into(),
            key: Some("feishu.app_id".into()),
        };
        assert_eq!(err.to_string(), "configuration error: app_id is empty");
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
