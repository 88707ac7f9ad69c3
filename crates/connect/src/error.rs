//! Error types for the connect crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConnectError>;

#[derive(Debug, Error)]
pub enum ConnectError {
    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Base URL is empty or not http(s)
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ConnectError {
    pub fn invalid_base_url(url: impl Into<String>) -> Self {
        Self::InvalidBaseUrl(url.into())
    }
}

/// Trim and validate an API base URL, dropping any trailing `/`.
pub(crate) fn normalize_base_url(base_url: &str) -> Result<String> {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConnectError::invalid_base_url(base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(
            normalize_base_url(" https://api.example.com/ ").unwrap(),
            "https://api.example.com"
        );
        assert!(matches!(
            normalize_base_url("api.example.com"),
            Err(ConnectError::InvalidBaseUrl(_))
        ));
    }
}
