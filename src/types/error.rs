use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Generic(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Fetch failed: {0}")]
    Fetch(String),
    #[error("Invalid utf-8 sequence")]
    InvalidUtf8,
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    #[error("HTTP {method} {status}: {message}")]
    Http {
        status: i64,
        method: String,
        message: String,
    },
}

impl AppError {
    pub fn configuration(message: impl Into<String>) -> Self {
        AppError::Configuration(message.into())
    }

    // Configuration faults end the run, everything else degrades a single decision.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Configuration(_))
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Generic(s)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Generic(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_errors_are_fatal() {
        assert!(AppError::configuration("zero arms").is_fatal());
        assert!(!AppError::Fetch("timeout".to_string()).is_fatal());
        assert!(
            !AppError::Http {
                status: 404,
                method: "GET".to_string(),
                message: "Not Found".to_string(),
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_display() {
        let err = AppError::configuration("context has 3 features, expected 4");

        assert_eq!(
            err.to_string(),
            "Configuration error: context has 3 features, expected 4"
        );
    }
}
