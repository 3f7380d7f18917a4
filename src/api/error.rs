// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

use thiserror::Error as ThisError;

pub const NETWORK_MESSAGE: &str = "Failed to reach server.";
pub const GENERIC_MESSAGE: &str = "Operation failed.";
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid server response.";

/// Failures at the backend boundary, one variant per error class the UI distinguishes.
#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server returned HTTP {status}")]
    Status { status: u16, message: Option<String> },

    #[error("server rejected the request")]
    Rejected { message: Option<String> },

    #[error("invalid response body: {0}")]
    InvalidResponse(String),

    #[error("progress stream failed: {0}")]
    Stream(String),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Message shown in the status line.
    ///
    /// Server-provided text wins; otherwise `fallback` for application errors.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Network(_) => NETWORK_MESSAGE.to_string(),
            Self::Status { message, .. } | Self::Rejected { message } => message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(fallback)
                .to_string(),
            Self::InvalidResponse(_) => INVALID_RESPONSE_MESSAGE.to_string(),
            Self::Stream(_) => crate::models::progress::CONNECTION_LOST_TEXT.to_string(),
            Self::Io(err) => format!("File error: {err}"),
            Self::Url(_) => "Invalid server address.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_text_wins_over_fallback() {
        let err = ApiError::Rejected {
            message: Some("field_name required".into()),
        };
        assert_eq!(err.user_message(GENERIC_MESSAGE), "field_name required");

        let err = ApiError::Status {
            status: 500,
            message: Some("  ".into()),
        };
        assert_eq!(err.user_message("Failed to add field."), "Failed to add field.");
    }

    #[test]
    fn fixed_messages_per_class() {
        assert_eq!(
            ApiError::InvalidResponse("eof".into()).user_message(GENERIC_MESSAGE),
            INVALID_RESPONSE_MESSAGE
        );
        assert_eq!(
            ApiError::Stream("reset".into()).user_message(GENERIC_MESSAGE),
            "Connection lost or error occurred."
        );
    }
}
