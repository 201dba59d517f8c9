//! Remote API error taxonomy and message classification

use serde::Deserialize;
use thiserror::Error;

/// Failure of a remote API call. Timeouts are not distinguished from other
/// failures by callers: every variant triggers the same rollback path.
#[derive(Error, Debug, Clone)]
pub enum RemoteError {
    #[error("request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("server returned {status}")]
    Status { status: u16, body: String },
    #[error("unexpected response payload: {0}")]
    Payload(String),
}

/// Classified failure detail surfaced to the user
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetails {
    /// Field-level validation messages from the server
    Fields(Vec<String>),
    /// One generic summary message
    Summary(String),
}

/// Validation error body shape used by the routing services
#[derive(Debug, Deserialize)]
struct ValidationBody {
    detail: DetailPayload,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetailPayload {
    Items(Vec<DetailItem>),
    Message(String),
}

#[derive(Debug, Deserialize)]
struct DetailItem {
    #[serde(default)]
    loc: Vec<serde_json::Value>,
    msg: String,
}

impl RemoteError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else {
            RemoteError::Transport(err.to_string())
        }
    }

    /// Classify the failure into field-level messages when the server
    /// returned a structured validation body, or a single summary otherwise.
    pub fn classify(&self) -> ErrorDetails {
        match self {
            RemoteError::Status { body, status } => match serde_json::from_str::<ValidationBody>(body)
            {
                Ok(ValidationBody {
                    detail: DetailPayload::Items(items),
                }) if !items.is_empty() => {
                    ErrorDetails::Fields(items.iter().map(DetailItem::render).collect())
                }
                Ok(ValidationBody {
                    detail: DetailPayload::Message(message),
                }) => ErrorDetails::Summary(message),
                _ => ErrorDetails::Summary(format!("The save service rejected the request (HTTP {status}).")),
            },
            RemoteError::Timeout => {
                ErrorDetails::Summary("The save service did not respond in time.".to_string())
            }
            RemoteError::Transport(_) => {
                ErrorDetails::Summary("Could not reach the save service.".to_string())
            }
            RemoteError::Payload(_) => {
                ErrorDetails::Summary("The save service returned an unexpected response.".to_string())
            }
        }
    }
}

impl DetailItem {
    fn render(&self) -> String {
        if self.loc.is_empty() {
            return self.msg.clone();
        }
        let path: Vec<String> = self
            .loc
            .iter()
            .map(|part| match part {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        format!("{}: {}", path.join("."), self.msg)
    }
}
