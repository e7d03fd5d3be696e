use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::auth::StorageError;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// One field-level complaint from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted location such as `body.email`; absent for form-wide errors
    pub path: Option<String>,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path {
            Some(ref path) => write!(f, "{}: {}", path, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// The error body shapes the backend is known to send
#[derive(Debug, Clone, PartialEq)]
pub enum ServerError {
    /// `{"detail": [{"loc": [...], "msg": "..."}]}`
    Validation(Vec<FieldError>),
    /// `{"detail": "..."}`
    Detail(String),
    /// `{"errors": {"field": ["..."]}}` or `{"errors": [...]}`
    FieldErrors(Vec<FieldError>),
    /// `{"message": "..."}`
    Message(String),
    /// JSON in none of the shapes above
    Opaque(Value),
    /// A body that is not JSON at all
    Text(String),
    Empty,
}

impl ServerError {
    pub fn parse(body: &str) -> Self {
        if body.trim().is_empty() {
            return ServerError::Empty;
        }
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(_) => ServerError::Text(truncate_body(body.trim())),
        }
    }

    pub fn from_value(value: Value) -> Self {
        let Value::Object(ref map) = value else {
            return ServerError::Opaque(value);
        };

        match map.get("detail") {
            Some(Value::String(detail)) => return ServerError::Detail(detail.clone()),
            Some(Value::Array(items)) => {
                let errors: Vec<FieldError> = items.iter().filter_map(detail_item).collect();
                if !errors.is_empty() {
                    return ServerError::Validation(errors);
                }
            }
            _ => {}
        }

        if let Some(errors) = map.get("errors") {
            let errors = collect_errors(errors);
            if !errors.is_empty() {
                return ServerError::FieldErrors(errors);
            }
        }

        if let Some(Value::String(message)) = map.get("message") {
            return ServerError::Message(message.clone());
        }

        ServerError::Opaque(value)
    }

    /// Human readable text, or `None` when the body carries nothing displayable
    pub fn display_message(&self) -> Option<String> {
        match self {
            ServerError::Validation(errors) | ServerError::FieldErrors(errors) => Some(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            ServerError::Detail(s) | ServerError::Message(s) | ServerError::Text(s) => {
                Some(s.clone())
            }
            ServerError::Opaque(_) | ServerError::Empty => None,
        }
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ServerError::Validation(errors) | ServerError::FieldErrors(errors) => errors,
            _ => &[],
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.display_message() {
            Some(message) => write!(f, "{}", message),
            None => match self {
                ServerError::Opaque(value) => write!(f, "{}", truncate_body(&value.to_string())),
                _ => write!(f, "(empty body)"),
            },
        }
    }
}

/// `{"loc": ["body", "email"], "msg": "invalid"}` -> `body.email: invalid`
fn detail_item(item: &Value) -> Option<FieldError> {
    let message = item
        .get("msg")
        .or_else(|| item.get("message"))
        .and_then(Value::as_str)?;
    let path = item.get("loc").and_then(Value::as_array).and_then(|loc| {
        let segments: Vec<String> = loc.iter().filter_map(path_segment).collect();
        (!segments.is_empty()).then(|| segments.join("."))
    });
    Some(FieldError {
        path,
        message: message.to_string(),
    })
}

fn path_segment(segment: &Value) -> Option<String> {
    match segment {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn collect_errors(errors: &Value) -> Vec<FieldError> {
    match errors {
        Value::Object(fields) => fields
            .iter()
            .flat_map(|(field, messages)| {
                messages_of(messages).into_iter().map(move |message| FieldError {
                    path: Some(field.clone()),
                    message,
                })
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(FieldError {
                    path: None,
                    message: s.clone(),
                }),
                Value::Object(obj) => {
                    let message = obj
                        .get("message")
                        .or_else(|| obj.get("msg"))
                        .and_then(Value::as_str)?;
                    let path = obj
                        .get("field")
                        .or_else(|| obj.get("path"))
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    Some(FieldError {
                        path,
                        message: message.to_string(),
                    })
                }
                _ => None,
            })
            .collect(),
        Value::String(s) => vec![FieldError {
            path: None,
            message: s.clone(),
        }],
        _ => Vec::new(),
    }
}

fn messages_of(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token may be expired or revoked")]
    Unauthorized(ServerError),

    #[error("Validation failed: {0}")]
    Validation(ServerError),

    #[error("Request failed with status {status}: {body}")]
    Status { status: StatusCode, body: ServerError },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = ServerError::parse(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized(body),
            422 => ApiError::Validation(body),
            _ => ApiError::Status { status, body },
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
            ApiError::Validation(_) => Some(StatusCode::UNPROCESSABLE_ENTITY),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status(),
            _ => None,
        }
    }

    pub fn server_error(&self) -> Option<&ServerError> {
        match self {
            ApiError::Unauthorized(body) | ApiError::Validation(body) => Some(body),
            ApiError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_auth_denied(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    /// Message suitable for showing to the user as-is
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized(body) => body
                .display_message()
                .unwrap_or_else(|| "Invalid credentials or session expired. Please log in again.".to_string()),
            ApiError::Validation(body) => body
                .display_message()
                .unwrap_or_else(|| "Some fields are invalid.".to_string()),
            ApiError::Status { status, body } => body
                .display_message()
                .unwrap_or_else(|| format!("Request failed ({}). Please try again.", status)),
            ApiError::Network(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::Network(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            other => other.to_string(),
        }
    }
}
