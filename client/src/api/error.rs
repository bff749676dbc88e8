use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-field validation messages, keyed by the backend's field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const CONNECTIVITY_MESSAGE: &str =
    "No se pudo conectar con el servidor. Verifica tu conexión e inténtalo de nuevo.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Tu sesión ha expirado. Inicia sesión nuevamente.";
const VALIDATION_MESSAGE: &str = "Los datos enviados no son válidos.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// No response was received.
    #[error("{}", CONNECTIVITY_MESSAGE)]
    Transport(String),
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// The envelope came back with `status: false` on a successful HTTP status.
    #[error("{0}")]
    Rejected(String),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("Failed to parse response: {0}")]
    Decode(String),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<FieldErrors>,
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            errors: FieldErrors::new(),
        }
    }

    pub fn field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![msg.clone()]);
        Self::Validation {
            message: msg,
            errors,
        }
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Maps a non-success HTTP response onto the error taxonomy. The body is
    /// parsed as `{message, errors}` when possible.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
        let message = parsed
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_message(status));

        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::CONFLICT => Self::Conflict(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Self::Validation {
                message,
                errors: parsed.errors.unwrap_or_default(),
            },
            _ => Self::Server {
                status: status.as_u16(),
                message,
            },
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// First message reported for `field`, if any.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors()?
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        let message = fields
            .values()
            .flat_map(|messages| messages.first())
            .next()
            .cloned()
            .unwrap_or_else(|| VALIDATION_MESSAGE.to_string());
        Self::Validation {
            message,
            errors: fields,
        }
    }
}

impl From<ApiError> for String {
    fn from(error: ApiError) -> Self {
        error.to_string()
    }
}

fn default_message(status: StatusCode) -> String {
    match status {
        StatusCode::UNAUTHORIZED => SESSION_EXPIRED_MESSAGE.to_string(),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            VALIDATION_MESSAGE.to_string()
        }
        other => format!("Request failed with status {}", other.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_body_keeps_field_errors() {
        let body = json!({
            "message": "The given data was invalid.",
            "errors": { "email": ["El correo es obligatorio."] }
        });
        let err = ApiError::from_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            body.to_string().as_bytes(),
        );
        assert_eq!(err.to_string(), "The given data was invalid.");
        assert_eq!(err.field_error("email"), Some("El correo es obligatorio."));
        assert_eq!(err.field_error("password"), None);
    }

    #[test]
    fn status_codes_map_to_variants() {
        assert!(ApiError::from_response(StatusCode::UNAUTHORIZED, b"").is_unauthorized());
        assert!(matches!(
            ApiError::from_response(StatusCode::NOT_FOUND, br#"{"message":"missing"}"#),
            ApiError::NotFound(ref m) if m == "missing"
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::CONFLICT, b"not json"),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::BAD_GATEWAY, b""),
            ApiError::Server { status: 502, .. }
        ));
    }

    #[test]
    fn transport_error_shows_generic_connectivity_message() {
        let err = ApiError::request_failed("connection refused");
        assert_eq!(err.to_string(), CONNECTIVITY_MESSAGE);
        assert!(err.is_transport());
    }

    #[test]
    fn field_constructor_sets_message_and_errors() {
        let err = ApiError::field("description", "motivo requerido.");
        assert_eq!(err.to_string(), "motivo requerido.");
        assert_eq!(err.field_error("description"), Some("motivo requerido."));
    }
}
