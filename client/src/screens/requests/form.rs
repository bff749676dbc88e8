use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::api::{ApiError, CreateEarlyDepartureRequest};
use crate::utils::time::{format_date, format_hhmm, now_in_tz};

pub const DESCRIPTION_REQUIRED: &str = "motivo requerido.";
pub const INVALID_DATE: &str = "La fecha debe tener el formato AAAA-MM-DD.";
pub const INVALID_TIME: &str = "La hora debe tener el formato HH:MM.";

/// Early-departure request form. Input is kept as typed until a submit
/// succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct EarlyRequestForm {
    #[validate(custom(function = "validate_not_blank"))]
    pub description: String,
    #[validate(custom(function = "validate_date"))]
    pub request_date: String,
    #[validate(custom(function = "validate_time"))]
    pub request_time: String,
    pub document_path: String,
}

impl EarlyRequestForm {
    /// Empty form with date and time set to now in `tz`.
    pub fn defaults(tz: Tz) -> Self {
        let now = now_in_tz(tz);
        Self {
            description: String::new(),
            request_date: format_date(now.date_naive()),
            request_time: format_hhmm(now.time()),
            document_path: String::new(),
        }
    }

    pub fn reset(&mut self, tz: Tz) {
        *self = Self::defaults(tz);
    }

    pub fn to_payload(&self) -> Result<CreateEarlyDepartureRequest, ApiError> {
        self.validate()?;
        let document_path = self.document_path.trim();
        Ok(CreateEarlyDepartureRequest {
            description: self.description.trim().to_string(),
            request_date: self.request_date.clone(),
            request_time: self.request_time.clone(),
            document_path: (!document_path.is_empty()).then(|| document_path.to_string()),
        })
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("required", DESCRIPTION_REQUIRED));
    }
    Ok(())
}

/// `YYYY-MM-DD` and a real calendar date.
fn validate_date(value: &str) -> Result<(), ValidationError> {
    let shaped = value.len() == 10
        && value.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });
    if !shaped || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err(invalid("date_format", INVALID_DATE));
    }
    Ok(())
}

/// `HH:MM` and a real clock time.
fn validate_time(value: &str) -> Result<(), ValidationError> {
    let shaped = value.len() == 5
        && value.char_indices().all(|(i, c)| match i {
            2 => c == ':',
            _ => c.is_ascii_digit(),
        });
    if !shaped || NaiveTime::parse_from_str(value, "%H:%M").is_err() {
        return Err(invalid("time_format", INVALID_TIME));
    }
    Ok(())
}
