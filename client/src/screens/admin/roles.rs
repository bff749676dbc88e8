use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::api::{ApiError, Role, RolePayload};

#[derive(Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct RoleForm {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(custom(function = "validate_description"))]
    pub description: String,
    #[validate(custom(function = "validate_salary"))]
    pub salary: String,
    pub admin: bool,
}

impl RoleForm {
    pub fn from_role(role: &Role) -> Self {
        Self {
            name: role.name.clone(),
            description: role.description.clone(),
            salary: role.salary.clone(),
            admin: role.admin,
        }
    }

    pub fn to_payload(&self) -> Result<RolePayload, ApiError> {
        self.validate()?;
        Ok(RolePayload {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            salary: self.salary.trim().to_string(),
            admin: self.admin,
        })
    }
}

fn validate_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().chars().count() <= 2 {
        return Err(ValidationError::new("name_too_short").with_message(Cow::Borrowed(
            "El nombre debe tener más de 2 caracteres.",
        )));
    }
    Ok(())
}

fn validate_description(value: &str) -> Result<(), ValidationError> {
    if value.trim().chars().count() <= 4 {
        return Err(ValidationError::new("description_too_short").with_message(
            Cow::Borrowed("La descripción debe tener más de 4 caracteres."),
        ));
    }
    Ok(())
}

/// Non-empty decimal such as `2500` or `2500.50`.
fn validate_salary(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    let fraction_ok = !value.contains('.') || (!fraction.is_empty() && digits(fraction));
    if whole.is_empty() || !digits(whole) || !fraction_ok {
        return Err(ValidationError::new("salary_invalid")
            .with_message(Cow::Borrowed("El salario debe ser un número válido.")));
    }
    Ok(())
}
