//! Field validation shared by the directory services.
use chrono::{NaiveDate, Utc};

use crate::domain::errors::{DomainError, DomainResult};

const MAX_USERNAME_LEN: usize = 150;
const MAX_SPECIALTY_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 15;

pub fn validate_username(username: &str) -> DomainResult<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DomainError::invalid("Username cannot be empty"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(DomainError::invalid(format!(
            "Username cannot exceed {} characters",
            MAX_USERNAME_LEN
        )));
    }
    Ok(username.to_string())
}

pub fn validate_email(email: &str) -> DomainResult<String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_string()),
        _ => Err(DomainError::invalid("Enter a valid email address")),
    }
}

pub fn validate_password(password: &str) -> DomainResult<()> {
    if password.is_empty() {
        return Err(DomainError::invalid("Password cannot be empty"));
    }
    Ok(())
}

pub fn validate_specialty(specialty: &str) -> DomainResult<String> {
    let specialty = specialty.trim();
    if specialty.is_empty() {
        return Err(DomainError::invalid("Specialty cannot be empty"));
    }
    if specialty.chars().count() > MAX_SPECIALTY_LEN {
        return Err(DomainError::invalid(format!(
            "Specialty cannot exceed {} characters",
            MAX_SPECIALTY_LEN
        )));
    }
    Ok(specialty.to_string())
}

/// Parse a YYYY-MM-DD birth date that is not in the future
pub fn parse_birth_date(birth_date: &str) -> DomainResult<NaiveDate> {
    let date = NaiveDate::parse_from_str(birth_date.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::invalid("Birth date must be in YYYY-MM-DD format"))?;

    if date > Utc::now().date_naive() {
        return Err(DomainError::invalid("Birth date cannot be in the future"));
    }
    Ok(date)
}

pub fn validate_phone_number(phone_number: &str) -> DomainResult<String> {
    let phone_number = phone_number.trim();
    if phone_number.is_empty() {
        return Err(DomainError::invalid("Phone number cannot be empty"));
    }
    if phone_number.chars().count() > MAX_PHONE_LEN {
        return Err(DomainError::invalid(format!(
            "Phone number cannot exceed {} characters",
            MAX_PHONE_LEN
        )));
    }
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')');
    if !phone_number.chars().all(allowed) || !phone_number.chars().any(|c| c.is_ascii_digit()) {
        return Err(DomainError::invalid("Phone number contains invalid characters"));
    }
    Ok(phone_number.to_string())
}
