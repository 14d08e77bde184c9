use crate::error::ClientError;
use std::path::Path;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    MinLength,
    Uppercase,
    Lowercase,
    Digit,
}

/// Returns every rule the password violates; empty when it passes.
pub fn check_password_policy(password: &str) -> Vec<PasswordRule> {
    let mut violations = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        violations.push(PasswordRule::MinLength);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        violations.push(PasswordRule::Uppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        violations.push(PasswordRule::Lowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push(PasswordRule::Digit);
    }
    violations
}

pub fn ensure_strong_password(password: &str) -> Result<(), ClientError> {
    let violations = check_password_policy(password);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ClientError::WeakPassword(violations))
    }
}

/// Form-level check done by the UI layer before calling into the session.
pub fn require_credentials(email: &str, password: &str) -> Result<(), ClientError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ClientError::Validation(
            "Please fill in all fields".to_string(),
        ));
    }
    Ok(())
}

/// Returns the selected file once both it and the title are present.
pub fn require_upload_fields<'a>(file: Option<&'a Path>, title: &str) -> Result<&'a Path, ClientError> {
    match file {
        Some(path) if path.is_file() && !title.trim().is_empty() => Ok(path),
        _ => Err(ClientError::Validation(
            "Please select a file and provide a title".to_string(),
        )),
    }
}
