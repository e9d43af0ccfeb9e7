use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Loose shape check: something@something.tld
pub fn looks_like_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Strip spaces and dashes from a phone number.
pub fn normalize_phone(value: &str) -> String {
    value.chars().filter(|c| *c != ' ' && *c != '-').collect()
}

/// Registration phone numbers are exactly eleven ASCII digits.
pub fn validate_phone(value: &str) -> Result<(), &'static str> {
    if value.chars().count() != 11 {
        return Err("Ensure this field has exactly 11 characters.");
    }
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err("Invalid phone number");
    }
    Ok(())
}

/// Required, trimmed, at most `max` characters.
pub fn validate_required(value: &str, max: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("This field is required.".to_string());
    }
    if value.chars().count() > max {
        return Err(format!("Ensure this field has no more than {} characters.", max));
    }
    Ok(())
}

pub fn validate_max_len(value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("Ensure this field has no more than {} characters.", max));
    }
    Ok(())
}
