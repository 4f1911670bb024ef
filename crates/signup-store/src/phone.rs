//! Phone number normalization.

/// Normalize a phone number to E.164 format.
pub fn normalize_phone_number(number: &str) -> Result<String, String> {
    // Remove all non-digit characters except leading +
    let has_plus = number.trim_start().starts_with('+');
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return Err("Phone number must contain at least one digit".into());
    }

    if digits.len() < 7 {
        return Err("Phone number too short".into());
    }

    if digits.len() > 15 {
        return Err("Phone number too long".into());
    }

    if has_plus || digits.len() >= 10 {
        Ok(format!("+{}", digits))
    } else {
        Err("Phone number must include country code".into())
    }
}
