use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Regex for person name fields (letters including Spanish accents, plus spaces)
    /// - Valid: "Ana", "María José", "Ñandú"
    /// - Invalid: "Ana3", "O'Brien", "a_b"
    pub static ref NAME_REGEX: Regex = Regex::new(r"^[a-zA-ZáéíóúÁÉÍÓÚñÑ\s]+$").unwrap();

    /// Regex for usernames: alphanumeric, underscore and hyphen
    /// - Valid: "ana_lopez", "user-01", "Admin"
    /// - Invalid: "ana lopez", "user!", ""
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Password strength check: at least one lowercase letter, one uppercase
/// letter and one digit. Length limits are enforced separately.
pub fn password_strength(password: &str) -> Result<(), ValidationError> {
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_lower && has_upper && has_digit {
        Ok(())
    } else {
        let mut err = ValidationError::new("password_strength");
        err.message =
            Some("password must contain a lowercase letter, an uppercase letter and a digit".into());
        Err(err)
    }
}

/// User state filter check: only "A" (active) and "I" (inactive) are stored
pub fn state_code(state: &str) -> Result<(), ValidationError> {
    match state {
        crate::shared::constants::STATE_ACTIVE | crate::shared::constants::STATE_INACTIVE => Ok(()),
        _ => {
            let mut err = ValidationError::new("state_code");
            err.message = Some("state must be A (active) or I (inactive)".into());
            Err(err)
        }
    }
}
