use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::shared::constants::STATE_INACTIVE;

/// Database model for users.
///
/// `profile_image` is not a column on the users table; every read joins the
/// file catalog so the associated blob path comes along for free.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub firstname: String,
    pub secondname: Option<String>,
    pub lastname: String,
    pub username: String,
    pub email: String,
    /// bcrypt hash, never the plaintext
    pub password: String,
    /// "A" (active) or "I" (inactive)
    pub state: String,
    /// Weak reference into the file catalog; no FK cascade
    pub file_id: Option<i64>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn fullname(&self) -> String {
        match self.secondname.as_deref() {
            Some(second) if !second.is_empty() => {
                format!("{} {} {}", self.firstname, second, self.lastname)
            }
            _ => format!("{} {}", self.firstname, self.lastname),
        }
    }

    pub fn state_alias(&self) -> &'static str {
        if self.state == STATE_INACTIVE {
            "Inactivo"
        } else {
            "Activo"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(secondname: Option<&str>) -> User {
        User {
            id: 1,
            firstname: "Ana".to_string(),
            secondname: secondname.map(String::from),
            lastname: "Lopez".to_string(),
            username: "ana_lopez".to_string(),
            email: "ana@example.com".to_string(),
            password: "$2b$12$hash".to_string(),
            state: "A".to_string(),
            file_id: None,
            profile_image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn fullname_skips_missing_secondname() {
        assert_eq!(user(None).fullname(), "Ana Lopez");
        assert_eq!(user(Some("María")).fullname(), "Ana María Lopez");
        assert_eq!(user(Some("")).fullname(), "Ana Lopez");
    }

    #[test]
    fn state_alias_maps_codes() {
        let mut u = user(None);
        assert_eq!(u.state_alias(), "Activo");
        u.state = "I".to_string();
        assert_eq!(u.state_alias(), "Inactivo");
    }
}
