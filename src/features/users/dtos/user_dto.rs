use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::users::models::User;
use crate::shared::validation::{password_strength, state_code, NAME_REGEX, USERNAME_REGEX};

/// Create user payload. Arrives as multipart form fields alongside an
/// optional `file` part; the handler assembles this DTO before validation.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(
        length(min = 2, max = 50, message = "firstname must be 2-50 characters"),
        regex(path = *NAME_REGEX, message = "firstname may only contain letters")
    )]
    pub firstname: String,

    #[validate(
        length(min = 2, max = 50, message = "secondname must be 2-50 characters"),
        regex(path = *NAME_REGEX, message = "secondname may only contain letters")
    )]
    pub secondname: Option<String>,

    #[validate(
        length(min = 2, max = 100, message = "lastname must be 2-100 characters"),
        regex(path = *NAME_REGEX, message = "lastname may only contain letters")
    )]
    pub lastname: String,

    #[validate(
        length(min = 4, max = 20, message = "username must be 4-20 characters"),
        regex(
            path = *USERNAME_REGEX,
            message = "username may only contain letters, digits, underscores and hyphens"
        )
    )]
    pub username: String,

    #[validate(
        email(message = "email must be a valid email address"),
        length(max = 100, message = "email must not exceed 100 characters")
    )]
    pub email: String,

    #[validate(
        length(min = 8, max = 50, message = "password must be 8-50 characters"),
        custom(function = password_strength)
    )]
    pub password: String,
}

/// Edit user payload. Same shape as create except the password is optional:
/// when absent the stored hash is preserved.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(
        length(min = 2, max = 50, message = "firstname must be 2-50 characters"),
        regex(path = *NAME_REGEX, message = "firstname may only contain letters")
    )]
    pub firstname: String,

    #[validate(
        length(min = 2, max = 50, message = "secondname must be 2-50 characters"),
        regex(path = *NAME_REGEX, message = "secondname may only contain letters")
    )]
    pub secondname: Option<String>,

    #[validate(
        length(min = 2, max = 100, message = "lastname must be 2-100 characters"),
        regex(path = *NAME_REGEX, message = "lastname may only contain letters")
    )]
    pub lastname: String,

    #[validate(
        length(min = 4, max = 20, message = "username must be 4-20 characters"),
        regex(
            path = *USERNAME_REGEX,
            message = "username may only contain letters, digits, underscores and hyphens"
        )
    )]
    pub username: String,

    #[validate(
        email(message = "email must be a valid email address"),
        length(max = 100, message = "email must not exceed 100 characters")
    )]
    pub email: String,

    #[validate(
        length(min = 8, max = 50, message = "password must be 8-50 characters"),
        custom(function = password_strength)
    )]
    pub password: Option<String>,
}

/// Filters for the user listing. All optional; empty filters list everyone.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
pub struct ListUsersQuery {
    /// Matches against first, second and last name
    #[validate(length(min = 2, max = 50, message = "name filter must be 2-50 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 4, max = 20, message = "username filter must be 4-20 characters"))]
    pub username: Option<String>,

    #[validate(
        email(message = "email filter must be a valid email address"),
        length(max = 100, message = "email filter must not exceed 100 characters")
    )]
    pub email: Option<String>,

    /// "A" (active) or "I" (inactive)
    #[validate(custom(function = state_code))]
    pub state: Option<String>,
}

/// User record as returned to the frontend. The password hash never leaves
/// the service layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: i64,
    pub firstname: String,
    pub secondname: Option<String>,
    pub lastname: String,
    pub fullname: String,
    pub username: String,
    pub email: String,
    pub state: String,
    pub state_alias: String,
    pub profile_image: Option<String>,
}

impl From<User> for UserResponseDto {
    fn from(user: User) -> Self {
        let fullname = user.fullname();
        let state_alias = user.state_alias().to_string();

        Self {
            id: user.id,
            firstname: user.firstname,
            secondname: user.secondname,
            lastname: user.lastname,
            fullname,
            username: user.username,
            email: user.email,
            state: user.state,
            state_alias,
            profile_image: user.profile_image,
        }
    }
}
