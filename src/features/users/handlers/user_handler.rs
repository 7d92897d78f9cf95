use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::ValidatedQuery;
use crate::features::files::dtos::{
    is_profile_image_allowed, NewUpload, MAX_PROFILE_IMAGE_SIZE,
};
use crate::features::users::dtos::{
    CreateUserDto, ListUsersQuery, UpdateUserDto, UserResponseDto,
};
use crate::features::users::services::UserService;
use crate::shared::types::{ApiResponse, Meta};

/// Text fields plus the optional image part of a user form submission
struct UserForm {
    fields: BTreeMap<String, String>,
    upload: Option<NewUpload>,
}

impl UserForm {
    /// Field value, defaulting to empty so absence surfaces as a length
    /// validation error rather than a 400
    fn field(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// Field value with empty treated as absent
    fn optional(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned().filter(|v| !v.is_empty())
    }
}

async fn read_user_form(mut multipart: Multipart) -> Result<UserForm> {
    let mut fields = BTreeMap::new();
    let mut upload: Option<NewUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == "file" {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let original_name = field
                .file_name()
                .map(|s| s.to_string())
                .unwrap_or_default();

            let data = field.bytes().await.map_err(|e| {
                debug!("Failed to read file bytes: {}", e);
                AppError::BadRequest(format!("Failed to read file data: {}", e))
            })?;

            // A file input submitted without a selection arrives as an
            // empty part; treat it as no upload.
            if original_name.is_empty() && data.is_empty() {
                continue;
            }

            upload = Some(NewUpload {
                data: data.to_vec(),
                original_name,
                content_type,
            });
        } else {
            let text = field.text().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read field '{}': {}", field_name, e))
            })?;
            fields.insert(field_name, text);
        }
    }

    Ok(UserForm { fields, upload })
}

fn validate_upload(upload: &NewUpload) -> Result<()> {
    if !is_profile_image_allowed(&upload.content_type) {
        return Err(AppError::field_error(
            "file",
            "profile image must be a jpeg, jpg, png or gif",
        ));
    }
    if upload.data.len() > MAX_PROFILE_IMAGE_SIZE {
        return Err(AppError::field_error(
            "file",
            "profile image must not exceed 2 MB",
        ));
    }
    Ok(())
}

/// List users
///
/// All filters are optional; with none given, every user is returned.
#[utoipa::path(
    get,
    path = "/admin/users/get-list-users",
    tag = "users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Filtered user listing", body = ApiResponse<Vec<UserResponseDto>>),
        (status = 422, description = "Invalid filter values")
    )
)]
pub async fn get_list_users(
    State(service): State<Arc<UserService>>,
    ValidatedQuery(query): ValidatedQuery<ListUsersQuery>,
) -> Result<Json<ApiResponse<Vec<UserResponseDto>>>> {
    let users = service.list(query).await?;
    let total = users.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(users),
        None,
        Some(Meta { total }),
    )))
}

/// Create a user
///
/// Accepts multipart/form-data with the user fields plus an optional
/// `file` part carrying the profile image.
#[utoipa::path(
    post,
    path = "/admin/users/create-users",
    tag = "users",
    request_body(
        content = CreateUserDto,
        content_type = "multipart/form-data",
        description = "User fields with an optional profile image part named `file`",
    ),
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponseDto>),
        (status = 422, description = "Validation failed"),
        (status = 500, description = "User could not be created")
    )
)]
pub async fn create_user(
    State(service): State<Arc<UserService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UserResponseDto>>)> {
    let form = read_user_form(multipart).await?;

    let dto = CreateUserDto {
        firstname: form.field("firstname"),
        secondname: form.optional("secondname"),
        lastname: form.field("lastname"),
        username: form.field("username"),
        email: form.field("email"),
        password: form.field("password"),
    };
    dto.validate().map_err(AppError::from_validation_errors)?;

    if let Some(ref upload) = form.upload {
        validate_upload(upload)?;
    }

    let user = service.create(dto, form.upload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(user),
            Some("User created successfully".to_string()),
            None,
        )),
    ))
}

/// Edit a user
///
/// Same form shape as create, plus a required `id` field. Password and
/// profile image are optional; when absent the stored values remain.
#[utoipa::path(
    post,
    path = "/admin/users/edit-users",
    tag = "users",
    request_body(
        content = UpdateUserDto,
        content_type = "multipart/form-data",
        description = "User fields with the record `id` and an optional profile image part named `file`",
    ),
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserResponseDto>),
        (status = 400, description = "Missing or malformed id"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Validation failed"),
        (status = 500, description = "User could not be updated")
    )
)]
pub async fn edit_user(
    State(service): State<Arc<UserService>>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UserResponseDto>>> {
    let form = read_user_form(multipart).await?;

    let id: i64 = form
        .field("id")
        .parse()
        .map_err(|_| AppError::BadRequest("A numeric user id is required".to_string()))?;

    let dto = UpdateUserDto {
        firstname: form.field("firstname"),
        secondname: form.optional("secondname"),
        lastname: form.field("lastname"),
        username: form.field("username"),
        email: form.field("email"),
        password: form.optional("password"),
    };
    dto.validate().map_err(AppError::from_validation_errors)?;

    if let Some(ref upload) = form.upload {
        validate_upload(upload)?;
    }

    let user = service.update(id, dto, form.upload).await?;

    Ok(Json(ApiResponse::success(
        Some(user),
        Some("User updated successfully".to_string()),
        None,
    )))
}
