use utoipa::{Modify, OpenApi};

use crate::features::users::dtos as users_dtos;
use crate::features::users::handlers::user_handler;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        user_handler::get_list_users,
        user_handler::create_user,
        user_handler::edit_user,
    ),
    components(
        schemas(
            Meta,
            users_dtos::CreateUserDto,
            users_dtos::UpdateUserDto,
            users_dtos::UserResponseDto,
            ApiResponse<users_dtos::UserResponseDto>,
            ApiResponse<Vec<users_dtos::UserResponseDto>>,
        )
    ),
    tags(
        (name = "users", description = "Backoffice user administration"),
    ),
    info(
        title = "Backoffice API",
        version = "0.1.0",
        description = "API documentation for the backoffice user administration service",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
