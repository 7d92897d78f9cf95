use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::features::files::dtos::MAX_PROFILE_IMAGE_SIZE;
use crate::features::users::handlers;
use crate::features::users::services::UserService;

pub fn routes(service: Arc<UserService>) -> Router {
    // The limit leaves headroom over the image cap so an oversized upload
    // reaches the handler and gets a field error instead of a 413.
    Router::new()
        .route(
            "/admin/users/get-list-users",
            get(handlers::get_list_users),
        )
        .route(
            "/admin/users/create-users",
            post(handlers::create_user),
        )
        .route("/admin/users/edit-users", post(handlers::edit_user))
        .layer(DefaultBodyLimit::max(MAX_PROFILE_IMAGE_SIZE + 1024 * 1024))
        .with_state(service)
}
