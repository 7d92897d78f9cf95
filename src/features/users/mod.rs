//! User administration feature.
//!
//! List, create and edit backoffice user records. Writes that involve a
//! profile image run as a two-step saga against the file store and the
//! database, with compensating deletes when the database step fails.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/admin/users/get-list-users` | Filterable user listing |
//! | POST | `/admin/users/create-users` | Create user (multipart, optional image) |
//! | POST | `/admin/users/edit-users` | Edit user (multipart, optional image) |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;

#[cfg(test)]
pub mod test_support;

pub use repository::{PgUserRepository, UserRepository};
pub use services::UserService;
