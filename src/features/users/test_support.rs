//! Hand-rolled mocks for exercising the user service without a database or
//! a real disk store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::NewUpload;
use crate::features::files::models::File;
use crate::features::files::{DeleteOutcome, FileStore, FileStoreError};
use crate::features::users::models::User;
use crate::features::users::repository::{NewUser, UserChanges, UserListFilter, UserRepository};

fn backend_error() -> sqlx::Error {
    sqlx::Error::PoolClosed
}

/// In-memory repository holding at most one user row.
#[derive(Default)]
pub struct MockUserRepository {
    user: Mutex<Option<User>>,
    inserted: Mutex<Option<NewUser>>,
    updates: Mutex<Vec<UserChanges>>,
    fail_insert: bool,
    fail_update: bool,
    update_affects_zero: bool,
    username_taken: bool,
    email_taken: bool,
}

impl MockUserRepository {
    /// Seed the repository with a user under `id`, optionally referencing a
    /// stored file. The seeded password hash is `$old-hash$`.
    pub fn with_user(id: i64, file_id: Option<i64>) -> Self {
        let user = User {
            id,
            firstname: "Ana".to_string(),
            secondname: None,
            lastname: "Lopez".to_string(),
            username: "ana_lopez".to_string(),
            email: "ana@example.com".to_string(),
            password: "$old-hash$".to_string(),
            state: "A".to_string(),
            file_id,
            profile_image: file_id.map(|_| "uploads/users/old.png".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        Self {
            user: Mutex::new(Some(user)),
            ..Self::default()
        }
    }

    pub fn failing_insert(mut self) -> Self {
        self.fail_insert = true;
        self
    }

    pub fn failing_update(mut self) -> Self {
        self.fail_update = true;
        self
    }

    pub fn update_affects_nothing(mut self) -> Self {
        self.update_affects_zero = true;
        self
    }

    pub fn username_taken(mut self) -> Self {
        self.username_taken = true;
        self
    }

    pub fn email_taken(mut self) -> Self {
        self.email_taken = true;
        self
    }

    pub fn inserted(&self) -> Option<NewUser> {
        self.inserted.lock().unwrap().clone()
    }

    pub fn last_update(&self) -> Option<UserChanges> {
        self.updates.lock().unwrap().last().cloned()
    }

    pub fn stored_password(&self) -> Option<String> {
        self.user.lock().unwrap().as_ref().map(|u| u.password.clone())
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn list(&self, _filter: &UserListFilter) -> Result<Vec<User>> {
        Ok(self.user.lock().unwrap().clone().into_iter().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self
            .user
            .lock()
            .unwrap()
            .clone()
            .filter(|u| u.id == id))
    }

    async fn insert(&self, new_user: NewUser) -> Result<User> {
        if self.fail_insert {
            return Err(AppError::Database(backend_error()));
        }

        let user = User {
            id: 1,
            firstname: new_user.firstname.clone(),
            secondname: new_user.secondname.clone(),
            lastname: new_user.lastname.clone(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password: new_user.password_hash.clone(),
            state: "A".to_string(),
            file_id: new_user.file_id,
            profile_image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        *self.inserted.lock().unwrap() = Some(new_user);
        *self.user.lock().unwrap() = Some(user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<bool> {
        if self.fail_update {
            return Err(AppError::Database(backend_error()));
        }

        self.updates.lock().unwrap().push(changes.clone());

        if self.update_affects_zero {
            return Ok(false);
        }

        let mut guard = self.user.lock().unwrap();
        match guard.as_mut().filter(|u| u.id == id) {
            Some(user) => {
                user.firstname = changes.firstname;
                user.secondname = changes.secondname;
                user.lastname = changes.lastname;
                user.username = changes.username;
                user.email = changes.email;
                if let Some(hash) = changes.password_hash {
                    user.password = hash;
                }
                if let Some(file_id) = changes.file_id {
                    user.file_id = Some(file_id);
                }
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn username_exists(&self, _username: &str, _exclude_id: Option<i64>) -> Result<bool> {
        Ok(self.username_taken)
    }

    async fn email_exists(&self, _email: &str, _exclude_id: Option<i64>) -> Result<bool> {
        Ok(self.email_taken)
    }
}

/// File store that hands out a fixed identifier and records every call.
#[derive(Default)]
pub struct MockFileStore {
    next_id: i64,
    store_calls: AtomicUsize,
    deleted: Mutex<Vec<i64>>,
    fail_store: bool,
    fail_delete: bool,
    delete_missing: bool,
}

impl MockFileStore {
    pub fn with_next_id(id: i64) -> Self {
        Self {
            next_id: id,
            ..Self::default()
        }
    }

    pub fn failing_store(mut self) -> Self {
        self.fail_store = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn delete_finds_nothing(mut self) -> Self {
        self.delete_missing = true;
        self
    }

    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    pub fn deleted_ids(&self) -> Vec<i64> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileStore for MockFileStore {
    async fn store(
        &self,
        _upload: NewUpload,
        _folder: Option<&str>,
    ) -> std::result::Result<i64, FileStoreError> {
        if self.fail_store {
            return Err(FileStoreError::Storage(std::io::Error::other(
                "disk unavailable",
            )));
        }

        self.store_calls.fetch_add(1, Ordering::SeqCst);
        let id = if self.next_id > 0 { self.next_id } else { 1 };
        Ok(id)
    }

    async fn find_by_id(&self, id: i64) -> std::result::Result<Option<File>, FileStoreError> {
        Ok(Some(File {
            id,
            path: format!("uploads/users/{id}.png"),
            original_name: "avatar.png".to_string(),
            created_at: Utc::now(),
        }))
    }

    async fn delete(&self, id: i64) -> std::result::Result<DeleteOutcome, FileStoreError> {
        self.deleted.lock().unwrap().push(id);

        if self.fail_delete {
            return Err(FileStoreError::Catalog(backend_error()));
        }
        if self.delete_missing {
            return Ok(DeleteOutcome::NothingToDelete);
        }
        Ok(DeleteOutcome::Deleted)
    }
}
