use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::core::error::{AppError, Result};
use crate::features::files::dtos::NewUpload;
use crate::features::files::{DeleteOutcome, FileStore};
use crate::features::users::dtos::{
    CreateUserDto, ListUsersQuery, UpdateUserDto, UserResponseDto,
};
use crate::features::users::models::User;
use crate::features::users::repository::{NewUser, UserChanges, UserListFilter, UserRepository};
use crate::shared::constants::USER_UPLOAD_FOLDER;
use crate::shared::password;

/// Service for user record management.
///
/// Create and edit are two-resource sagas: the optional profile image goes
/// to the file store first (the row needs the resulting identifier), then
/// the row is written. The upload cannot share the database transaction, so
/// a failed row write triggers a compensating delete of the file stored in
/// the same operation. Compensation is best-effort: its own failure is
/// logged and never replaces the originating error.
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    file_store: Arc<dyn FileStore>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, file_store: Arc<dyn FileStore>) -> Self {
        Self { repo, file_store }
    }

    /// List users with optional filters
    pub async fn list(&self, query: ListUsersQuery) -> Result<Vec<UserResponseDto>> {
        let filter = UserListFilter {
            name: query.name,
            username: query.username,
            email: query.email,
            state: query.state,
        };

        let users = self.repo.list(&filter).await?;
        Ok(users.into_iter().map(UserResponseDto::from).collect())
    }

    /// Create a user, optionally storing a profile image first.
    pub async fn create(
        &self,
        dto: CreateUserDto,
        upload: Option<NewUpload>,
    ) -> Result<UserResponseDto> {
        // Uniqueness is checked before any side effect so duplicate input
        // never reaches the file store.
        self.ensure_unique(&dto.username, &dto.email, None).await?;

        let mut stored_file_id: Option<i64> = None;
        if let Some(upload) = upload {
            let id = self.store_profile_image(upload).await?;
            stored_file_id = Some(id);
        }

        match self.persist_new_user(dto, stored_file_id).await {
            Ok(user) => {
                info!("User created: id={}, username={}", user.id, user.username);
                Ok(user.into())
            }
            Err(err) => {
                error!(
                    "Error creating user (file_id={:?}): {}",
                    stored_file_id, err
                );
                if let Some(file_id) = stored_file_id {
                    self.rollback_stored_file(file_id).await;
                }
                Err(err)
            }
        }
    }

    /// Update a user, optionally replacing its profile image.
    pub async fn update(
        &self,
        id: i64,
        dto: UpdateUserDto,
        upload: Option<NewUpload>,
    ) -> Result<UserResponseDto> {
        // Fetched first so we know the currently-associated file; a missing
        // record fails before any upload or write happens.
        let existing = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;
        let old_file_id = existing.file_id;

        self.ensure_unique(&dto.username, &dto.email, Some(id)).await?;

        let mut new_file_id: Option<i64> = None;
        if let Some(upload) = upload {
            // Upload failure aborts here: nothing was written yet, so there
            // is nothing to compensate.
            let file_id = self.store_profile_image(upload).await?;
            new_file_id = Some(file_id);
        }

        match self.persist_user_changes(id, dto, new_file_id).await {
            Ok(user) => {
                // Post-commit cleanup of the replaced image. The update is
                // already committed; a failure here is logged only.
                if let (Some(_), Some(old_id)) = (new_file_id, old_file_id) {
                    match self.file_store.delete(old_id).await {
                        Ok(DeleteOutcome::Deleted) => {
                            debug!("Replaced profile image {} deleted", old_id)
                        }
                        Ok(DeleteOutcome::NothingToDelete) => {
                            debug!("Replaced profile image {} was already gone", old_id)
                        }
                        Err(e) => warn!(
                            "Failed to delete replaced profile image {}: {}",
                            old_id, e
                        ),
                    }
                }
                info!("User updated: id={}, username={}", user.id, user.username);
                Ok(user.into())
            }
            Err(err) => {
                error!(
                    "Error updating user {} (new file_id={:?}): {}",
                    id, new_file_id, err
                );
                // Only the file stored by this operation is compensated; the
                // old file was never part of this write set.
                if let Some(file_id) = new_file_id {
                    self.rollback_stored_file(file_id).await;
                }
                Err(err)
            }
        }
    }

    async fn store_profile_image(&self, upload: NewUpload) -> Result<i64> {
        let id = self
            .file_store
            .store(upload, Some(USER_UPLOAD_FOLDER))
            .await?;

        if id <= 0 {
            return Err(AppError::FileStorage(format!(
                "file store returned an invalid identifier: {}",
                id
            )));
        }

        Ok(id)
    }

    async fn persist_new_user(&self, dto: CreateUserDto, file_id: Option<i64>) -> Result<User> {
        let password_hash = password::hash_password(&dto.password).await?;

        self.repo
            .insert(NewUser {
                firstname: dto.firstname,
                secondname: dto.secondname,
                lastname: dto.lastname,
                username: dto.username,
                email: dto.email,
                password_hash,
                file_id,
            })
            .await
            .map_err(|err| match err {
                AppError::Database(e) => AppError::CreateFailed(e.to_string()),
                other => other,
            })
    }

    async fn persist_user_changes(
        &self,
        id: i64,
        dto: UpdateUserDto,
        file_id: Option<i64>,
    ) -> Result<User> {
        // An empty password means "keep the stored hash", same as absent.
        let password_hash = match dto.password.as_deref().filter(|p| !p.is_empty()) {
            Some(plain) => Some(password::hash_password(plain).await?),
            None => None,
        };

        let updated = self
            .repo
            .update(
                id,
                UserChanges {
                    firstname: dto.firstname,
                    secondname: dto.secondname,
                    lastname: dto.lastname,
                    username: dto.username,
                    email: dto.email,
                    password_hash,
                    file_id,
                },
            )
            .await
            .map_err(|err| match err {
                AppError::Database(e) => AppError::UpdateFailed(e.to_string()),
                other => other,
            })?;

        if !updated {
            return Err(AppError::UpdateFailed(format!(
                "user {} was not updated",
                id
            )));
        }

        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UpdateFailed(format!("user {} vanished after update", id)))
    }

    /// Compensating delete for a file stored earlier in a failed operation.
    /// Best-effort: failures are logged, never surfaced.
    async fn rollback_stored_file(&self, file_id: i64) {
        match self.file_store.delete(file_id).await {
            Ok(_) => info!("Rolled back: file {} deleted", file_id),
            Err(e) => error!("Error deleting file {} during rollback: {}", file_id, e),
        }
    }

    async fn ensure_unique(
        &self,
        username: &str,
        email: &str,
        exclude_id: Option<i64>,
    ) -> Result<()> {
        if self.repo.username_exists(username, exclude_id).await? {
            return Err(AppError::field_error(
                "username",
                "username is already taken",
            ));
        }
        if self.repo.email_exists(email, exclude_id).await? {
            return Err(AppError::field_error(
                "email",
                "email is already registered",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::test_support::{MockFileStore, MockUserRepository};

    fn create_dto() -> CreateUserDto {
        CreateUserDto {
            firstname: "Ana".to_string(),
            secondname: None,
            lastname: "Lopez".to_string(),
            username: "ana_lopez".to_string(),
            email: "ana@example.com".to_string(),
            password: "Secret1x".to_string(),
        }
    }

    fn update_dto() -> UpdateUserDto {
        UpdateUserDto {
            firstname: "Ana".to_string(),
            secondname: None,
            lastname: "Lopez".to_string(),
            username: "ana_lopez".to_string(),
            email: "ana@example.com".to_string(),
            password: None,
        }
    }

    fn upload() -> NewUpload {
        NewUpload {
            data: b"png-bytes".to_vec(),
            original_name: "avatar.png".to_string(),
            content_type: "image/png".to_string(),
        }
    }

    fn service(
        repo: Arc<MockUserRepository>,
        files: Arc<MockFileStore>,
    ) -> UserService {
        UserService::new(repo, files)
    }

    #[tokio::test]
    async fn create_without_file_never_touches_file_store() {
        let repo = Arc::new(MockUserRepository::default());
        let files = Arc::new(MockFileStore::default());
        let svc = service(repo.clone(), files.clone());

        let result = svc.create(create_dto(), None).await.unwrap();

        assert_eq!(result.username, "ana_lopez");
        assert_eq!(files.store_calls(), 0);
        assert!(files.deleted_ids().is_empty());
    }

    #[tokio::test]
    async fn create_hashes_password_before_insert() {
        let repo = Arc::new(MockUserRepository::default());
        let files = Arc::new(MockFileStore::default());
        let svc = service(repo.clone(), files);

        svc.create(create_dto(), None).await.unwrap();

        let inserted = repo.inserted().expect("user row inserted");
        assert_ne!(inserted.password_hash, "Secret1x");
        assert!(bcrypt::verify("Secret1x", &inserted.password_hash).unwrap());
    }

    #[tokio::test]
    async fn create_upload_failure_rolls_back_without_insert() {
        let repo = Arc::new(MockUserRepository::default());
        let files = Arc::new(MockFileStore::default().failing_store());
        let svc = service(repo.clone(), files.clone());

        let err = svc.create(create_dto(), Some(upload())).await.unwrap_err();

        assert!(matches!(err, AppError::FileStorage(_)));
        assert!(repo.inserted().is_none());
        // Nothing was stored, so nothing to compensate
        assert!(files.deleted_ids().is_empty());
    }

    #[tokio::test]
    async fn create_insert_failure_compensates_stored_file() {
        let repo = Arc::new(MockUserRepository::default().failing_insert());
        let files = Arc::new(MockFileStore::with_next_id(7));
        let svc = service(repo, files.clone());

        let err = svc.create(create_dto(), Some(upload())).await.unwrap_err();

        assert!(matches!(err, AppError::CreateFailed(_)));
        assert_eq!(files.deleted_ids(), vec![7]);
    }

    #[tokio::test]
    async fn create_insert_failure_surfaces_original_error_when_delete_also_fails() {
        let repo = Arc::new(MockUserRepository::default().failing_insert());
        let files = Arc::new(MockFileStore::with_next_id(7).failing_delete());
        let svc = service(repo, files.clone());

        let err = svc.create(create_dto(), Some(upload())).await.unwrap_err();

        // The persistence error wins; the compensating-delete failure is
        // logged only.
        assert!(matches!(err, AppError::CreateFailed(_)));
        assert_eq!(files.deleted_ids(), vec![7]);
    }

    #[tokio::test]
    async fn create_success_keeps_stored_file() {
        let repo = Arc::new(MockUserRepository::default());
        let files = Arc::new(MockFileStore::with_next_id(7));
        let svc = service(repo.clone(), files.clone());

        svc.create(create_dto(), Some(upload())).await.unwrap();

        let inserted = repo.inserted().expect("user row inserted");
        assert_eq!(inserted.file_id, Some(7));
        assert!(files.deleted_ids().is_empty());
    }

    #[tokio::test]
    async fn create_duplicate_username_fails_before_side_effects() {
        let repo = Arc::new(MockUserRepository::default().username_taken());
        let files = Arc::new(MockFileStore::default());
        let svc = service(repo.clone(), files.clone());

        let err = svc.create(create_dto(), Some(upload())).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(files.store_calls(), 0);
        assert!(repo.inserted().is_none());
    }

    #[tokio::test]
    async fn update_missing_user_fails_before_any_side_effect() {
        let repo = Arc::new(MockUserRepository::default()); // no seeded user
        let files = Arc::new(MockFileStore::default());
        let svc = service(repo, files.clone());

        let err = svc.update(42, update_dto(), Some(upload())).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(files.store_calls(), 0);
    }

    #[tokio::test]
    async fn update_without_password_keeps_stored_hash() {
        let repo = Arc::new(MockUserRepository::with_user(1, None));
        let files = Arc::new(MockFileStore::default());
        let svc = service(repo.clone(), files);

        svc.update(1, update_dto(), None).await.unwrap();

        let changes = repo.last_update().expect("update applied");
        assert!(changes.password_hash.is_none());
        assert_eq!(repo.stored_password(), Some("$old-hash$".to_string()));
    }

    #[tokio::test]
    async fn update_empty_password_treated_as_absent() {
        let repo = Arc::new(MockUserRepository::with_user(1, None));
        let files = Arc::new(MockFileStore::default());
        let svc = service(repo.clone(), files);

        let dto = UpdateUserDto {
            password: Some(String::new()),
            ..update_dto()
        };
        svc.update(1, dto, None).await.unwrap();

        let changes = repo.last_update().expect("update applied");
        assert!(changes.password_hash.is_none());
    }

    #[tokio::test]
    async fn update_with_password_stores_new_hash() {
        let repo = Arc::new(MockUserRepository::with_user(1, None));
        let files = Arc::new(MockFileStore::default());
        let svc = service(repo.clone(), files);

        let dto = UpdateUserDto {
            password: Some("NewSecret2y".to_string()),
            ..update_dto()
        };
        svc.update(1, dto, None).await.unwrap();

        let changes = repo.last_update().expect("update applied");
        let hash = changes.password_hash.expect("password included");
        assert!(bcrypt::verify("NewSecret2y", &hash).unwrap());
    }

    #[tokio::test]
    async fn update_replacing_file_deletes_old_one_after_commit() {
        let repo = Arc::new(MockUserRepository::with_user(1, Some(3)));
        let files = Arc::new(MockFileStore::with_next_id(7));
        let svc = service(repo.clone(), files.clone());

        svc.update(1, update_dto(), Some(upload())).await.unwrap();

        let changes = repo.last_update().expect("update applied");
        assert_eq!(changes.file_id, Some(7));
        // Old image cleaned up exactly once, new one kept
        assert_eq!(files.deleted_ids(), vec![3]);
    }

    #[tokio::test]
    async fn update_old_file_delete_failure_does_not_fail_the_update() {
        let repo = Arc::new(MockUserRepository::with_user(1, Some(3)));
        let files = Arc::new(MockFileStore::with_next_id(7).failing_delete());
        let svc = service(repo, files.clone());

        let result = svc.update(1, update_dto(), Some(upload())).await;

        assert!(result.is_ok());
        assert_eq!(files.deleted_ids(), vec![3]);
    }

    #[tokio::test]
    async fn update_tolerates_old_file_already_gone() {
        let repo = Arc::new(MockUserRepository::with_user(1, Some(3)));
        let files = Arc::new(MockFileStore::with_next_id(7).delete_finds_nothing());
        let svc = service(repo, files.clone());

        let result = svc.update(1, update_dto(), Some(upload())).await;

        assert!(result.is_ok());
        assert_eq!(files.deleted_ids(), vec![3]);
    }

    #[tokio::test]
    async fn update_failure_compensates_new_file_and_leaves_old_untouched() {
        let repo = Arc::new(MockUserRepository::with_user(1, Some(3)).failing_update());
        let files = Arc::new(MockFileStore::with_next_id(7));
        let svc = service(repo, files.clone());

        let err = svc.update(1, update_dto(), Some(upload())).await.unwrap_err();

        assert!(matches!(err, AppError::UpdateFailed(_)));
        // Only the file stored by this operation is rolled back
        assert_eq!(files.deleted_ids(), vec![7]);
    }

    #[tokio::test]
    async fn update_zero_rows_affected_is_update_failed() {
        let repo = Arc::new(MockUserRepository::with_user(1, None).update_affects_nothing());
        let files = Arc::new(MockFileStore::default());
        let svc = service(repo, files);

        let err = svc.update(1, update_dto(), None).await.unwrap_err();

        assert!(matches!(err, AppError::UpdateFailed(_)));
    }

    #[tokio::test]
    async fn update_upload_failure_leaves_everything_untouched() {
        let repo = Arc::new(MockUserRepository::with_user(1, Some(3)));
        let files = Arc::new(MockFileStore::default().failing_store());
        let svc = service(repo.clone(), files.clone());

        let err = svc.update(1, update_dto(), Some(upload())).await.unwrap_err();

        assert!(matches!(err, AppError::FileStorage(_)));
        assert!(repo.last_update().is_none());
        assert!(files.deleted_ids().is_empty());
    }
}
