use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::Result;
use crate::features::users::models::User;

/// Filters for the user listing; `None` fields match everything
#[derive(Debug, Clone, Default)]
pub struct UserListFilter {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub state: Option<String>,
}

/// Payload for inserting a user row. The password arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub firstname: String,
    pub secondname: Option<String>,
    pub lastname: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub file_id: Option<i64>,
}

/// Payload for updating a user row.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub firstname: String,
    pub secondname: Option<String>,
    pub lastname: String,
    pub username: String,
    pub email: String,
    /// `None` preserves the stored hash
    pub password_hash: Option<String>,
    /// `None` preserves the current file reference
    pub file_id: Option<i64>,
}

/// Persistence seam for user records. The concrete implementation owns the
/// transaction around each write; the service layer owns the cross-resource
/// saga on top of it.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self, filter: &UserListFilter) -> Result<Vec<User>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn insert(&self, new_user: NewUser) -> Result<User>;

    /// Returns `false` when no row was affected
    async fn update(&self, id: i64, changes: UserChanges) -> Result<bool>;

    async fn username_exists(&self, username: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> Result<bool>;
}

const USER_COLUMNS: &str = r#"
    u.id, u.firstname, u.secondname, u.lastname, u.username, u.email,
    u.password, u.state, u.file_id, f.path AS profile_image,
    u.created_at, u.updated_at
"#;

/// Postgres-backed user repository
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list(&self, filter: &UserListFilter) -> Result<Vec<User>> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u
            LEFT JOIN files f ON f.id = u.file_id
            WHERE ($1 = '' OR u.firstname ILIKE '%' || $1 || '%'
                          OR u.secondname ILIKE '%' || $1 || '%'
                          OR u.lastname ILIKE '%' || $1 || '%')
              AND ($2 = '' OR u.username ILIKE '%' || $2 || '%')
              AND ($3 = '' OR u.email ILIKE '%' || $3 || '%')
              AND ($4 = '' OR u.state = $4)
            ORDER BY u.id
            "#
        );

        let users = sqlx::query_as::<_, User>(&sql)
            .bind(filter.name.as_deref().unwrap_or(""))
            .bind(filter.username.as_deref().unwrap_or(""))
            .bind(filter.email.as_deref().unwrap_or(""))
            .bind(filter.state.as_deref().unwrap_or(""))
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u
            LEFT JOIN files f ON f.id = u.file_id
            WHERE u.id = $1
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn insert(&self, new_user: NewUser) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO users (firstname, secondname, lastname, username, email, password, file_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&new_user.firstname)
        .bind(&new_user.secondname)
        .bind(&new_user.lastname)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.file_id)
        .fetch_one(&mut *tx)
        .await?;

        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u
            LEFT JOIN files f ON f.id = u.file_id
            WHERE u.id = $1
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET firstname = $2,
                secondname = $3,
                lastname = $4,
                username = $5,
                email = $6,
                password = COALESCE($7, password),
                file_id = COALESCE($8, file_id),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.firstname)
        .bind(&changes.secondname)
        .bind(&changes.lastname)
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(changes.file_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn username_exists(&self, username: &str, exclude_id: Option<i64>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE username = $1 AND ($2::bigint IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(username)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn email_exists(&self, email: &str, exclude_id: Option<i64>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE email = $1 AND ($2::bigint IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
