//! PostgreSQL implementation of UserRepository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, UserId, UserRole};
use crate::domain::user::User;
use crate::ports::{ClaimResult, UserRepository};

/// PostgreSQL implementation of the UserRepository port.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new repository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a user.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    full_name: Option<String>,
    role: String,
    stripe_customer_id: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = UserRole::parse(&row.role).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid role value: {}", row.role),
            )
        })?;

        Ok(User {
            id: UserId::from_uuid(row.id),
            email: row.email,
            full_name: row.full_name,
            role,
            stripe_customer_id: row.stripe_customer_id,
        })
    }
}

const USER_COLUMNS: &str = "id, email, full_name, role, stripe_customer_id";

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find user: {}", e)))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE stripe_customer_id = $1",
            USER_COLUMNS
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find user: {}", e)))?;

        row.map(User::try_from).transpose()
    }

    async fn claim_stripe_customer_id(
        &self,
        user_id: &UserId,
        customer_id: &str,
    ) -> Result<ClaimResult, DomainError> {
        // Conditional single-statement write: exactly one concurrent caller
        // can move the column from NULL, which is what keeps the identifier
        // set-at-most-once.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET stripe_customer_id = $2, updated_at = NOW()
            WHERE id = $1 AND stripe_customer_id IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(customer_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to claim customer id: {}", e)))?;

        if result.rows_affected() == 1 {
            Ok(ClaimResult::Claimed)
        } else {
            Ok(ClaimResult::AlreadySet)
        }
    }
}
