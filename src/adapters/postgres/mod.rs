//! PostgreSQL adapters - implement the repository ports with sqlx.

mod subscription_repository;
mod user_repository;

pub use subscription_repository::PostgresSubscriptionRepository;
pub use user_repository::PostgresUserRepository;
