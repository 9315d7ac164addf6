use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::contract::model::{NewUser, NewVote, User, Vote};

/// Failure reported by a storage adapter.
///
/// Adapters only distinguish what the domain reacts to; everything else is
/// carried as context-rich `anyhow` errors.
#[derive(Error, Debug)]
pub enum RepoError {
    /// A unique index rejected the write (live email, vote pair).
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Port for the domain layer: user persistence the service needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Insert a new user; storage assigns the id.
    async fn insert(&self, u: NewUser) -> RepoResult<User>;

    /// Load a user by id whatever its soft-delete state.
    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>>;

    /// Load a user by id, treating soft-deleted rows as absent.
    async fn find_live_by_id(&self, id: i64) -> RepoResult<Option<User>>;

    /// Load the live user holding `email`.
    async fn find_live_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    /// Check uniqueness by email among live users.
    async fn live_email_exists(&self, email: &str) -> RepoResult<bool>;

    /// Overwrite a user (by primary key in `u.id`) only while its row is
    /// still live. Returns false when no live row matched.
    async fn update_live(&self, u: User) -> RepoResult<bool>;

    /// Live users in storage order.
    async fn list_live(&self, limit: u64, offset: u64) -> RepoResult<Vec<User>>;

    async fn count_live(&self) -> RepoResult<u64>;
}

/// Vote write recorded together with the voter's cooldown stamp.
#[derive(Debug, Clone)]
pub enum VoteWrite {
    /// New vote; storage assigns id and timestamps.
    Insert(NewVote),
    /// Value and `updated_at` of an existing vote.
    Update(Vote),
}

/// Port for vote persistence keyed by (user, profile).
#[async_trait]
pub trait VotesRepository: Send + Sync {
    async fn find(&self, user_id: i64, profile_id: i64) -> RepoResult<Option<Vote>>;

    /// Apply `write`, then set the voter's `vote_updated_at` to `voted_at`.
    /// Both persist or neither does, including when the returned future is
    /// dropped before completion.
    async fn record(&self, write: VoteWrite, voted_at: DateTime<Utc>) -> RepoResult<Vote>;

    /// Delete by pair. Returns true if a row was deleted.
    async fn delete(&self, user_id: i64, profile_id: i64) -> RepoResult<bool>;
}
