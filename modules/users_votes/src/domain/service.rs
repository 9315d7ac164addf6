use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{NewUser, User, UserPatch};
use crate::domain::ctx::CallCtx;
use crate::domain::error::DomainError;
use crate::domain::repo::{RepoError, UsersRepository, VotesRepository};

/// Domain service with business rules for users and their votes.
/// Depends only on the repository ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    pub(crate) users: Arc<dyn UsersRepository>,
    pub(crate) votes: Arc<dyn VotesRepository>,
    pub(crate) config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Minimum time between two votes of the same user, whatever the profile.
    pub vote_cooldown: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            vote_cooldown: Duration::from_secs(60 * 60),
        }
    }
}

/// Which rows the update pipeline may start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fetch {
    Live,
    Any,
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(
        users: Arc<dyn UsersRepository>,
        votes: Arc<dyn VotesRepository>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            users,
            votes,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    #[instrument(
        name = "users_votes.service.create_user",
        skip(self, ctx, new_user),
        fields(email = %new_user.email)
    )]
    pub async fn create_user(&self, ctx: &CallCtx, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");

        let user = ctx
            .guard(self.users.insert(new_user))
            .await?
            .map_err(|e| {
                warn!(error = %e, "User insert rejected by storage");
                DomainError::insertion_failed(e.to_string())
            })?;

        info!(user_id = user.id, "Successfully created user");
        Ok(user)
    }

    #[instrument(name = "users_votes.service.get_user", skip(self, ctx), fields(user_id = id))]
    pub async fn get_user(&self, ctx: &CallCtx, id: i64) -> Result<User, DomainError> {
        debug!("Getting live user by id");
        self.fetch(ctx, id, Fetch::Live).await
    }

    /// Lookup that ignores the soft-delete marker.
    #[instrument(name = "users_votes.service.get_user_by_id", skip(self, ctx), fields(user_id = id))]
    pub async fn get_user_by_id(&self, ctx: &CallCtx, id: i64) -> Result<User, DomainError> {
        debug!("Getting user by id regardless of deletion");
        self.fetch(ctx, id, Fetch::Any).await
    }

    /// Absence is not an error here: `Ok(None)` when no live user holds `email`.
    #[instrument(name = "users_votes.service.get_user_by_email", skip(self, ctx))]
    pub async fn get_user_by_email(
        &self,
        ctx: &CallCtx,
        email: &str,
    ) -> Result<Option<User>, DomainError> {
        debug!("Looking up user by email");
        ctx.guard(self.users.find_live_by_email(email))
            .await?
            .map_err(|e| DomainError::database(e.to_string()))
    }

    #[instrument(
        name = "users_votes.service.update_user",
        skip(self, ctx, patch),
        fields(user_id = id)
    )]
    pub async fn update_user(
        &self,
        ctx: &CallCtx,
        id: i64,
        patch: UserPatch,
    ) -> Result<User, DomainError> {
        info!("Updating user");
        let user = self.apply_patch(ctx, id, patch, Fetch::Live).await?;
        info!("Successfully updated user");
        Ok(user)
    }

    /// Soft delete: stamps `deleted_at` through the update pipeline.
    ///
    /// Deleting an already deleted user keeps its original timestamp and
    /// writes nothing.
    #[instrument(name = "users_votes.service.delete_user", skip(self, ctx), fields(user_id = id))]
    pub async fn delete_user(&self, ctx: &CallCtx, id: i64) -> Result<User, DomainError> {
        info!("Deleting user");
        let user = self
            .apply_patch(ctx, id, UserPatch::deletion(Utc::now()), Fetch::Any)
            .await?;
        info!("Successfully deleted user");
        Ok(user)
    }

    /// One page of live users; pages are 1-based.
    #[instrument(name = "users_votes.service.list_users", skip(self, ctx))]
    pub async fn list_users(
        &self,
        ctx: &CallCtx,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<User>, DomainError> {
        debug!("Listing users");

        if page < 1 {
            return Err(DomainError::validation("page", "must be at least 1"));
        }
        if page_size < 1 {
            return Err(DomainError::validation("page_size", "must be at least 1"));
        }
        let offset = (page - 1)
            .checked_mul(page_size)
            .ok_or_else(|| DomainError::validation("page", "offset out of range"))?;

        let users = ctx
            .guard(self.users.list_live(page_size, offset))
            .await?
            .map_err(|e| DomainError::database(e.to_string()))?;

        debug!("Successfully listed {} users", users.len());
        Ok(users)
    }

    #[instrument(name = "users_votes.service.count_users", skip(self, ctx))]
    pub async fn count_users(&self, ctx: &CallCtx) -> Result<u64, DomainError> {
        ctx.guard(self.users.count_live())
            .await?
            .map_err(|e| DomainError::database(e.to_string()))
    }

    // --- pipeline helpers ---

    async fn fetch(&self, ctx: &CallCtx, id: i64, scope: Fetch) -> Result<User, DomainError> {
        let found = match scope {
            Fetch::Live => ctx.guard(self.users.find_live_by_id(id)).await?,
            Fetch::Any => ctx.guard(self.users.find_by_id(id)).await?,
        };
        found
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| {
                warn!("No user found with the given id");
                DomainError::user_not_found(id)
            })
    }

    /// Fetch, merge and persist, each step completing before the next.
    async fn apply_patch(
        &self,
        ctx: &CallCtx,
        id: i64,
        patch: UserPatch,
        scope: Fetch,
    ) -> Result<User, DomainError> {
        // Step 1: fetch
        let current = self.fetch(ctx, id, scope).await?;
        if current.is_deleted() {
            debug!("User already deleted, nothing to merge");
            return Ok(current);
        }

        // Step 2: merge
        let merged = self.merge(ctx, current.clone(), &patch).await?;
        if merged == current {
            debug!("Patch carries no changes");
            return Ok(current);
        }

        // Step 3: persist
        ctx.ensure_active()?;
        let updated = ctx
            .guard(self.users.update_live(merged.clone()))
            .await?
            .map_err(|e| match e {
                RepoError::UniqueViolation(_) => {
                    DomainError::email_already_exists(merged.email.clone())
                }
                RepoError::Other(e) => DomainError::database(e.to_string()),
            })?;
        if !updated {
            warn!("User vanished between fetch and save");
            return Err(DomainError::user_not_found(id));
        }

        Ok(merged)
    }

    async fn merge(
        &self,
        ctx: &CallCtx,
        mut user: User,
        patch: &UserPatch,
    ) -> Result<User, DomainError> {
        if let Some(email) = patch.email() {
            if email != user.email {
                let taken = ctx
                    .guard(self.users.live_email_exists(email))
                    .await?
                    .map_err(|e| DomainError::database(e.to_string()))?;
                if taken {
                    warn!("The email is already occupied by another user");
                    return Err(DomainError::email_already_exists(email));
                }
                user.email = email.to_owned();
            }
        }

        if let Some(first_name) = patch.first_name() {
            user.first_name = first_name.to_owned();
        }
        if let Some(last_name) = patch.last_name() {
            user.last_name = last_name.to_owned();
        }
        if let Some(password) = patch.password() {
            user.password = password.to_owned();
        }
        if let Some(role_id) = patch.role_id() {
            user.role_id = Some(role_id);
        }
        if let Some(deleted_at) = patch.deleted_at {
            user.deleted_at = Some(deleted_at);
        }

        Ok(user)
    }
}
