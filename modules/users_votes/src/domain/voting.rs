//! Voting: per-user cooldown and create-or-update of the (user, profile) vote.

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{NewVote, User, Vote};
use crate::domain::ctx::CallCtx;
use crate::domain::error::DomainError;
use crate::domain::repo::VoteWrite;
use crate::domain::service::Service;

impl Service {
    /// Cast or replace the voter's vote on a profile; returns the vote id.
    #[instrument(
        name = "users_votes.service.vote",
        skip(self, ctx, request),
        fields(user_id = request.user_id, profile_id = request.profile_id)
    )]
    pub async fn vote(&self, ctx: &CallCtx, request: NewVote) -> Result<i64, DomainError> {
        info!("Processing vote");

        // Any failure to load the voter is reported as a failed insertion.
        let voter = match self.get_user_by_id(ctx, request.user_id).await {
            Ok(voter) => voter,
            Err(e) if e.is_interrupted() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Voter lookup failed");
                return Err(DomainError::insertion_failed(e.to_string()));
            }
        };

        let now = Utc::now();
        self.ensure_cooled_down(&voter, now)?;

        let existing = ctx
            .guard(self.votes.find(request.user_id, request.profile_id))
            .await?
            .map_err(|e| DomainError::database(e.to_string()))?;

        // Vote write and cooldown stamp commit as one unit.
        let write = match existing {
            None => {
                debug!("No previous vote, creating one");
                VoteWrite::Insert(request)
            }
            Some(mut vote) => {
                debug!(vote_id = vote.id, "Replacing previous vote value");
                vote.value = request.value;
                vote.updated_at = now;
                VoteWrite::Update(vote)
            }
        };
        let inserting = matches!(write, VoteWrite::Insert(_));

        let vote_id = ctx
            .guard(self.votes.record(write, now))
            .await?
            .map_err(|e| {
                if inserting {
                    DomainError::insertion_failed(e.to_string())
                } else {
                    DomainError::database(e.to_string())
                }
            })?
            .id;

        info!(vote_id, "Vote recorded");
        Ok(vote_id)
    }

    /// Remove the voter's vote on a profile. A missing vote is an error.
    #[instrument(name = "users_votes.service.revoke_vote", skip(self, ctx))]
    pub async fn revoke_vote(
        &self,
        ctx: &CallCtx,
        user_id: i64,
        profile_id: i64,
    ) -> Result<(), DomainError> {
        info!("Revoking vote");

        let deleted = ctx
            .guard(self.votes.delete(user_id, profile_id))
            .await?
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !deleted {
            return Err(DomainError::vote_not_found(user_id, profile_id));
        }

        info!("Vote revoked");
        Ok(())
    }

    #[instrument(name = "users_votes.service.get_vote", skip(self, ctx))]
    pub async fn get_vote(
        &self,
        ctx: &CallCtx,
        user_id: i64,
        profile_id: i64,
    ) -> Result<Option<Vote>, DomainError> {
        ctx.guard(self.votes.find(user_id, profile_id))
            .await?
            .map_err(|e| DomainError::database(e.to_string()))
    }

    fn ensure_cooled_down(&self, voter: &User, now: DateTime<Utc>) -> Result<(), DomainError> {
        let Some(last) = voter.vote_updated_at else {
            return Ok(());
        };
        // A clock step backwards yields a negative elapsed time, treated as zero.
        let elapsed = (now - last).to_std().unwrap_or_default();
        if elapsed < self.config.vote_cooldown {
            let remaining = self.config.vote_cooldown - elapsed;
            warn!(remaining_secs = remaining.as_secs(), "Vote attempted during cooldown");
            return Err(DomainError::vote_cooldown(voter.id, remaining));
        }
        Ok(())
    }
}
