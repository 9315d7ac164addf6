//! SeaORM-backed implementations of the domain ports.
//!
//! Both repositories are generic over `C: ConnectionTrait`, so they can be
//! built on a `DatabaseConnection` **or** a transaction.
//! Writes that back a service check are conditional: user saves only hit live
//! rows, and the unique indexes created by the migrations reject duplicate
//! live emails and duplicate (user, profile) votes.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

use crate::contract::model::{NewUser, NewVote, User, Vote};
use crate::domain::repo::{
    RepoError, RepoResult, UsersRepository, VoteWrite, VotesRepository,
};
use crate::infra::storage::entity::user::{
    ActiveModel as UserAM, Column as UserColumn, Entity as UserEntity,
};
use crate::infra::storage::entity::vote::{
    ActiveModel as VoteAM, Column as VoteColumn, Entity as VoteEntity,
};

fn db_err(e: DbErr, what: &'static str) -> RepoError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => RepoError::UniqueViolation(msg),
        _ => RepoError::Other(anyhow!(e).context(what)),
    }
}

/// SeaORM users repository.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn insert(&self, u: NewUser) -> RepoResult<User> {
        let m = UserAM {
            id: NotSet,
            email: Set(u.email),
            first_name: Set(u.first_name),
            last_name: Set(u.last_name),
            password: Set(u.password),
            role_id: Set(u.role_id.filter(|id| *id != 0)),
            vote_updated_at: Set(None),
            deleted_at: Set(None),
        };
        let model = m
            .insert(&self.conn)
            .await
            .map_err(|e| db_err(e, "insert user failed"))?;
        Ok(model.into())
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        let found = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .map_err(|e| db_err(e, "find_by_id failed"))?;
        Ok(found.map(Into::into))
    }

    async fn find_live_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        let found = UserEntity::find_by_id(id)
            .filter(UserColumn::DeletedAt.is_null())
            .one(&self.conn)
            .await
            .map_err(|e| db_err(e, "find_live_by_id failed"))?;
        Ok(found.map(Into::into))
    }

    async fn find_live_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let found = UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .filter(UserColumn::DeletedAt.is_null())
            .one(&self.conn)
            .await
            .map_err(|e| db_err(e, "find_live_by_email failed"))?;
        Ok(found.map(Into::into))
    }

    async fn live_email_exists(&self, email: &str) -> RepoResult<bool> {
        let count = UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .filter(UserColumn::DeletedAt.is_null())
            .count(&self.conn)
            .await
            .map_err(|e| db_err(e, "live_email_exists failed"))?;
        Ok(count > 0)
    }

    async fn update_live(&self, u: User) -> RepoResult<bool> {
        // vote_updated_at is owned by vote recording and left untouched here
        let res = UserEntity::update_many()
            .col_expr(UserColumn::Email, Expr::value(u.email))
            .col_expr(UserColumn::FirstName, Expr::value(u.first_name))
            .col_expr(UserColumn::LastName, Expr::value(u.last_name))
            .col_expr(UserColumn::Password, Expr::value(u.password))
            .col_expr(UserColumn::RoleId, Expr::value(u.role_id))
            .col_expr(UserColumn::DeletedAt, Expr::value(u.deleted_at))
            .filter(UserColumn::Id.eq(u.id))
            .filter(UserColumn::DeletedAt.is_null())
            .exec(&self.conn)
            .await
            .map_err(|e| db_err(e, "update_live failed"))?;
        Ok(res.rows_affected > 0)
    }

    async fn list_live(&self, limit: u64, offset: u64) -> RepoResult<Vec<User>> {
        let rows = UserEntity::find()
            .filter(UserColumn::DeletedAt.is_null())
            .order_by_asc(UserColumn::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await
            .map_err(|e| db_err(e, "list_live failed"))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_live(&self) -> RepoResult<u64> {
        UserEntity::find()
            .filter(UserColumn::DeletedAt.is_null())
            .count(&self.conn)
            .await
            .map_err(|e| db_err(e, "count_live failed"))
    }
}

/// SeaORM votes repository.
pub struct SeaOrmVotesRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmVotesRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

async fn insert_vote_tx<T>(tx: &T, v: NewVote) -> RepoResult<Vote>
where
    T: ConnectionTrait,
{
    let now = Utc::now();
    let m = VoteAM {
        id: NotSet,
        user_id: Set(v.user_id),
        profile_id: Set(v.profile_id),
        value: Set(v.value),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let model = m
        .insert(tx)
        .await
        .map_err(|e| db_err(e, "insert vote failed"))?;
    Ok(model.into())
}

async fn update_vote_tx<T>(tx: &T, v: Vote) -> RepoResult<Vote>
where
    T: ConnectionTrait,
{
    let m = VoteAM {
        id: Set(v.id),
        value: Set(v.value),
        updated_at: Set(v.updated_at),
        ..Default::default()
    };
    let model = m
        .update(tx)
        .await
        .map_err(|e| db_err(e, "update vote failed"))?;
    Ok(model.into())
}

async fn stamp_voter_tx<T>(tx: &T, user_id: i64, at: DateTime<Utc>) -> RepoResult<()>
where
    T: ConnectionTrait,
{
    let res = UserEntity::update_many()
        .col_expr(UserColumn::VoteUpdatedAt, Expr::value(Some(at)))
        .filter(UserColumn::Id.eq(user_id))
        .exec(tx)
        .await
        .map_err(|e| db_err(e, "stamp voter failed"))?;
    if res.rows_affected == 0 {
        return Err(RepoError::Other(anyhow!("stamp voter: user {user_id} not found")));
    }
    Ok(())
}

#[async_trait::async_trait]
impl<C> VotesRepository for SeaOrmVotesRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn find(&self, user_id: i64, profile_id: i64) -> RepoResult<Option<Vote>> {
        let found = VoteEntity::find()
            .filter(VoteColumn::UserId.eq(user_id))
            .filter(VoteColumn::ProfileId.eq(profile_id))
            .one(&self.conn)
            .await
            .map_err(|e| db_err(e, "find vote failed"))?;
        Ok(found.map(Into::into))
    }

    async fn record(&self, write: VoteWrite, voted_at: DateTime<Utc>) -> RepoResult<Vote> {
        // An uncommitted transaction rolls back when dropped.
        let tx = self
            .conn
            .begin()
            .await
            .map_err(|e| db_err(e, "begin vote transaction failed"))?;
        let vote = match write {
            VoteWrite::Insert(v) => insert_vote_tx(&tx, v).await?,
            VoteWrite::Update(v) => update_vote_tx(&tx, v).await?,
        };
        stamp_voter_tx(&tx, vote.user_id, voted_at).await?;
        tx.commit()
            .await
            .map_err(|e| db_err(e, "commit vote transaction failed"))?;
        Ok(vote)
    }

    async fn delete(&self, user_id: i64, profile_id: i64) -> RepoResult<bool> {
        let res = VoteEntity::delete_many()
            .filter(VoteColumn::UserId.eq(user_id))
            .filter(VoteColumn::ProfileId.eq(profile_id))
            .exec(&self.conn)
            .await
            .map_err(|e| db_err(e, "delete vote failed"))?;
        Ok(res.rows_affected > 0)
    }
}
