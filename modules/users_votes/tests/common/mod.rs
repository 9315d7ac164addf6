#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use users_votes::contract::model::{NewUser, User, Vote};
use users_votes::domain::repo::{
    RepoError, RepoResult, UsersRepository, VoteWrite, VotesRepository,
};
use users_votes::domain::service::{Service, ServiceConfig};

/// In-memory stand-in for both storage ports. Counts writes so tests can
/// assert that a call did or did not reach storage.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<BTreeMap<i64, User>>,
    votes: Mutex<BTreeMap<(i64, i64), Vote>>,
    next_user_id: AtomicUsize,
    next_vote_id: AtomicUsize,

    pub user_inserts: AtomicUsize,
    pub user_updates: AtomicUsize,
    pub voter_stamps: AtomicUsize,
    pub vote_inserts: AtomicUsize,
    pub vote_updates: AtomicUsize,

    /// Every user read and write fails while set.
    pub fail_users: AtomicBool,
    /// `find_by_id` and `find_live_by_id` never complete while set.
    pub stall_reads: AtomicBool,
    /// `record` fails at the voter stamp, after staging the vote write.
    pub fail_stamp: AtomicBool,
    /// `record` waits here between staging and applying its writes.
    pub record_gate: Option<Arc<RecordGate>>,
}

/// Parks `record` between its two writes until released.
#[derive(Default)]
pub struct RecordGate {
    /// Notified once `record` has staged its vote write.
    pub staged: Notify,
    pub release: Notify,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_record_gate(gate: Arc<RecordGate>) -> Arc<Self> {
        Arc::new(Self {
            record_gate: Some(gate),
            ..Self::default()
        })
    }

    pub fn seed(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn user(&self, id: i64) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    pub fn set_vote_updated_at(&self, id: i64, at: Option<DateTime<Utc>>) {
        if let Some(u) = self.users.lock().unwrap().get_mut(&id) {
            u.vote_updated_at = at;
        }
    }

    pub fn vote(&self, user_id: i64, profile_id: i64) -> Option<Vote> {
        self.votes
            .lock()
            .unwrap()
            .get(&(user_id, profile_id))
            .cloned()
    }

    pub fn vote_count(&self) -> usize {
        self.votes.lock().unwrap().len()
    }

    pub fn writes(&self) -> usize {
        self.user_inserts.load(Ordering::SeqCst)
            + self.user_updates.load(Ordering::SeqCst)
            + self.voter_stamps.load(Ordering::SeqCst)
            + self.vote_inserts.load(Ordering::SeqCst)
            + self.vote_updates.load(Ordering::SeqCst)
    }

    fn check(&self) -> RepoResult<()> {
        if self.fail_users.load(Ordering::SeqCst) {
            return Err(RepoError::Other(anyhow!("storage offline")));
        }
        Ok(())
    }

    async fn maybe_stall(&self) {
        if self.stall_reads.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl UsersRepository for MemoryStore {
    async fn insert(&self, u: NewUser) -> RepoResult<User> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|x| x.deleted_at.is_none() && x.email == u.email)
        {
            return Err(RepoError::UniqueViolation("users.email".into()));
        }
        self.user_inserts.fetch_add(1, Ordering::SeqCst);
        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst) as i64 + 1000;
        let user = User {
            id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            password: u.password,
            role_id: u.role_id.filter(|r| *r != 0),
            vote_updated_at: None,
            deleted_at: None,
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        self.maybe_stall().await;
        self.check()?;
        Ok(self.user(id))
    }

    async fn find_live_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        self.maybe_stall().await;
        self.check()?;
        Ok(self.user(id).filter(|u| u.deleted_at.is_none()))
    }

    async fn find_live_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.deleted_at.is_none() && u.email == email)
            .cloned())
    }

    async fn live_email_exists(&self, email: &str) -> RepoResult<bool> {
        Ok(self.find_live_by_email(email).await?.is_some())
    }

    async fn update_live(&self, u: User) -> RepoResult<bool> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if users
            .values()
            .any(|x| x.id != u.id && x.deleted_at.is_none() && x.email == u.email)
        {
            return Err(RepoError::UniqueViolation("users.email".into()));
        }
        let Some(row) = users.get_mut(&u.id) else {
            return Ok(false);
        };
        if row.deleted_at.is_some() {
            return Ok(false);
        }
        self.user_updates.fetch_add(1, Ordering::SeqCst);
        let vote_updated_at = row.vote_updated_at;
        *row = User {
            vote_updated_at,
            ..u
        };
        Ok(true)
    }

    async fn list_live(&self, limit: u64, offset: u64) -> RepoResult<Vec<User>> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.deleted_at.is_none())
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_live(&self) -> RepoResult<u64> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.deleted_at.is_none())
            .count() as u64)
    }
}

#[async_trait]
impl VotesRepository for MemoryStore {
    async fn find(&self, user_id: i64, profile_id: i64) -> RepoResult<Option<Vote>> {
        Ok(self.vote(user_id, profile_id))
    }

    async fn record(&self, write: VoteWrite, voted_at: DateTime<Utc>) -> RepoResult<Vote> {
        let now = Utc::now();
        let staged = match &write {
            VoteWrite::Insert(v) => {
                if self.votes.lock().unwrap().contains_key(&(v.user_id, v.profile_id)) {
                    return Err(RepoError::UniqueViolation("votes.user_profile".into()));
                }
                Vote {
                    id: self.next_vote_id.fetch_add(1, Ordering::SeqCst) as i64 + 1,
                    user_id: v.user_id,
                    profile_id: v.profile_id,
                    value: v.value,
                    created_at: now,
                    updated_at: now,
                }
            }
            VoteWrite::Update(v) => {
                let mut row = self
                    .vote(v.user_id, v.profile_id)
                    .ok_or_else(|| RepoError::Other(anyhow!("vote {} not found", v.id)))?;
                row.value = v.value;
                row.updated_at = v.updated_at;
                row
            }
        };

        if let Some(gate) = &self.record_gate {
            gate.staged.notify_one();
            gate.release.notified().await;
        }

        self.check()?;
        if self.fail_stamp.load(Ordering::SeqCst) {
            return Err(RepoError::Other(anyhow!("stamp voter failed")));
        }
        let mut users = self.users.lock().unwrap();
        let voter = users
            .get_mut(&staged.user_id)
            .ok_or_else(|| RepoError::Other(anyhow!("user {} not found", staged.user_id)))?;

        // Both writes land under the locks or not at all.
        voter.vote_updated_at = Some(voted_at);
        self.voter_stamps.fetch_add(1, Ordering::SeqCst);
        match write {
            VoteWrite::Insert(_) => self.vote_inserts.fetch_add(1, Ordering::SeqCst),
            VoteWrite::Update(_) => self.vote_updates.fetch_add(1, Ordering::SeqCst),
        };
        self.votes
            .lock()
            .unwrap()
            .insert((staged.user_id, staged.profile_id), staged.clone());
        Ok(staged)
    }

    async fn delete(&self, user_id: i64, profile_id: i64) -> RepoResult<bool> {
        Ok(self
            .votes
            .lock()
            .unwrap()
            .remove(&(user_id, profile_id))
            .is_some())
    }
}

pub fn service_with(store: &Arc<MemoryStore>) -> Service {
    Service::new(store.clone(), store.clone(), ServiceConfig::default())
}

pub fn live_user(id: i64, email: &str) -> User {
    User {
        id,
        email: email.to_owned(),
        first_name: "Ada".to_owned(),
        last_name: "Lovelace".to_owned(),
        password: "secret".to_owned(),
        role_id: Some(2),
        vote_updated_at: None,
        deleted_at: None,
    }
}

pub fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_owned(),
        first_name: "Grace".to_owned(),
        last_name: "Hopper".to_owned(),
        password: "hunter2".to_owned(),
        role_id: Some(1),
    }
}
