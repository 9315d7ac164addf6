use chrono::{DateTime, Utc};

/// Pure user model for inter-crate communication (no serde).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role_id: Option<i64>,
    /// Moment of the user's last successful vote; anchors the cooldown window.
    pub vote_updated_at: Option<DateTime<Utc>>,
    /// Soft-delete marker. `None` means the user is live.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Data for creating a new user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role_id: Option<i64>,
}

/// Partial update data for a user.
///
/// A field takes part in the merge only when it is populated: `Some` and,
/// for strings, non-empty; for the role, non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<i64>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserPatch {
    /// Patch that only carries the soft-delete marker.
    pub fn deletion(at: DateTime<Utc>) -> Self {
        Self {
            deleted_at: Some(at),
            ..Default::default()
        }
    }

    pub fn email(&self) -> Option<&str> {
        populated(&self.email)
    }

    pub fn first_name(&self) -> Option<&str> {
        populated(&self.first_name)
    }

    pub fn last_name(&self) -> Option<&str> {
        populated(&self.last_name)
    }

    pub fn password(&self) -> Option<&str> {
        populated(&self.password)
    }

    pub fn role_id(&self) -> Option<i64> {
        self.role_id.filter(|id| *id != 0)
    }
}

fn populated(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// A live rating of a profile by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub id: i64,
    pub user_id: i64,
    pub profile_id: i64,
    pub value: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vote request: who votes, for which profile, with which value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewVote {
    pub user_id: i64,
    pub profile_id: i64,
    pub value: i16,
}
