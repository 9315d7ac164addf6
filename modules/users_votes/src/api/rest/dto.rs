use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contract::model::{NewUser, NewVote, User, UserPatch, Vote};

/// REST DTO for user representation. The password never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: Option<i64>,
    pub vote_updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// REST DTO for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserReq {
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
    #[serde(default)]
    pub role_id: Option<i64>,
}

/// REST DTO for updating a user (partial). Deletion goes through DELETE.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUserReq {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedDto {
    pub id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountDto {
    pub count: u64,
}

/// REST DTO for user list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListDto {
    pub users: Vec<UserDto>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailLookupQuery {
    pub email: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VoteReq {
    pub user_id: i64,
    pub profile_id: i64,
    pub value: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteDto {
    pub id: i64,
    pub user_id: i64,
    pub profile_id: i64,
    pub value: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Conversion implementations between REST DTOs and contract models

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role_id: user.role_id,
            vote_updated_at: user.vote_updated_at,
            deleted_at: user.deleted_at,
        }
    }
}

impl From<CreateUserReq> for NewUser {
    fn from(req: CreateUserReq) -> Self {
        Self {
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            password: req.password,
            role_id: req.role_id,
        }
    }
}

impl From<UpdateUserReq> for UserPatch {
    fn from(req: UpdateUserReq) -> Self {
        Self {
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            password: req.password,
            role_id: req.role_id,
            deleted_at: None,
        }
    }
}

impl From<VoteReq> for NewVote {
    fn from(req: VoteReq) -> Self {
        Self {
            user_id: req.user_id,
            profile_id: req.profile_id,
            value: req.value,
        }
    }
}

impl From<Vote> for VoteDto {
    fn from(vote: Vote) -> Self {
        Self {
            id: vote.id,
            user_id: vote.user_id,
            profile_id: vote.profile_id,
            value: vote.value,
            created_at: vote.created_at,
            updated_at: vote.updated_at,
        }
    }
}
