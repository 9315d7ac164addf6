//! Error catalog: the machine-readable code, HTTP status and title of every
//! domain error.

use crate::api::rest::problem::{Problem, ProblemResponse};
use crate::domain::error::DomainError;

const TYPE_BASE: &str = "https://errors.example.com/";

/// Static error definition from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
}

impl ErrDef {
    pub fn type_url(&self) -> String {
        format!("{TYPE_BASE}{}", self.code)
    }
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    users_votes_user_not_found_v1,
    users_votes_user_email_conflict_v1,
    users_votes_vote_not_found_v1,
    users_votes_vote_cooldown_v1,
    users_votes_storage_insertion_failed_v1,
    users_votes_storage_failed_v1,
    users_votes_request_validation_v1,
    users_votes_request_cancelled_v1,
    users_votes_request_timeout_v1,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 9] = [
        Self::users_votes_user_not_found_v1,
        Self::users_votes_user_email_conflict_v1,
        Self::users_votes_vote_not_found_v1,
        Self::users_votes_vote_cooldown_v1,
        Self::users_votes_storage_insertion_failed_v1,
        Self::users_votes_storage_failed_v1,
        Self::users_votes_request_validation_v1,
        Self::users_votes_request_cancelled_v1,
        Self::users_votes_request_timeout_v1,
    ];

    pub const fn def(self) -> ErrDef {
        match self {
            Self::users_votes_user_not_found_v1 => ErrDef {
                status: 404,
                title: "User Not Found",
                code: "users_votes.user.not_found.v1",
            },
            Self::users_votes_user_email_conflict_v1 => ErrDef {
                status: 409,
                title: "Email Already Exists",
                code: "users_votes.user.email_conflict.v1",
            },
            Self::users_votes_vote_not_found_v1 => ErrDef {
                status: 404,
                title: "Vote Not Found",
                code: "users_votes.vote.not_found.v1",
            },
            Self::users_votes_vote_cooldown_v1 => ErrDef {
                status: 429,
                title: "Vote Cooldown",
                code: "users_votes.vote.cooldown.v1",
            },
            Self::users_votes_storage_insertion_failed_v1 => ErrDef {
                status: 500,
                title: "Insertion Failed",
                code: "users_votes.storage.insertion_failed.v1",
            },
            Self::users_votes_storage_failed_v1 => ErrDef {
                status: 500,
                title: "Storage Failure",
                code: "users_votes.storage.failed.v1",
            },
            Self::users_votes_request_validation_v1 => ErrDef {
                status: 422,
                title: "Validation Error",
                code: "users_votes.request.validation.v1",
            },
            Self::users_votes_request_cancelled_v1 => ErrDef {
                status: 499,
                title: "Request Cancelled",
                code: "users_votes.request.cancelled.v1",
            },
            Self::users_votes_request_timeout_v1 => ErrDef {
                status: 504,
                title: "Request Timeout",
                code: "users_votes.request.timeout.v1",
            },
        }
    }

    pub const fn status(self) -> u16 {
        self.def().status
    }

    pub const fn as_str(self) -> &'static str {
        self.def().code
    }

    /// Reverse lookup by dotted code.
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }

    pub fn to_problem(self, detail: impl Into<String>) -> Problem {
        let def = self.def();
        Problem::new(def.status, def.title, detail)
            .with_type(def.type_url())
            .with_code(def.code)
    }

    /// Problem response bound to the request path and, if known, trace id.
    pub fn to_response(
        self,
        detail: impl Into<String>,
        instance: &str,
        trace_id: Option<String>,
    ) -> ProblemResponse {
        let mut problem = self.to_problem(detail).with_instance(instance);
        if let Some(id) = trace_id {
            problem = problem.with_trace_id(id);
        }
        ProblemResponse(problem)
    }
}

impl DomainError {
    /// Catalog entry for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UserNotFound { .. } => ErrorCode::users_votes_user_not_found_v1,
            Self::EmailAlreadyExists { .. } => ErrorCode::users_votes_user_email_conflict_v1,
            Self::VoteNotFound { .. } => ErrorCode::users_votes_vote_not_found_v1,
            Self::VoteCooldown { .. } => ErrorCode::users_votes_vote_cooldown_v1,
            Self::InsertionFailed { .. } => ErrorCode::users_votes_storage_insertion_failed_v1,
            Self::Database { .. } => ErrorCode::users_votes_storage_failed_v1,
            Self::Validation { .. } => ErrorCode::users_votes_request_validation_v1,
            Self::Cancelled => ErrorCode::users_votes_request_cancelled_v1,
            Self::DeadlineExceeded => ErrorCode::users_votes_request_timeout_v1,
        }
    }
}
