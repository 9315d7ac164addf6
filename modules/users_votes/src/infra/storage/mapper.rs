use crate::contract::model::{User, Vote};
use crate::infra::storage::entity::{user, vote};

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            password: m.password,
            role_id: m.role_id,
            vote_updated_at: m.vote_updated_at,
            deleted_at: m.deleted_at,
        }
    }
}

impl From<vote::Model> for Vote {
    fn from(m: vote::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            profile_id: m.profile_id,
            value: m.value,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
