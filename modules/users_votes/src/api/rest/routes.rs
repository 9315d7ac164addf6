use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};

use crate::api::rest::handlers;
use crate::api::rest::state::RestState;

/// REST surface of the users and votes module.
pub fn router(state: Arc<RestState>) -> Router {
    Router::new()
        // GET /users - List live users, POST /users - Create a user
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/users/count", get(handlers::count_users))
        // GET /users/lookup?email= - Live user by email, null when absent
        .route("/users/lookup", get(handlers::get_user_by_email))
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        // Soft-deleted users are visible here
        .route("/users/{id}/any", get(handlers::get_user_by_id))
        .route("/votes", post(handlers::vote))
        .route(
            "/votes/{user_id}/{profile_id}",
            get(handlers::get_vote).delete(handlers::revoke_vote),
        )
        .layer(Extension(state))
}
