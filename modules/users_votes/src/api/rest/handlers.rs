use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use tracing::{error, info};

use crate::api::rest::dto::{
    CountDto, CreateUserReq, CreatedDto, EmailLookupQuery, ListUsersQuery, UpdateUserReq,
    UserDto, UserListDto, VoteDto, VoteReq,
};
use crate::api::rest::error::map_domain_error;
use crate::api::rest::problem::ProblemResponse;
use crate::api::rest::state::RestState;
use crate::domain::error::DomainError;

type ApiResult<T> = Result<T, ProblemResponse>;

fn problem(uri: &Uri, e: DomainError) -> ProblemResponse {
    error!("Request to {} failed: {}", uri.path(), e);
    map_domain_error(&e, uri.path())
}

/// List live users, one page at a time
pub async fn list_users(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<UserListDto>> {
    info!("Listing users with query: {:?}", query);

    let ctx = state.call_ctx();
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(state.config.default_page_size);

    let users = state
        .service
        .list_users(&ctx, page, page_size)
        .await
        .map_err(|e| problem(&uri, e))?;
    let total = state
        .service
        .count_users(&ctx)
        .await
        .map_err(|e| problem(&uri, e))?;

    Ok(Json(UserListDto {
        users: users.into_iter().map(UserDto::from).collect(),
        total,
        page,
        page_size,
    }))
}

pub async fn count_users(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
) -> ApiResult<Json<CountDto>> {
    let count = state
        .service
        .count_users(&state.call_ctx())
        .await
        .map_err(|e| problem(&uri, e))?;
    Ok(Json(CountDto { count }))
}

/// Get a live user by id
pub async fn get_user(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserDto>> {
    info!("Getting user with id: {}", id);

    let user = state
        .service
        .get_user(&state.call_ctx(), id)
        .await
        .map_err(|e| problem(&uri, e))?;
    Ok(Json(UserDto::from(user)))
}

/// Get a user by id, soft-deleted ones included
pub async fn get_user_by_id(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserDto>> {
    let user = state
        .service
        .get_user_by_id(&state.call_ctx(), id)
        .await
        .map_err(|e| problem(&uri, e))?;
    Ok(Json(UserDto::from(user)))
}

/// Email lookup; renders `null` when nobody holds the email
pub async fn get_user_by_email(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Query(query): Query<EmailLookupQuery>,
) -> ApiResult<Json<Option<UserDto>>> {
    let user = state
        .service
        .get_user_by_email(&state.call_ctx(), &query.email)
        .await
        .map_err(|e| problem(&uri, e))?;
    Ok(Json(user.map(UserDto::from)))
}

/// Create a new user
pub async fn create_user(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Json(req): Json<CreateUserReq>,
) -> ApiResult<(StatusCode, Json<CreatedDto>)> {
    info!("Creating user with email: {}", req.email);

    let user = state
        .service
        .create_user(&state.call_ctx(), req.into())
        .await
        .map_err(|e| problem(&uri, e))?;
    Ok((StatusCode::CREATED, Json(CreatedDto { id: user.id })))
}

/// Partially update a user
pub async fn update_user(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserReq>,
) -> ApiResult<Json<UserDto>> {
    info!("Updating user {}", id);

    let user = state
        .service
        .update_user(&state.call_ctx(), id, req.into())
        .await
        .map_err(|e| problem(&uri, e))?;
    Ok(Json(UserDto::from(user)))
}

/// Soft-delete a user
pub async fn delete_user(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserDto>> {
    info!("Deleting user: {}", id);

    let user = state
        .service
        .delete_user(&state.call_ctx(), id)
        .await
        .map_err(|e| problem(&uri, e))?;
    Ok(Json(UserDto::from(user)))
}

pub async fn vote(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Json(req): Json<VoteReq>,
) -> ApiResult<Json<CreatedDto>> {
    info!(
        "User {} votes {} on profile {}",
        req.user_id, req.value, req.profile_id
    );

    let id = state
        .service
        .vote(&state.call_ctx(), req.into())
        .await
        .map_err(|e| problem(&uri, e))?;
    Ok(Json(CreatedDto { id }))
}

pub async fn get_vote(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Path((user_id, profile_id)): Path<(i64, i64)>,
) -> ApiResult<Json<VoteDto>> {
    let vote = state
        .service
        .get_vote(&state.call_ctx(), user_id, profile_id)
        .await
        .map_err(|e| problem(&uri, e))?
        .ok_or_else(|| problem(&uri, DomainError::vote_not_found(user_id, profile_id)))?;
    Ok(Json(VoteDto::from(vote)))
}

pub async fn revoke_vote(
    Extension(state): Extension<Arc<RestState>>,
    uri: Uri,
    Path((user_id, profile_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    info!("Revoking vote of user {} on profile {}", user_id, profile_id);

    state
        .service
        .revoke_vote(&state.call_ctx(), user_id, profile_id)
        .await
        .map_err(|e| problem(&uri, e))?;
    Ok(StatusCode::NO_CONTENT)
}
