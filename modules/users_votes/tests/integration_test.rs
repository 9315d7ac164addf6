use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tower::ServiceExt;

use users_votes::{
    api::rest::{dto::CreatedDto, router, RestState},
    config::UsersVotesConfig,
    contract::model::{NewUser, NewVote, User, UserPatch},
    domain::ctx::CallCtx,
    domain::error::DomainError,
    domain::repo::{RepoError, UsersRepository, VoteWrite, VotesRepository},
    domain::service::{Service, ServiceConfig},
    infra::storage::{migrations::Migrator, SeaOrmUsersRepository, SeaOrmVotesRepository},
};

/// Create a fresh test database for each test
async fn create_test_db() -> DatabaseConnection {
    // One connection so every query sees the same in-memory database
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opts)
        .await
        .expect("Failed to connect to test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

fn create_service(db: &DatabaseConnection, config: ServiceConfig) -> Service {
    Service::new(
        Arc::new(SeaOrmUsersRepository::new(db.clone())),
        Arc::new(SeaOrmVotesRepository::new(db.clone())),
        config,
    )
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        password: "pw".to_string(),
        role_id: None,
    }
}

#[tokio::test]
async fn test_domain_service_crud() -> Result<()> {
    let db = create_test_db().await;
    let service = create_service(&db, ServiceConfig::default());
    let ctx = CallCtx::background();

    let created = service.create_user(&ctx, new_user("test@example.com")).await?;
    assert_eq!(created.email, "test@example.com");

    let retrieved = service.get_user(&ctx, created.id).await?;
    assert_eq!(retrieved, created);

    let users = service.list_users(&ctx, 1, 10).await?;
    assert_eq!(users.len(), 1);
    assert_eq!(service.count_users(&ctx).await?, 1);

    let patch = UserPatch {
        first_name: Some("Updated".to_string()),
        ..Default::default()
    };
    let updated = service.update_user(&ctx, created.id, patch).await?;
    assert_eq!(updated.first_name, "Updated");
    assert_eq!(service.get_user(&ctx, created.id).await?, updated);

    let deleted = service.delete_user(&ctx, created.id).await?;
    assert!(deleted.deleted_at.is_some());

    // Soft delete: hidden from live reads, still stored
    assert!(matches!(
        service.get_user(&ctx, created.id).await,
        Err(DomainError::UserNotFound { .. })
    ));
    assert!(service.get_user_by_id(&ctx, created.id).await?.is_deleted());
    assert_eq!(service.count_users(&ctx).await?, 0);
    assert!(service.list_users(&ctx, 1, 10).await?.is_empty());

    let again = service.delete_user(&ctx, created.id).await?;
    assert_eq!(again.deleted_at, deleted.deleted_at);

    Ok(())
}

#[tokio::test]
async fn live_email_index_allows_reuse_after_delete() -> Result<()> {
    let db = create_test_db().await;
    let repo = SeaOrmUsersRepository::new(db.clone());

    let first = repo.insert(new_user("dup@example.com")).await?;
    let err = repo.insert(new_user("dup@example.com")).await.unwrap_err();
    assert!(matches!(err, RepoError::UniqueViolation(_)));

    let deleted = User {
        deleted_at: Some(Utc::now()),
        ..first
    };
    assert!(repo.update_live(deleted).await?);

    let second = repo.insert(new_user("dup@example.com")).await?;
    assert!(repo.live_email_exists("dup@example.com").await?);
    assert_eq!(
        repo.find_live_by_email("dup@example.com").await?.map(|u| u.id),
        Some(second.id)
    );
    Ok(())
}

#[tokio::test]
async fn update_live_skips_deleted_rows() -> Result<()> {
    let db = create_test_db().await;
    let repo = SeaOrmUsersRepository::new(db.clone());

    let user = repo.insert(new_user("a@example.com")).await?;
    let deleted = User {
        deleted_at: Some(Utc::now()),
        ..user.clone()
    };
    assert!(repo.update_live(deleted).await?);

    let resurrect = User {
        first_name: "Back".to_string(),
        deleted_at: None,
        ..user
    };
    assert!(!repo.update_live(resurrect).await?);
    Ok(())
}

#[tokio::test]
async fn vote_pair_is_unique() -> Result<()> {
    let db = create_test_db().await;
    let users = SeaOrmUsersRepository::new(db.clone());
    let votes = SeaOrmVotesRepository::new(db.clone());
    let voter = users.insert(new_user("v@example.com")).await?;

    let vote = NewVote {
        user_id: voter.id,
        profile_id: 7,
        value: 1,
    };
    let now = Utc::now();
    votes.record(VoteWrite::Insert(vote), now).await?;
    let err = votes
        .record(VoteWrite::Insert(vote), now)
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::UniqueViolation(_)));

    assert!(votes.delete(voter.id, 7).await?);
    assert!(!votes.delete(voter.id, 7).await?);
    Ok(())
}

#[tokio::test]
async fn record_stamps_voter_in_the_same_transaction() -> Result<()> {
    let db = create_test_db().await;
    let users = SeaOrmUsersRepository::new(db.clone());
    let votes = SeaOrmVotesRepository::new(db.clone());
    let voter = users.insert(new_user("v@example.com")).await?;
    let at = Utc::now();

    let vote = votes
        .record(
            VoteWrite::Insert(NewVote {
                user_id: voter.id,
                profile_id: 3,
                value: 1,
            }),
            at,
        )
        .await?;
    assert_eq!(vote.user_id, voter.id);

    let stamped = users
        .find_by_id(voter.id)
        .await?
        .and_then(|u| u.vote_updated_at)
        .expect("voter stamped");
    assert_eq!(stamped.timestamp_millis(), at.timestamp_millis());
    Ok(())
}

#[tokio::test]
async fn failed_stamp_rolls_back_vote_write() -> Result<()> {
    let db = create_test_db().await;
    // Lets the vote row reference a user that does not exist, so the
    // stamp is the write that fails.
    db.execute_unprepared("PRAGMA foreign_keys = OFF").await?;
    let votes = SeaOrmVotesRepository::new(db.clone());

    let err = votes
        .record(
            VoteWrite::Insert(NewVote {
                user_id: 999,
                profile_id: 1,
                value: 1,
            }),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Other(_)));
    assert!(votes.find(999, 1).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn voting_flow_against_sqlite() -> Result<()> {
    let db = create_test_db().await;
    let service = create_service(
        &db,
        ServiceConfig {
            vote_cooldown: Duration::ZERO,
        },
    );
    let ctx = CallCtx::background();
    let voter = service.create_user(&ctx, new_user("voter@example.com")).await?;

    let request = NewVote {
        user_id: voter.id,
        profile_id: 11,
        value: 1,
    };
    let first = service.vote(&ctx, request).await?;
    let second = service
        .vote(&ctx, NewVote { value: -1, ..request })
        .await?;
    assert_eq!(first, second);

    let stored = service.get_vote(&ctx, voter.id, 11).await?.expect("vote");
    assert_eq!(stored.value, -1);
    assert!(service.get_user(&ctx, voter.id).await?.vote_updated_at.is_some());

    service.revoke_vote(&ctx, voter.id, 11).await?;
    assert!(service.get_vote(&ctx, voter.id, 11).await?.is_none());
    assert!(matches!(
        service.revoke_vote(&ctx, voter.id, 11).await,
        Err(DomainError::VoteNotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn cooldown_is_enforced_against_sqlite() -> Result<()> {
    let db = create_test_db().await;
    let service = create_service(&db, ServiceConfig::default());
    let ctx = CallCtx::background();
    let voter = service.create_user(&ctx, new_user("voter@example.com")).await?;

    service
        .vote(
            &ctx,
            NewVote {
                user_id: voter.id,
                profile_id: 1,
                value: 1,
            },
        )
        .await?;
    let err = service
        .vote(
            &ctx,
            NewVote {
                user_id: voter.id,
                profile_id: 2,
                value: 1,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::VoteCooldown { .. }));
    assert!(service.get_vote(&ctx, voter.id, 2).await?.is_none());
    Ok(())
}

/// Create a test HTTP router
async fn create_test_router() -> Router {
    let db = create_test_db().await;
    let config = UsersVotesConfig::default();
    let service = Arc::new(create_service(&db, config.service_config()));
    router(Arc::new(RestState::new(service, config)))
}

#[tokio::test]
async fn test_rest_create_then_get() -> Result<()> {
    let app = create_test_router().await;

    let body = serde_json::json!({
        "email": "rest@example.com",
        "first_name": "Rest",
        "last_name": "User",
        "password": "pw"
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let created: CreatedDto = serde_json::from_slice(&bytes)?;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/users/{}", created.id))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let user: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(user["email"], "rest@example.com");
    assert!(user.get("password").is_none());
    Ok(())
}
