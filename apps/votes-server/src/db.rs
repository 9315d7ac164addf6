use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use runtime::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use users_votes::infra::storage::migrations::Migrator;

const DEFAULT_MAX_CONNS: u32 = 10;

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// In-memory DSNs and non-sqlite URLs are returned unchanged.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let Some(db_path) = dsn.strip_prefix("sqlite://") else {
        return Ok(dsn.to_string());
    };

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }
    if let Some(dir) = p.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create database dir {}", dir.display()))?;
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Pool size for a DSN. Every connection to an in-memory SQLite database
/// opens its own empty database, so those pools are pinned to one.
pub fn pool_size(dsn: &str, configured: Option<u32>) -> u32 {
    let in_memory =
        dsn.starts_with("sqlite:") && (dsn.contains(":memory:") || dsn.contains("mode=memory"));
    if in_memory {
        return 1;
    }
    configured.unwrap_or(DEFAULT_MAX_CONNS)
}

/// Reject URLs whose scheme has no compiled-in driver.
pub fn check_backend(url: &str) -> Result<&'static str> {
    let scheme = url
        .split_once(':')
        .map(|(s, _)| s.to_ascii_lowercase())
        .ok_or_else(|| anyhow!("Invalid database URL '{url}'"))?;
    match scheme.as_str() {
        "sqlite" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {other}")),
    }
}

/// Connect and bring the schema up to date.
pub async fn connect_and_migrate(
    cfg: &DatabaseConfig,
    base_dir: &Path,
) -> Result<DatabaseConnection> {
    let url = cfg.url.trim();
    if url.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    let backend = check_backend(url)?;
    let dsn = absolutize_sqlite_dsn(url, base_dir)?;

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.max_connections(pool_size(&dsn, cfg.max_conns))
        .connect_timeout(cfg.connect_timeout.unwrap_or(Duration::from_secs(5)));

    tracing::info!(backend, "Connecting to database: {}", dsn);
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to {backend} database"))?;

    Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database schema is up to date");

    Ok(db)
}
