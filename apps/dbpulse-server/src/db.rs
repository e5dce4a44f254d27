use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use runtime::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use url::Url;

const MEMORY_DSN: &str = "sqlite::memory:";
const DEFAULT_MAX_CONNS: u32 = 10;

/// Backend named by the URL scheme. Only the drivers compiled into sea-orm
/// are accepted.
pub fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if raw.eq_ignore_ascii_case(MEMORY_DSN) {
        return Ok("sqlite");
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;
    match url.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

/// Rewrite a sqlite DSN so its path is absolute under `base_dir`.
/// In-memory DSNs pass through.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case(MEMORY_DSN) || dsn.eq_ignore_ascii_case("sqlite://:memory:") {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

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
    if create_dirs {
        if let Some(dir) = p.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create sqlite directory {}", dir.display()))?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    Ok(out)
}

/// Open the pool. `mock` ignores the configured database and uses a single
/// in-memory sqlite connection, so every query sees the same data.
pub async fn connect(
    db: Option<&DatabaseConfig>,
    base_dir: &Path,
    mock: bool,
) -> Result<DatabaseConnection> {
    let mut opts = if mock {
        let mut opts = ConnectOptions::new(MEMORY_DSN);
        opts.max_connections(1).min_connections(1);
        opts
    } else {
        let cfg = db.ok_or_else(|| anyhow!("no database configured (use --mock to run without one)"))?;
        let backend = detect_from_dsn(cfg)?;
        let mut dsn = cfg.url.trim().to_string();
        if backend == "sqlite" {
            dsn = absolutize_sqlite_dsn(&dsn, base_dir, true)?;
        }
        tracing::debug!(backend, "database backend detected");
        let mut opts = ConnectOptions::new(dsn);
        opts.max_connections(cfg.max_conns.unwrap_or(DEFAULT_MAX_CONNS));
        opts
    };
    opts.acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    tracing::info!(mock, "Connecting to database");
    Database::connect(opts)
        .await
        .context("Failed to connect to database")
}
