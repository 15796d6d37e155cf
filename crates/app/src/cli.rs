use std::path::{Path, PathBuf};

use clap::Parser;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArgsError {
    #[error("invalid --db value: {raw}")]
    InvalidDbUrl { raw: String },
}

/// Terminal quiz over a question catalog with resumable sessions.
#[derive(Parser, Debug)]
#[command(name = "quiz")]
pub struct Args {
    /// SQLite database holding the device-local session snapshot
    #[arg(long = "db", env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3")]
    pub db_url: String,

    /// Question catalog (JSON array); the bundled catalog is used when absent
    #[arg(long, env = "QUIZ_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Signed-in user; enables the remote snapshot copy
    #[arg(long, env = "QUIZ_USER")]
    pub user: Option<String>,

    /// Base URL of the remote document store
    #[arg(long, env = "QUIZ_REMOTE_URL")]
    pub remote_url: Option<String>,

    /// Bearer token for the remote document store
    #[arg(long, env = "QUIZ_REMOTE_TOKEN", hide_env_values = true)]
    pub remote_token: Option<String>,

    /// Fixed shuffle seed
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    /// Database URL in canonical `sqlite://<absolute path>` form.
    pub fn database_url(&self) -> String {
        normalize_sqlite_url(&self.db_url)
    }
}

pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and parent directories) so the pool can open it.
///
/// # Errors
///
/// Returns an error for URLs without a file path or when the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let invalid = || ArgsError::InvalidDbUrl {
        raw: db_url.to_owned(),
    };
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(invalid().into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}
