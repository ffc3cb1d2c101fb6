//! SQLite-backed implementation of the repository cache.

use rusqlite::{params, Connection};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::github::types::{Repo, RepoOwner};

use super::RepoStore;

/// One table keyed by the provider-assigned repository id. The owner object
/// is stored serialized next to its flattened login so the login column can
/// be matched directly without losing the nested shape.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS repos (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    html_url TEXT NOT NULL,
    owner TEXT NOT NULL,
    owner_login TEXT NOT NULL,
    description TEXT,
    language TEXT,
    stargazers_count INTEGER NOT NULL DEFAULT 0,
    forks_count INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_repos_owner_login ON repos(owner_login);
"#;

const SELECT_COLUMNS: &str =
  "id, name, html_url, owner, owner_login, description, language, stargazers_count, forks_count";

/// SQLite store, usable from async contexts through a blocking mutex
/// (every operation is a handful of local statements).
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open or create the cache database at the default location.
  pub fn open() -> Result<Self, StoreError> {
    let path = Self::default_path()?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| StoreError::Open(format!("failed to create {}: {}", parent.display(), e)))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| StoreError::Open(format!("{}: {}", path.display(), e)))?;
    Self::from_connection(conn)
  }

  /// In-memory store, used by tests.
  pub fn open_in_memory() -> Result<Self, StoreError> {
    let conn =
      Connection::open_in_memory().map_err(|e| StoreError::Open(format!("in-memory: {}", e)))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self, StoreError> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Default database path under the platform data directory.
  fn default_path() -> Result<PathBuf, StoreError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| StoreError::Open("could not determine data directory".into()))?;

    Ok(data_dir.join("reposcope").join("cache.db"))
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
    self.conn.lock().map_err(|_| StoreError::LockPoisoned)
  }

  fn query_repos(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
  ) -> Result<Vec<Repo>, StoreError> {
    struct Row {
      id: i64,
      name: String,
      html_url: String,
      owner: String,
      owner_login: String,
      description: Option<String>,
      language: Option<String>,
      stargazers_count: u32,
      forks_count: u32,
    }

    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(args, |row| {
      Ok(Row {
        id: row.get(0)?,
        name: row.get(1)?,
        html_url: row.get(2)?,
        owner: row.get(3)?,
        owner_login: row.get(4)?,
        description: row.get(5)?,
        language: row.get(6)?,
        stargazers_count: row.get(7)?,
        forks_count: row.get(8)?,
      })
    })?;

    let mut repos = Vec::new();
    for row in rows {
      let raw = row?;
      // A corrupt owner column is a storage error, not an empty result
      let owner: RepoOwner = serde_json::from_str(&raw.owner)?;
      repos.push(Repo {
        id: raw.id,
        name: raw.name,
        html_url: raw.html_url,
        owner,
        owner_login: raw.owner_login,
        description: raw.description,
        language: raw.language,
        stargazers_count: raw.stargazers_count,
        forks_count: raw.forks_count,
      });
    }

    Ok(repos)
  }
}

fn insert_into(conn: &Connection, repos: &[Repo]) -> Result<(), StoreError> {
  let mut stmt = conn.prepare_cached(
    "INSERT OR REPLACE INTO repos
       (id, name, html_url, owner, owner_login, description, language, stargazers_count, forks_count)
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
  )?;

  for repo in repos {
    let owner = serde_json::to_string(&repo.owner)?;
    stmt.execute(params![
      repo.id,
      repo.name,
      repo.html_url,
      owner,
      repo.owner_login,
      repo.description,
      repo.language,
      repo.stargazers_count,
      repo.forks_count,
    ])?;
  }

  Ok(())
}

/// Escape LIKE wildcards so a fragment containing `%` or `_` matches
/// literally.
fn like_pattern(fragment: &str) -> String {
  let escaped = fragment
    .to_lowercase()
    .replace('\\', "\\\\")
    .replace('%', "\\%")
    .replace('_', "\\_");
  format!("%{}%", escaped)
}

impl RepoStore for SqliteStore {
  fn insert_all(&self, repos: &[Repo]) -> Result<(), StoreError> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;
    insert_into(&tx, repos)?;
    tx.commit()?;
    Ok(())
  }

  fn clear_all(&self) -> Result<(), StoreError> {
    self.lock()?.execute("DELETE FROM repos", [])?;
    Ok(())
  }

  fn replace_all(&self, repos: &[Repo]) -> Result<(), StoreError> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM repos", [])?;
    insert_into(&tx, repos)?;
    tx.commit()?;
    Ok(())
  }

  fn search_substring(&self, fragment: &str) -> Result<Vec<Repo>, StoreError> {
    let conn = self.lock()?;
    let pattern = like_pattern(fragment);
    let sql = format!(
      "SELECT {} FROM repos
       WHERE lower(name) LIKE ?1 ESCAPE '\\'
          OR lower(owner_login) LIKE ?1 ESCAPE '\\'
          OR lower(coalesce(description, '')) LIKE ?1 ESCAPE '\\'",
      SELECT_COLUMNS
    );
    Self::query_repos(&conn, &sql, &[&pattern as &dyn rusqlite::ToSql])
  }

  fn get_all(&self) -> Result<Vec<Repo>, StoreError> {
    let conn = self.lock()?;
    let sql = format!("SELECT {} FROM repos", SELECT_COLUMNS);
    Self::query_repos(&conn, &sql, &[])
  }
}
