//! Persistent repository cache.
//!
//! The store is a single-query cache: the sync engine replaces its whole
//! contents on every successful fetch and reads it back by substring when
//! the network fails. It never initiates fetches itself.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StoreError;
use crate::github::types::Repo;

/// Storage seam for cached repository records.
pub trait RepoStore: Send + Sync {
  /// Insert-or-replace by repository id. Additive; never deletes.
  fn insert_all(&self, repos: &[Repo]) -> Result<(), StoreError>;

  /// Delete every cached record.
  fn clear_all(&self) -> Result<(), StoreError>;

  /// Swap the whole cache for `repos` in one transaction.
  ///
  /// Equivalent to `clear_all` followed by `insert_all`, but committed
  /// atomically so a concurrent reader never observes the transiently
  /// empty table.
  fn replace_all(&self, repos: &[Repo]) -> Result<(), StoreError>;

  /// Case-insensitive substring match across name, owner login and
  /// description. An empty fragment matches every record.
  fn search_substring(&self, fragment: &str) -> Result<Vec<Repo>, StoreError>;

  /// Full scan.
  fn get_all(&self) -> Result<Vec<Repo>, StoreError>;
}
