//! Error taxonomies for the fetch and storage layers.
//!
//! Fetch failures and storage failures are kept as distinct kinds: the sync
//! engine intercepts every `FetchError` and tries the cache, while a
//! `StoreError` must never be mistaken for an empty result.

use thiserror::Error;

/// Failure of a single remote search call.
///
/// An empty item list is deliberately a failure (`NoResults`) rather than a
/// valid empty success, so the fallback path always gets a chance to serve
/// cached data instead of an empty screen.
#[derive(Debug, Error)]
pub enum FetchError {
  /// Transport-level failure (DNS, TLS, connection, timeout).
  #[error("network error: {0}")]
  Transport(#[from] reqwest::Error),

  /// The server answered with a non-success status code.
  #[error("GitHub returned {code}: {message}")]
  Status { code: u16, message: String },

  /// The response body could not be decoded.
  #[error("malformed search response: {0}")]
  Malformed(#[from] serde_json::Error),

  /// Well-formed response with zero items.
  #[error("no results")]
  NoResults,
}

/// Failure inside the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("database error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  /// A serialized owner column could not be written or read back.
  #[error("owner serialization error: {0}")]
  Owner(#[from] serde_json::Error),

  #[error("cache database unavailable: {0}")]
  Open(String),

  #[error("cache lock poisoned")]
  LockPoisoned,
}
