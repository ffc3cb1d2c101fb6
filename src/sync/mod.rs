//! Synchronization engine: fetch-or-fallback per query.
//!
//! For every query the engine fetches from the remote source of truth,
//! writes the result through to the persistent store and returns fresh data.
//! When the fetch fails (including a well-formed empty result) it falls back
//! to a substring search over the cache, so the caller always gets the best
//! available answer: fresh when reachable, stale-but-valid when not.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, Stream};
use tracing::{debug, error, warn};

use crate::error::FetchError;
use crate::github::types::Repo;
use crate::store::RepoStore;

/// The observable lifecycle of one submitted query.
///
/// Every resolve starts with `Pending` and settles to exactly one of
/// `Ready` or `Failed` before the next query is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
  /// No data yet.
  Pending,
  /// Fresh or cached records, in provider/storage order.
  Ready(Vec<Repo>),
  /// Neither the network nor the cache could answer.
  Failed(String),
}

/// Seam over the remote search call so the engine can be driven by mocks.
pub trait SearchRepos: Send + Sync {
  fn search(&self, query: &str)
    -> impl Future<Output = Result<Vec<Repo>, FetchError>> + Send;
}

/// Fetch-or-fallback engine over an explicit fetcher and store pair.
pub struct SyncEngine<F, S> {
  fetcher: Arc<F>,
  store: Arc<S>,
}

impl<F, S> Clone for SyncEngine<F, S> {
  fn clone(&self) -> Self {
    Self {
      fetcher: Arc::clone(&self.fetcher),
      store: Arc::clone(&self.store),
    }
  }
}

enum Step {
  Announce,
  Fetch,
  Done,
}

impl<F, S> SyncEngine<F, S>
where
  F: SearchRepos + Send + Sync + 'static,
  S: RepoStore + Send + Sync + 'static,
{
  pub fn new(fetcher: F, store: S) -> Self {
    Self {
      fetcher: Arc::new(fetcher),
      store: Arc::new(store),
    }
  }

  /// Resolve one query as a short stream: `Pending`, then the terminal
  /// `Ready` or `Failed`.
  ///
  /// `Pending` is yielded before any network work starts, so observing it
  /// never waits on the fetch. The pipeline itself runs sequentially:
  /// fetch, normalize, write through, emit.
  pub fn resolve(&self, query: &str) -> impl Stream<Item = QueryResult> + Send + 'static {
    let engine = self.clone();
    let query = query.to_string();

    stream::unfold(Step::Announce, move |step| {
      let engine = engine.clone();
      let query = query.clone();
      async move {
        match step {
          Step::Announce => Some((QueryResult::Pending, Step::Fetch)),
          Step::Fetch => Some((engine.run(&query).await, Step::Done)),
          Step::Done => None,
        }
      }
    })
  }

  async fn run(&self, query: &str) -> QueryResult {
    match self.fetcher.search(query).await {
      Ok(repos) => {
        // Normalization is never skipped: the flattened login must equal
        // the nested one at the moment the records are written.
        let repos: Vec<Repo> = repos.into_iter().map(Repo::normalized).collect();

        if let Err(err) = self.store.replace_all(&repos) {
          // Degraded cache: the fresh result is still valid, but the next
          // offline fallback will serve whatever was cached before.
          error!(%err, "cache write-through failed");
        }

        QueryResult::Ready(repos)
      }
      Err(cause) => {
        debug!(%cause, query, "remote search failed, trying cache");
        self.fall_back(query, cause)
      }
    }
  }

  /// Fallback search uses the raw query, not the fetcher's substituted
  /// default term. A blank query therefore matches the entire cache.
  fn fall_back(&self, query: &str, cause: FetchError) -> QueryResult {
    match self.store.search_substring(query) {
      Ok(hits) if !hits.is_empty() => {
        warn!(%cause, query, hits = hits.len(), "serving cached results");
        QueryResult::Ready(hits)
      }
      Ok(_) => QueryResult::Failed(cause.to_string()),
      Err(store_err) => {
        // A broken cache read leaves nothing to mask the failure with;
        // surface the original network reason.
        warn!(%store_err, "cache fallback read failed");
        QueryResult::Failed(cause.to_string())
      }
    }
  }
}
