//! Consumer-facing session state: the latest query and its latest result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tracing::debug;

use crate::store::RepoStore;
use crate::sync::{QueryResult, SearchRepos, SyncEngine};

/// Holds the two values a UI layer observes: the current query string and
/// the current `QueryResult`. Constructing a session immediately resolves
/// the empty query so there is always something to show.
///
/// Each submission is tagged with a monotonic token; emissions from a
/// superseded resolve are discarded, so a slow in-flight fetch can never
/// overwrite a newer result.
pub struct QuerySession<F, S> {
  engine: SyncEngine<F, S>,
  query_tx: watch::Sender<String>,
  result_tx: watch::Sender<QueryResult>,
  latest_token: Arc<AtomicU64>,
  completed_token: Arc<AtomicU64>,
}

impl<F, S> QuerySession<F, S>
where
  F: SearchRepos + Send + Sync + 'static,
  S: RepoStore + Send + Sync + 'static,
{
  pub fn new(engine: SyncEngine<F, S>) -> Self {
    let (query_tx, _) = watch::channel(String::new());
    let (result_tx, _) = watch::channel(QueryResult::Pending);

    let session = Self {
      engine,
      query_tx,
      result_tx,
      latest_token: Arc::new(AtomicU64::new(0)),
      completed_token: Arc::new(AtomicU64::new(0)),
    };
    session.submit("");
    session
  }

  /// The most recently submitted query string.
  pub fn query(&self) -> String {
    self.query_tx.borrow().clone()
  }

  /// Watch the result as it moves through `Pending` and settles.
  pub fn subscribe(&self) -> watch::Receiver<QueryResult> {
    self.result_tx.subscribe()
  }

  /// True once the most recent submission has produced its terminal result.
  pub fn settled(&self) -> bool {
    self.completed_token.load(Ordering::SeqCst) == self.latest_token.load(Ordering::SeqCst)
  }

  /// Submit a new query, replacing the previous one.
  ///
  /// The resolve runs on a spawned task; its emissions replace the observed
  /// result only while this submission is still the latest.
  pub fn submit(&self, query: &str) {
    self.query_tx.send_replace(query.to_string());
    let token = self.latest_token.fetch_add(1, Ordering::SeqCst) + 1;

    let stream = self.engine.resolve(query);
    let latest = Arc::clone(&self.latest_token);
    let completed = Arc::clone(&self.completed_token);
    let result_tx = self.result_tx.clone();

    tokio::spawn(async move {
      futures::pin_mut!(stream);
      while let Some(result) = stream.next().await {
        if latest.load(Ordering::SeqCst) != token {
          debug!(token, "dropping emission from superseded query");
          break;
        }
        if !matches!(result, QueryResult::Pending) {
          // Mark completion before publishing so observers who see the
          // terminal value also see the session as settled.
          completed.fetch_max(token, Ordering::SeqCst);
        }
        result_tx.send_replace(result);
      }
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use std::future::Future;
  use std::time::Duration;

  use crate::error::FetchError;
  use crate::github::types::{Repo, RepoOwner};
  use crate::store::SqliteStore;

  fn repo(id: i64, name: &str) -> Repo {
    Repo {
      id,
      name: name.to_string(),
      html_url: format!("https://github.com/test/{}", name),
      owner: RepoOwner {
        login: "test".to_string(),
      },
      owner_login: "test".to_string(),
      description: None,
      language: None,
      stargazers_count: 0,
      forks_count: 0,
    }
  }

  /// Routes by query string; "slow" answers late, everything else at once.
  /// The empty query is delayed a little so tests can observe Pending.
  struct RoutedFetcher;

  impl SearchRepos for RoutedFetcher {
    fn search(
      &self,
      query: &str,
    ) -> impl Future<Output = Result<Vec<Repo>, FetchError>> + Send {
      let query = query.to_string();
      async move {
        match query.as_str() {
          "" => {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(vec![repo(100, "default-repo")])
          }
          "slow" => {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(vec![repo(1, "slow")])
          }
          other => Ok(vec![repo(2, other)]),
        }
      }
    }
  }

  fn session() -> QuerySession<RoutedFetcher, SqliteStore> {
    let engine = SyncEngine::new(RoutedFetcher, SqliteStore::open_in_memory().unwrap());
    QuerySession::new(engine)
  }

  async fn settled_result<F, S>(session: &QuerySession<F, S>) -> QueryResult
  where
    F: SearchRepos + Send + Sync + 'static,
    S: RepoStore + Send + Sync + 'static,
  {
    let mut rx = session.subscribe();
    loop {
      let current = rx.borrow_and_update().clone();
      if session.settled() && !matches!(current, QueryResult::Pending) {
        return current;
      }
      rx.changed().await.expect("session dropped");
    }
  }

  #[tokio::test]
  async fn startup_submits_the_empty_query_and_starts_pending() {
    let session = session();

    assert_eq!(session.query(), "");
    assert_eq!(*session.subscribe().borrow(), QueryResult::Pending);

    let result = settled_result(&session).await;
    let QueryResult::Ready(repos) = &result else {
      panic!("expected Ready, got {:?}", result);
    };
    assert_eq!(repos[0].name, "default-repo");
  }

  #[tokio::test]
  async fn submit_replaces_query_and_result() {
    let session = session();
    session.submit("android");

    assert_eq!(session.query(), "android");
    let result = settled_result(&session).await;
    let QueryResult::Ready(repos) = &result else {
      panic!("expected Ready, got {:?}", result);
    };
    assert_eq!(repos[0].name, "android");
  }

  #[tokio::test]
  async fn a_superseded_resolve_cannot_overwrite_a_newer_result() {
    let session = session();

    session.submit("slow");
    tokio::time::sleep(Duration::from_millis(20)).await;
    session.submit("fast");

    let result = settled_result(&session).await;
    let QueryResult::Ready(repos) = &result else {
      panic!("expected Ready, got {:?}", result);
    };
    assert_eq!(repos[0].name, "fast");

    // Let the slow resolve finish; the observed result must not change.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let QueryResult::Ready(repos) = session.subscribe().borrow().clone() else {
      panic!("result changed away from Ready");
    };
    assert_eq!(repos[0].name, "fast");
  }
}
