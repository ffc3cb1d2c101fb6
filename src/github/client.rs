use color_eyre::{eyre::eyre, Result};
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::FetchError;
use crate::github::api_types::{ApiErrorBody, ApiRepoItem, ApiSearchResponse};
use crate::github::types::Repo;
use crate::sync::SearchRepos;

/// GitHub repository-search client.
///
/// Stateless: one GET per call, no retries, no writes.
#[derive(Clone)]
pub struct GithubClient {
  http: reqwest::Client,
  endpoint: Url,
  default_query: String,
  per_page: u32,
  token: Option<String>,
}

impl GithubClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base = Url::parse(&config.github.url)
      .map_err(|e| eyre!("Invalid GitHub API URL {}: {}", config.github.url, e))?;
    let endpoint = base
      .join("search/repositories")
      .map_err(|e| eyre!("Invalid GitHub API URL {}: {}", config.github.url, e))?;

    let http = reqwest::Client::builder()
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      endpoint,
      default_query: config.github.default_query.clone(),
      // The search API caps page size at 100
      per_page: config.github.per_page.min(100),
      token: Config::get_api_token(),
    })
  }

  /// Run a single repository search, sorted by stars descending.
  ///
  /// A blank query is replaced by the configured default term so a cold
  /// start still returns a non-empty result set. An empty item list is
  /// reported as `FetchError::NoResults`, never as an empty success.
  pub async fn search_repositories(&self, query: &str) -> Result<Vec<Repo>, FetchError> {
    let term = effective_term(query, &self.default_query);

    let mut url = self.endpoint.clone();
    url
      .query_pairs_mut()
      .append_pair("q", term)
      .append_pair("sort", "stars")
      .append_pair("order", "desc")
      .append_pair("per_page", &self.per_page.to_string());

    debug!(term, "searching repositories");

    let mut request = self
      .http
      .get(url)
      .header(ACCEPT, "application/vnd.github+json")
      .header(USER_AGENT, concat!("reposcope/", env!("CARGO_PKG_VERSION")));
    if let Some(token) = &self.token {
      request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
      // GitHub error bodies carry a message worth surfacing verbatim
      let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or_else(|_| {
          status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
        });
      return Err(FetchError::Status {
        code: status.as_u16(),
        message,
      });
    }

    let parsed: ApiSearchResponse = serde_json::from_str(&body)?;
    debug!(
      total = parsed.total_count,
      incomplete = parsed.incomplete_results,
      returned = parsed.items.len(),
      "search response"
    );

    if parsed.items.is_empty() {
      return Err(FetchError::NoResults);
    }

    Ok(parsed.items.into_iter().map(ApiRepoItem::into_repo).collect())
  }
}

impl SearchRepos for GithubClient {
  fn search(
    &self,
    query: &str,
  ) -> impl std::future::Future<Output = Result<Vec<Repo>, FetchError>> + Send {
    self.search_repositories(query)
  }
}

/// Pick the term actually sent to the server.
fn effective_term<'a>(query: &'a str, default: &'a str) -> &'a str {
  let trimmed = query.trim();
  if trimmed.is_empty() {
    default
  } else {
    query
  }
}
