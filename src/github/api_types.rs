//! Wire types for GitHub's repository search endpoint.

use serde::Deserialize;

use super::types::{Repo, RepoOwner};

/// Response body of `GET /search/repositories`.
#[derive(Debug, Deserialize)]
pub struct ApiSearchResponse {
  pub total_count: u64,
  #[serde(default)]
  pub incomplete_results: bool,
  pub items: Vec<ApiRepoItem>,
}

/// One repository item as GitHub serializes it.
#[derive(Debug, Deserialize)]
pub struct ApiRepoItem {
  pub id: i64,
  pub name: String,
  pub html_url: String,
  pub owner: ApiOwner,
  pub description: Option<String>,
  pub language: Option<String>,
  #[serde(default)]
  pub stargazers_count: u32,
  #[serde(default)]
  pub forks_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct ApiOwner {
  pub login: String,
}

/// GitHub error payloads carry a human-readable message.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
  pub message: String,
}

impl ApiRepoItem {
  /// Convert into the domain record, flattening the owner login.
  pub fn into_repo(self) -> Repo {
    let owner_login = self.owner.login.clone();
    Repo {
      id: self.id,
      name: self.name,
      html_url: self.html_url,
      owner: RepoOwner {
        login: self.owner.login,
      },
      owner_login,
      description: self.description,
      language: self.language,
      stargazers_count: self.stargazers_count,
      forks_count: self.forks_count,
    }
  }
}
