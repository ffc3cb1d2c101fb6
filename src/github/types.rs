use serde::{Deserialize, Serialize};

/// Owner identity nested inside a repository record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoOwner {
  pub login: String,
}

/// A repository record as fetched, cached and rendered.
///
/// `owner_login` is the owner's login flattened to a top-level field so the
/// store can substring-match on it. The write path keeps it equal to
/// `owner.login`; the storage layer never touches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
  /// Provider-assigned id, never reassigned on our side.
  pub id: i64,
  pub name: String,
  pub html_url: String,
  pub owner: RepoOwner,
  pub owner_login: String,
  pub description: Option<String>,
  pub language: Option<String>,
  pub stargazers_count: u32,
  pub forks_count: u32,
}

impl Repo {
  /// Copy the nested owner login into the flattened search field.
  pub fn normalized(mut self) -> Self {
    self.owner_login = self.owner.login.clone();
    self
  }
}
