mod config;
mod error;
mod github;
mod session;
mod store;
mod sync;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use github::client::GithubClient;
use github::types::Repo;
use session::QuerySession;
use store::{RepoStore, SqliteStore};
use sync::{QueryResult, SyncEngine};

#[derive(Parser, Debug)]
#[command(name = "reposcope")]
#[command(about = "Search GitHub repositories, with an offline cache")]
#[command(version)]
struct Args {
  /// Search term (omit to show the default result set)
  query: Option<String>,

  /// Path to config file (default: $XDG_CONFIG_HOME/reposcope/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Serve results from the local cache only, without touching the network
  #[arg(long)]
  cached: bool,

  /// Delete the local cache and exit
  #[arg(long)]
  clear_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let config = config::Config::load(args.config.as_deref())?;
  let store = SqliteStore::open()?;

  if args.clear_cache {
    store.clear_all()?;
    println!("cache cleared");
    return Ok(());
  }

  if args.cached {
    let repos = match &args.query {
      Some(query) => store.search_substring(query)?,
      None => store.get_all()?,
    };
    if repos.is_empty() {
      eprintln!("no cached results");
      std::process::exit(1);
    }
    print_repos(&repos);
    return Ok(());
  }

  let client = GithubClient::new(&config)?;
  let engine = SyncEngine::new(client, store);
  let session = QuerySession::new(engine);

  if let Some(query) = &args.query {
    session.submit(query);
  }

  let mut results = session.subscribe();
  let outcome = loop {
    let current = results.borrow_and_update().clone();
    if session.settled() && !matches!(current, QueryResult::Pending) {
      break current;
    }
    if results.changed().await.is_err() {
      break QueryResult::Failed("session closed before a result arrived".to_string());
    }
  };

  match outcome {
    QueryResult::Ready(repos) => {
      print_repos(&repos);
      Ok(())
    }
    QueryResult::Failed(reason) => {
      eprintln!("search failed: {reason}");
      eprintln!("retry once the network is back, or use --cached to browse the cache");
      std::process::exit(1);
    }
    QueryResult::Pending => unreachable!("loop only breaks on terminal results"),
  }
}

fn print_repos(repos: &[Repo]) {
  for repo in repos {
    let name = format!("{}/{}", repo.owner_login, repo.name);
    println!(
      "{:<45} ★{:>7}  {}",
      name,
      repo.stargazers_count,
      repo.description.as_deref().unwrap_or("")
    );
  }
}
