//! Command-line interface definitions and dispatch.

use crate::config::{load_env_file, Config};
use crate::leads::{spawn_cleanup, InMemoryRateLimitStore, LeadForwarder, RateLimiter};
use crate::models::AppState;
use crate::pipeline::{run_migration, run_scrape, RunOptions, RunReport};
use crate::routes::create_router;
use crate::storage::{ObjectStore, SupabaseStorage};
use crate::types::ContentCategory;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

const USER_AGENT: &str = concat!("site-migrator/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Marketing site content tooling
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Env file to load (default: .env.local, then .env)
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub env_file: Option<PathBuf>,

    /// Content directory (overrides CONTENT_DIR)
    #[arg(long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub content_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Move legacy CDN images into object storage and rewrite content
    MigrateImages(RunArgs),

    /// Replace document bodies with articles scraped from the legacy site
    Scrape(RunArgs),

    /// Run the lead capture server
    Serve {
        /// Interface to bind (overrides LEADS_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides LEADS_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Scan and report only; nothing is uploaded or written
    #[arg(long)]
    pub dry_run: bool,

    /// Content categories to process (repeatable, default: all)
    #[arg(long = "type", value_enum)]
    pub types: Vec<ContentCategory>,

    /// Where to write the error log
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub error_log: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Migrate,
    Scrape,
}

impl RunKind {
    pub fn default_error_log(&self) -> &'static str {
        match self {
            RunKind::Migrate => "migration-errors.log",
            RunKind::Scrape => "scrape-errors.log",
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(path) = load_env_file(cli.env_file.as_deref())? {
        info!(path = %path.display(), "Loaded environment");
    }

    let mut config = Config::from_env()?;
    if let Some(dir) = cli.content_dir {
        config.content.content_dir = dir;
    }

    match cli.command {
        Commands::MigrateImages(args) => {
            execute_run(RunKind::Migrate, &config, &args).await?;
        }
        Commands::Scrape(args) => {
            execute_run(RunKind::Scrape, &config, &args).await?;
        }
        Commands::Serve { host, port } => serve(&config, host, port).await?,
    }

    Ok(())
}

/// Run one pipeline to completion.
///
/// Only configuration problems are returned as errors; per-item failures
/// end up in the report and the error log.
pub async fn execute_run(kind: RunKind, config: &Config, args: &RunArgs) -> anyhow::Result<RunReport> {
    let client = http_client()?;

    let store = if args.dry_run {
        None
    } else {
        Some(SupabaseStorage::with_client(client.clone(), config.storage.credentials()?))
    };

    let mut options = RunOptions::new(&config.content.content_dir);
    options.categories = ContentCategory::selection(&args.types);
    options.dry_run = args.dry_run;
    options.legacy_site_url = config.content.legacy_site_url.clone();

    info!(
        run = ?kind,
        dry_run = args.dry_run,
        content_dir = %options.content_dir.display(),
        categories = ?options.categories,
        "Starting run"
    );

    let store_ref = store.as_ref().map(|s| s as &dyn ObjectStore);
    let report = match kind {
        RunKind::Migrate => run_migration(&options, &client, store_ref).await?,
        RunKind::Scrape => run_scrape(&options, &client, store_ref).await?,
    };

    report.log_summary(args.dry_run);
    println!("{}", report.summary());

    if args.dry_run {
        if report.has_errors() {
            warn!(errors = report.errors.len(), "Dry run found errors, error log not written");
        }
        return Ok(report);
    }

    let log_path = args
        .error_log
        .clone()
        .unwrap_or_else(|| PathBuf::from(kind.default_error_log()));
    write_error_log(&report, &log_path).await?;

    Ok(report)
}

async fn write_error_log(report: &RunReport, path: &Path) -> anyhow::Result<()> {
    let written = report
        .write_error_log(path)
        .await
        .with_context(|| format!("Failed to write error log {}", path.display()))?;
    if written {
        println!("Errors written to {}", path.display());
    }
    Ok(())
}

fn http_client() -> anyhow::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

async fn serve(config: &Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let store = Arc::new(InMemoryRateLimitStore::new());
    let window = Duration::from_secs(config.leads.rate_window_secs);
    let limiter = RateLimiter::new(store.clone(), config.leads.rate_limit, window);
    let cleanup = spawn_cleanup(store, window, CLEANUP_INTERVAL);

    let forwarder = match &config.leads.webhook_url {
        Some(url) => Some(Arc::new(LeadForwarder::new(url.clone()))),
        None => {
            warn!("LEAD_WEBHOOK_URL not set, accepted leads will only be logged");
            None
        }
    };

    let app = create_router(AppState {
        limiter: Arc::new(limiter),
        forwarder,
        allowed_origins: config.leads.allowed_origins.clone(),
    });

    let addr = format!(
        "{}:{}",
        host.as_deref().unwrap_or(&config.leads.host),
        port.unwrap_or(config.leads.port)
    );
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    cleanup.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContentConfig, LeadsConfig, StorageConfig, DEFAULT_BUCKET};
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    fn config(content_dir: &Path) -> Config {
        Config {
            storage: StorageConfig {
                url: None,
                service_key: None,
                bucket: DEFAULT_BUCKET.to_string(),
            },
            content: ContentConfig {
                content_dir: content_dir.to_path_buf(),
                legacy_site_url: None,
            },
            leads: LeadsConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                rate_limit: 5,
                rate_window_secs: 600,
                webhook_url: None,
                allowed_origins: Vec::new(),
            },
        }
    }

    #[test]
    fn test_parse_repeated_types() {
        let cli = Cli::try_parse_from([
            "site-migrator",
            "--content-dir",
            "site/content",
            "migrate-images",
            "--dry-run",
            "--type",
            "blog",
            "--type",
            "case-studies",
        ])
        .unwrap();

        assert_eq!(cli.content_dir, Some(PathBuf::from("site/content")));
        match cli.command {
            Commands::MigrateImages(args) => {
                assert!(args.dry_run);
                assert_eq!(args.types, vec![ContentCategory::Blog, ContentCategory::CaseStudies]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        assert!(Cli::try_parse_from(["site-migrator", "scrape", "--type", "pricing"]).is_err());
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["site-migrator", "serve", "--port", "8080"]).unwrap();
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dry_run_without_credentials_succeeds() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("blog")).unwrap();
        std::fs::write(
            dir.path().join("blog/post.mdx"),
            "---\ntitle: Post\n---\n![](https://cdn.prod.website-files.com/a/1_hero.png)\n",
        )
        .unwrap();

        let args = RunArgs {
            dry_run: true,
            ..RunArgs::default()
        };
        let report = assert_ok!(execute_run(RunKind::Migrate, &config(dir.path()), &args).await);

        assert_eq!(report.found, 1);
        assert_eq!(report.uploaded, 0);
    }

    #[tokio::test]
    async fn test_real_run_without_credentials_fails() {
        let dir = TempDir::new().unwrap();
        let err = assert_err!(execute_run(RunKind::Migrate, &config(dir.path()), &RunArgs::default()).await);
        assert!(err.to_string().contains("SUPABASE_URL"));
    }
}
