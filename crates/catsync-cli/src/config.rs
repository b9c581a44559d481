use std::sync::LazyLock;
use std::time::Duration;

use catsync_client::{DEFAULT_CATALOG_API_URL, DEFAULT_INDEX, IndexSettings};
use catsync_core::{DEFAULT_WINDOW_SIZE, EntityKind, HttpConfig, SyncConfig};
use catsync_db::DbSettings;
use clap::{Args, Parser, Subcommand, ValueEnum};

static VERSION_INFO: LazyLock<String> = LazyLock::new(|| {
    let version = env!("CARGO_PKG_VERSION");

    // Use VERGEN_GIT_SHA for the commit hash (with safe slicing)
    let commit = option_env!("VERGEN_GIT_SHA")
        .map(|s| s.chars().take(7).collect::<String>())
        .unwrap_or_else(|| "unknown".to_string());

    let built = option_env!("VERGEN_BUILD_DATE").unwrap_or("unknown"); // YYYY-MM-DD
    let target = option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown");
    let rustc = option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown");

    format!("{version}\ncommit: {commit}\nbuilt: {built}\ntarget: {target}\nrustc: {rustc}")
});

pub fn version_info() -> &'static str {
    &VERSION_INFO
}

/// CLI configuration parsed from command line arguments and environment variables.
///
/// Connection values are not validated up front: a missing credential shows up
/// as a connection error from the database or the remote service.
#[derive(Parser, Debug)]
#[command(name = "catsync")]
#[command(
    author,
    version = version_info(),
    about = "Sync catalog categories and parts into Elasticsearch"
)]
#[command(after_help = "Examples:
  catsync --key $API_KEY --db-host 10.0.0.4 --db-user sync --db-name CurtDev sync
  catsync sync --entity part --window-size 10
  catsync search \"ball mount\" --limit 5")]
pub struct Config {
    /// Catalog API key
    #[arg(long, env = "CATSYNC_API_KEY", default_value = "", hide_env_values = true, global = true)]
    pub key: String,

    /// Catalog API base URL
    #[arg(long, env = "CATSYNC_API_URL", default_value = DEFAULT_CATALOG_API_URL, global = true)]
    pub api_url: String,

    /// Elasticsearch host or IP
    #[arg(long, env = "ES_DOMAIN", default_value = "127.0.0.1", global = true)]
    pub domain: String,

    /// Elasticsearch port
    #[arg(long, env = "ES_PORT", default_value_t = 9200, global = true)]
    pub port: u16,

    /// Elasticsearch username
    #[arg(long, env = "ES_USERNAME", global = true)]
    pub username: Option<String>,

    /// Elasticsearch password
    #[arg(long, env = "ES_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Elasticsearch index name
    #[arg(long, env = "ES_INDEX", default_value = DEFAULT_INDEX, global = true)]
    pub index: String,

    /// Database host, optionally with `:port`
    #[arg(long, env = "DB_HOST", default_value = "127.0.0.1", global = true)]
    pub db_host: String,

    /// Database user
    #[arg(long, env = "DB_USER", default_value = "", global = true)]
    pub db_user: String,

    /// Database password
    #[arg(long, env = "DB_PASS", default_value = "", hide_env_values = true, global = true)]
    pub db_pass: String,

    /// Database name
    #[arg(long, env = "DB_NAME", default_value = "", global = true)]
    pub db_name: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Elasticsearch connection settings.
    pub fn index_settings(&self) -> IndexSettings {
        IndexSettings {
            host: self.domain.clone(),
            port: self.port,
            username: self.username.clone().filter(|u| !u.is_empty()),
            password: self.password.clone(),
            index: self.index.clone(),
        }
    }

    /// Catalog database connection settings.
    pub fn db_settings(&self) -> DbSettings {
        DbSettings {
            host: self.db_host.clone(),
            user: self.db_user.clone(),
            password: self.db_pass.clone(),
            database: self.db_name.clone(),
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sync categories and parts from the catalog into the search index
    #[command(after_help = "Examples:
  catsync sync                          # Categories, then parts
  catsync sync --entity category        # Categories only
  catsync sync --always-reindex         # Re-index documents after updating them
  catsync sync --smoke-query \"hitch\"    # Custom post-run search")]
    Sync(SyncArgs),
    /// Run a query_string search against the index
    #[command(after_help = "Example: catsync search \"ball mount\" --limit 10")]
    Search {
        /// Search query text
        query: String,
        /// Maximum number of results to return
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

/// Options of the `sync` command.
#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// Sync only one entity type (default: both, categories first)
    #[arg(short, long)]
    pub entity: Option<EntityArg>,

    /// Identifiers processed concurrently per window
    #[arg(short, long, default_value_t = DEFAULT_WINDOW_SIZE)]
    pub window_size: usize,

    /// Re-index existing documents after updating them
    #[arg(long)]
    pub always_reindex: bool,

    /// Timeout in seconds for every API and index call
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Query run against the index after the sync (empty to skip)
    #[arg(long, default_value = "ball mount")]
    pub smoke_query: String,
}

impl SyncArgs {
    /// Entity kinds to process, in order.
    pub fn kinds(&self) -> Vec<EntityKind> {
        match self.entity {
            Some(EntityArg::Category) => vec![EntityKind::Category],
            Some(EntityArg::Part) => vec![EntityKind::Part],
            None => EntityKind::ALL.to_vec(),
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        let config = SyncConfig::default()
            .with_window_size(self.window_size)
            .with_call_timeout(Duration::from_secs(self.timeout.max(1)));
        if self.always_reindex {
            config.with_always_reindex()
        } else {
            config
        }
    }

    /// HTTP settings matching the per-call timeout.
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout: Duration::from_secs(self.timeout.max(1)),
            ..Default::default()
        }
    }
}

/// Entity type selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EntityArg {
    #[value(alias = "categories")]
    Category,
    #[value(alias = "parts")]
    Part,
}
