//! Configuration types for catsync components.
//!
//! Every value here is built once at startup (usually from CLI flags) and passed
//! by value into the service that needs it. Nothing in the core reads process
//! globals or the environment.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Default number of identifiers processed concurrently in one window.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Database connection pool configuration.
pub struct DbConfig {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            max_connections: 2,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client configuration for external API calls.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("catsync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// How the upsert worker writes a document that already exists in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Update when the document exists, index when it does not. Never both.
    #[default]
    UpdateOrInsert,
    /// Update an existing document and then re-index it with the full record.
    AlwaysReindex,
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpdateOrInsert => write!(f, "update-or-insert"),
            Self::AlwaysReindex => write!(f, "always-reindex"),
        }
    }
}

impl FromStr for WritePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "update-or-insert" => Ok(Self::UpdateOrInsert),
            "always-reindex" => Ok(Self::AlwaysReindex),
            _ => Err(AppError::ConfigError(format!(
                "Unknown write policy: '{}'. Valid options: update-or-insert, always-reindex",
                s
            ))),
        }
    }
}

/// Synchronization pipeline configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Number of identifiers processed concurrently before the next window starts.
    pub window_size: usize,
    /// Deadline applied to every single fetch or index call.
    pub call_timeout: Duration,
    /// Write behavior for documents that already exist.
    pub write_policy: WritePolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            call_timeout: Duration::from_secs(30),
            write_policy: WritePolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Creates a new SyncConfig with a custom window size (minimum 1).
    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size.max(1);
        self
    }

    /// Creates a new SyncConfig with a custom per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Creates a new SyncConfig that re-indexes documents after updating them.
    pub fn with_always_reindex(mut self) -> Self {
        self.write_policy = WritePolicy::AlwaysReindex;
        self
    }
}
