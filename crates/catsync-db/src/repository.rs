//! Identifier repository for the MySQL catalog database.
//!
//! Only two read queries are issued, one per entity kind. Identifiers are cast
//! to signed 64-bit integers in SQL so that both `INT` and `INT UNSIGNED`
//! columns decode into [`EntityId`].

use catsync_core::error::AppError;
use catsync_core::traits::IdentifierSource;
use catsync_core::{DbConfig, EntityId, EntityKind};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::{MySql, MySqlPool, Pool};

/// Default MySQL port, used when `host` carries none.
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

const CATEGORY_IDS_QUERY: &str =
    "SELECT DISTINCT CAST(catID AS SIGNED) AS id FROM Categories ORDER BY id";

// Status 800 and 900 are the published part states.
const PART_IDS_QUERY: &str = "SELECT DISTINCT CAST(partID AS SIGNED) AS id FROM Part WHERE status = 800 OR status = 900 ORDER BY id";

/// Connection settings for the catalog database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbSettings {
    /// `host` or `host:port`.
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl DbSettings {
    /// Splits `host` into host name and port.
    ///
    /// A trailing `:port` is only honored when it parses as a port number.
    pub fn host_and_port(&self) -> (&str, u16) {
        match self.host.rsplit_once(':') {
            Some((host, port)) => match port.parse::<u16>() {
                Ok(port) => (host, port),
                Err(_) => (self.host.as_str(), DEFAULT_MYSQL_PORT),
            },
            None => (self.host.as_str(), DEFAULT_MYSQL_PORT),
        }
    }

    /// Builds sqlx connect options from these settings.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let (host, port) = self.host_and_port();
        let mut options = MySqlConnectOptions::new()
            .host(if host.is_empty() { "127.0.0.1" } else { host })
            .port(port)
            .username(&self.user);
        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        if !self.database.is_empty() {
            options = options.database(&self.database);
        }
        options
    }
}

/// Opens a connection pool to the catalog database.
///
/// # Errors
///
/// Returns `AppError::DatabaseError` if no connection can be established
/// within `DbConfig::acquire_timeout`.
pub async fn connect(settings: &DbSettings, config: &DbConfig) -> Result<MySqlPool, AppError> {
    let (host, port) = settings.host_and_port();
    tracing::debug!(host, port, database = %settings.database, "Connecting to catalog database");

    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(settings.connect_options())
        .await?;
    Ok(pool)
}

/// Repository listing the identifiers eligible for synchronization.
///
/// # Examples
///
/// ```no_run
/// use catsync_core::{DbConfig, EntityKind};
/// use catsync_db::{DbSettings, IdentifierRepository, connect};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = DbSettings {
///     host: "127.0.0.1:3306".to_string(),
///     user: "root".to_string(),
///     password: String::new(),
///     database: "CurtDev".to_string(),
/// };
/// let pool = connect(&settings, &DbConfig::default()).await?;
/// let repo = IdentifierRepository::new(pool);
/// let ids = repo.list_identifiers(EntityKind::Part).await?;
/// println!("{} parts to sync", ids.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct IdentifierRepository {
    pool: Pool<MySql>,
}

impl IdentifierRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn query_for(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::Category => CATEGORY_IDS_QUERY,
            EntityKind::Part => PART_IDS_QUERY,
        }
    }

    /// Lists the distinct identifiers of one entity kind.
    ///
    /// NULL identifiers are dropped.
    pub async fn list_identifiers(&self, kind: EntityKind) -> Result<Vec<EntityId>, AppError> {
        let ids: Vec<Option<i64>> = sqlx::query_scalar(Self::query_for(kind))
            .fetch_all(&self.pool)
            .await?;
        let ids: Vec<EntityId> = ids.into_iter().flatten().collect();
        tracing::debug!(%kind, count = ids.len(), "Loaded identifiers");
        Ok(ids)
    }
}

impl IdentifierSource for IdentifierRepository {
    async fn list_ids(&self, kind: EntityKind) -> Result<Vec<EntityId>, AppError> {
        self.list_identifiers(kind).await
    }
}
