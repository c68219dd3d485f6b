//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Idempotency middleware configuration.
    #[serde(default)]
    pub idempotency: IdempotencyConfig,
    /// Lease store backend configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Ledger engine behavior.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Log output configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Upper bound on how long a unit of work waits for a row lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Apply pending migrations at startup.
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_lock_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

/// Idempotency middleware configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IdempotencyConfig {
    /// Request header carrying the caller-computed fingerprint.
    #[serde(default = "default_idempotency_header")]
    pub header: String,
    /// Lease time-to-live in seconds.
    #[serde(default = "default_lease_ttl")]
    pub ttl_secs: u64,
    /// HTTP methods that bypass the check (exact match).
    #[serde(default = "default_whitelisted_methods")]
    pub whitelisted_methods: Vec<String>,
    /// Request paths that bypass the check (exact match).
    #[serde(default)]
    pub whitelisted_routes: Vec<String>,
    /// Unexpired leases the in-process store admits before refusing new ones.
    #[serde(default = "default_max_leases")]
    pub max_leases: u64,
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            header: default_idempotency_header(),
            ttl_secs: default_lease_ttl(),
            whitelisted_methods: default_whitelisted_methods(),
            whitelisted_routes: Vec::new(),
            max_leases: default_max_leases(),
        }
    }
}

fn default_idempotency_header() -> String {
    "Idempotency-Key".to_string()
}

fn default_lease_ttl() -> u64 {
    3600 // 60 minutes
}

fn default_whitelisted_methods() -> Vec<String> {
    ["GET", "HEAD", "OPTIONS", "TRACE"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_leases() -> u64 {
    100_000
}

/// Lease store backend configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// Redis URL. When absent the in-process store is used.
    pub url: Option<String>,
}

/// How `ExecutePendingTransaction` settles a pending transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingSettlement {
    /// Re-apply the balance delta on execution.
    ///
    /// The delta was already applied when the pending transaction was created,
    /// so the account sees the effect twice.
    #[default]
    Reapply,
    /// Only move the state to COMPLETED; the reservation made at creation is
    /// the whole balance effect.
    StateOnly,
}

/// Ledger engine behavior.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LedgerConfig {
    /// Settlement mode for pending transactions.
    #[serde(default)]
    pub pending_settlement: PendingSettlement,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Log output configuration.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LogConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("BLEDGER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("idempotency.whitelisted_methods")
                    .with_list_parse_key("idempotency.whitelisted_routes")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
