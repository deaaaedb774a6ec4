//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Number of recipients carried by a single send job.
///
/// When sending via BCC this is also the number of recipients in a single email.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration.
    pub redis: RedisConfig,
    /// Outgoing mail configuration.
    pub smtp: SmtpConfig,
    /// Mass contact delivery defaults.
    #[serde(default)]
    pub mass_contact: MassContactSettings,
    /// Background queue configuration.
    #[serde(default)]
    pub queue: QueueSettings,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key prefix for all Redis keys.
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

/// SMTP relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// SMTP host.
    pub host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Use implicit/STARTTLS.
    #[serde(default = "default_true")]
    pub use_tls: bool,
    /// Username.
    #[serde(default)]
    pub username: Option<String>,
    /// Password.
    #[serde(default)]
    pub password: Option<String>,
}

/// How recipient opt-outs are honoured.
///
/// The modes are mutually exclusive per installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptOutMode {
    /// Opt-outs are ignored entirely.
    Disabled,
    /// A single opt-out applies to every message.
    #[default]
    Global,
    /// Users opt out of individual categories, or of everything.
    PerCategory,
}

/// Site-wide defaults for mass contact messages.
#[derive(Debug, Clone, Deserialize)]
pub struct MassContactSettings {
    /// Hide recipients from each other by default.
    #[serde(default = "default_true")]
    pub use_bcc: bool,
    /// Default sender display name.
    #[serde(default)]
    pub default_sender_name: String,
    /// Default sender address.
    #[serde(default)]
    pub default_sender_email: String,
    /// Archive a copy of every message by default.
    #[serde(default = "default_true")]
    pub create_archive_copy: bool,
    /// Opt-out policy.
    #[serde(default)]
    pub optout_mode: OptOutMode,
    /// Hand messages to the background queue instead of sending immediately.
    #[serde(default)]
    pub send_with_queue: bool,
    /// Maximum recipients per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Language used for BCC messages.
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for MassContactSettings {
    fn default() -> Self {
        Self {
            use_bcc: true,
            default_sender_name: String::new(),
            default_sender_email: String::new(),
            create_archive_copy: true,
            optout_mode: OptOutMode::default(),
            send_with_queue: false,
            batch_size: DEFAULT_BATCH_SIZE,
            default_language: default_language(),
        }
    }
}

/// Background queue configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueSettings {
    /// Number of concurrent message (fan-out) workers.
    #[serde(default = "default_resolve_workers")]
    pub resolve_workers: usize,
    /// Number of concurrent batch send workers.
    #[serde(default = "default_send_workers")]
    pub send_workers: usize,
    /// How long an idle worker sleeps before polling again.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Redeliveries allowed before an item is dead-lettered.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Initial pause after a failed job, doubled per redelivery.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            resolve_workers: default_resolve_workers(),
            send_workers: default_send_workers(),
            poll_interval_ms: default_poll_interval_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_redis_prefix() -> String {
    "masscontact".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

const fn default_true() -> bool {
    true
}

const fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_language() -> String {
    "en".to_string()
}

const fn default_resolve_workers() -> usize {
    1
}

const fn default_send_workers() -> usize {
    4
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

const fn default_max_retries() -> u32 {
    5
}

const fn default_retry_backoff_ms() -> u64 {
    1000
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `MASSCONTACT_ENV`)
    /// 4. Environment variables with `MASSCONTACT_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("MASSCONTACT_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MASSCONTACT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("MASSCONTACT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
