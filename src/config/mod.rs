//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;
#[cfg(test)]
mod tests;

pub use cli::{CliArgs, Command, DatabaseOverride, MigrateArgs, ServeArgs, ServeOverrides};

use std::{net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "gazette";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_DB_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SNAPSHOT_STALE_AFTER_SECS: u64 = crate::cache::DEFAULT_STALE_AFTER_SECS;
const DEFAULT_COMMENTS_PAGE_SIZE: u32 = 50;
const DEFAULT_COMMENTS_PAGE_SIZE_MAX: u32 = 200;
const DEFAULT_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const MAX_SESSION_TTL_SECS: u64 = crate::application::session::MAX_SESSION_TTL.as_secs();
const DEFAULT_IDENTITY_TIMEOUT_SECS: u64 = 10;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub snapshots: SnapshotSettings,
    pub comments: CommentSettings,
    pub identity: IdentitySettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// Absent means posts and comments live in process memory.
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SnapshotSettings {
    pub stale_after: Duration,
    pub prerender_on_startup: bool,
}

#[derive(Debug, Clone)]
pub struct CommentSettings {
    pub page_size_default: NonZeroU32,
    pub page_size_max: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct IdentitySettings {
    pub google_client_id: Option<String>,
    pub tokeninfo_url: Url,
    pub session_ttl: Duration,
    pub request_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("GAZETTE").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    snapshots: RawSnapshotSettings,
    comments: RawCommentSettings,
    identity: RawIdentitySettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        self.apply_database_override(&overrides.database);

        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(seconds) = overrides.snapshots_stale_after_seconds {
            self.snapshots.stale_after_seconds = Some(seconds);
        }
        if let Some(enabled) = overrides.snapshots_prerender_on_startup {
            self.snapshots.prerender_on_startup = Some(enabled);
        }
        if let Some(size) = overrides.comments_page_size {
            self.comments.page_size_default = Some(size);
        }
        if let Some(client_id) = overrides.identity_google_client_id.as_ref() {
            self.identity.google_client_id = Some(client_id.clone());
        }
        if let Some(seconds) = overrides.identity_session_ttl_seconds {
            self.identity.session_ttl_seconds = Some(seconds);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            snapshots,
            comments,
            identity,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            snapshots: build_snapshot_settings(snapshots)?,
            comments: build_comment_settings(comments)?,
            identity: build_identity_settings(identity)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    let graceful_shutdown = positive_seconds(graceful_secs, "server.graceful_shutdown_seconds")?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;
    let connect_timeout = positive_seconds(
        database
            .connect_timeout_seconds
            .unwrap_or(DEFAULT_DB_CONNECT_TIMEOUT_SECS),
        "database.connect_timeout_seconds",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
        connect_timeout,
    })
}

fn build_snapshot_settings(snapshots: RawSnapshotSettings) -> Result<SnapshotSettings, LoadError> {
    let stale_after = positive_seconds(
        snapshots
            .stale_after_seconds
            .unwrap_or(DEFAULT_SNAPSHOT_STALE_AFTER_SECS),
        "snapshots.stale_after_seconds",
    )?;

    Ok(SnapshotSettings {
        stale_after,
        prerender_on_startup: snapshots.prerender_on_startup.unwrap_or(true),
    })
}

fn build_comment_settings(comments: RawCommentSettings) -> Result<CommentSettings, LoadError> {
    let page_size_max = non_zero_u32(
        comments
            .page_size_max
            .unwrap_or(DEFAULT_COMMENTS_PAGE_SIZE_MAX)
            .into(),
        "comments.page_size_max",
    )?;
    let page_size_default = non_zero_u32(
        comments
            .page_size_default
            .unwrap_or(DEFAULT_COMMENTS_PAGE_SIZE)
            .into(),
        "comments.page_size_default",
    )?;
    if page_size_default > page_size_max {
        return Err(LoadError::invalid(
            "comments.page_size_default",
            format!("must not exceed comments.page_size_max ({page_size_max})"),
        ));
    }

    Ok(CommentSettings {
        page_size_default,
        page_size_max,
    })
}

fn build_identity_settings(identity: RawIdentitySettings) -> Result<IdentitySettings, LoadError> {
    let google_client_id = identity.google_client_id.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let raw_url = identity
        .tokeninfo_url
        .unwrap_or_else(|| DEFAULT_TOKENINFO_URL.to_string());
    let tokeninfo_url = Url::parse(&raw_url).map_err(|err| {
        LoadError::invalid("identity.tokeninfo_url", format!("invalid url: {err}"))
    })?;

    let session_ttl = positive_seconds(
        identity
            .session_ttl_seconds
            .unwrap_or(DEFAULT_SESSION_TTL_SECS),
        "identity.session_ttl_seconds",
    )?;
    if session_ttl.as_secs() > MAX_SESSION_TTL_SECS {
        return Err(LoadError::invalid(
            "identity.session_ttl_seconds",
            format!("must not exceed {MAX_SESSION_TTL_SECS} seconds"),
        ));
    }
    let request_timeout = positive_seconds(
        identity
            .request_timeout_seconds
            .unwrap_or(DEFAULT_IDENTITY_TIMEOUT_SECS),
        "identity.request_timeout_seconds",
    )?;

    Ok(IdentitySettings {
        google_client_id,
        tokeninfo_url,
        session_ttl,
        request_timeout,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
    connect_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSnapshotSettings {
    stale_after_seconds: Option<u64>,
    prerender_on_startup: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCommentSettings {
    page_size_default: Option<u32>,
    page_size_max: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawIdentitySettings {
    google_client_id: Option<String>,
    tokeninfo_url: Option<String>,
    session_ttl_seconds: Option<u64>,
    request_timeout_seconds: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn positive_seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
