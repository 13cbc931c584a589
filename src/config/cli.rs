use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the Gazette binary.
#[derive(Debug, Parser)]
#[command(name = "gazette", version, about = "Gazette publishing server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "GAZETTE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(Box<ServeArgs>),
    /// Apply database migrations and exit.
    Migrate(MigrateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override how long a post snapshot is served before it is regenerated.
    #[arg(long = "snapshots-stale-after-seconds", value_name = "SECONDS")]
    pub snapshots_stale_after_seconds: Option<u64>,

    /// Toggle rendering every known post before the listener starts.
    #[arg(
        long = "snapshots-prerender-on-startup",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub snapshots_prerender_on_startup: Option<bool>,

    /// Override the default comment page size.
    #[arg(long = "comments-page-size", value_name = "COUNT")]
    pub comments_page_size: Option<u32>,

    /// Override the Google OAuth client id used by the sign-in page.
    #[arg(long = "identity-google-client-id", value_name = "ID")]
    pub identity_google_client_id: Option<String>,

    /// Override the session lifetime.
    #[arg(long = "identity-session-ttl-seconds", value_name = "SECONDS")]
    pub identity_session_ttl_seconds: Option<u64>,
}
