use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the noticeboard binary.
#[derive(Debug, Parser)]
#[command(name = "noticeboard", version, about = "Captain's announcement board")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "NOTICEBOARD_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the board HTTP server.
    Serve(Box<ServeArgs>),
    /// Apply pending database migrations and exit.
    Migrate(MigrateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

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

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the image host upload endpoint.
    #[arg(long = "uploads-endpoint", value_name = "URL")]
    pub uploads_endpoint: Option<String>,

    /// Override the image host API key.
    #[arg(long = "uploads-api-key", value_name = "KEY")]
    pub uploads_api_key: Option<String>,

    /// Override the maximum multipart request size in bytes.
    #[arg(long = "uploads-max-request-bytes", value_name = "BYTES")]
    pub uploads_max_request_bytes: Option<u64>,

    /// Override the number of announcements per page.
    #[arg(long = "board-page-size", value_name = "COUNT")]
    pub board_page_size: Option<u32>,

    /// Override the display timezone (IANA name, e.g. Europe/Berlin).
    #[arg(long = "board-timezone", value_name = "TZ")]
    pub board_timezone: Option<String>,

    /// Override the header carrying the signed-in email.
    #[arg(long = "auth-identity-header", value_name = "HEADER")]
    pub auth_identity_header: Option<String>,

    /// Override where visitors without an identity are sent.
    #[arg(long = "auth-entry-url", value_name = "URL")]
    pub auth_entry_url: Option<String>,
}
