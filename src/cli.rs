//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use downloader_api::{ConfigError, ConfigSource, DEFAULT_BIND, ServerConfig};

/// Guarded remote fetch service.
///
/// Serves `/metadata` and `/download` for public http(s) resources, refusing
/// private network targets and oversized transfers, plus a small notes and
/// key/value API.
#[derive(Parser, Debug)]
#[command(name = "downloader-api")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Byte ceiling for one proxied download
    #[arg(long, env = "MAX_BYTES", default_value_t = downloader_api::DEFAULT_MAX_BYTES)]
    pub max_bytes: u64,

    /// Seconds without a body chunk before a download is cut (0 to disable)
    #[arg(long, env = "IDLE_TIMEOUT_SECS", default_value_t = 60)]
    pub idle_timeout_secs: u64,

    /// SQLite file for notes (notes routes answer 503 without it)
    #[arg(long, env = "DATABASE_PATH")]
    pub database: Option<PathBuf>,

    /// Comma separated API keys accepted in x-api-key (empty disables auth)
    #[arg(long, env = "API_KEYS", hide_env_values = true)]
    pub api_keys: Option<String>,

    /// Upstash-compatible Redis REST URL
    #[arg(long, env = "UPSTASH_REDIS_REST_URL")]
    pub kv_rest_url: Option<String>,

    /// Token for the Redis REST URL
    #[arg(long, env = "UPSTASH_REDIS_REST_TOKEN", hide_env_values = true)]
    pub kv_rest_token: Option<String>,
}

impl Args {
    /// Validates the parsed flags into a server configuration.
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        ConfigSource {
            bind: self.bind,
            max_bytes: self.max_bytes,
            idle_timeout_secs: self.idle_timeout_secs,
            database: self.database,
            api_keys: self.api_keys,
            kv_rest_url: self.kv_rest_url,
            kv_rest_token: self.kv_rest_token,
        }
        .validate()
    }
}
