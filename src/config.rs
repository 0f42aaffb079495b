//! Server configuration, loaded from environment variables at startup.

use std::{env, fmt, time::Duration};

use anyhow::{bail, Context};

/// Which backing store the message endpoints talk to.
#[derive(Clone, PartialEq)]
pub enum StoreConfig {
    /// Hosted Postgres behind the PostgREST API.
    Supabase { url: String, key: String },
    MongoDb { uri: String, database: String },
    /// Process-local store, lost on restart.
    Memory,
}

impl StoreConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreConfig::Supabase { .. } => "supabase",
            StoreConfig::MongoDb { .. } => "mongodb",
            StoreConfig::Memory => "memory",
        }
    }
}

// Keeps the API key out of the startup log.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreConfig::Supabase { url, .. } => f
                .debug_struct("Supabase")
                .field("url", url)
                .finish_non_exhaustive(),
            StoreConfig::MongoDb { uri, database } => f
                .debug_struct("MongoDb")
                .field("uri", uri)
                .field("database", database)
                .finish(),
            StoreConfig::Memory => f.write_str("Memory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
    pub rate_limit: RateLimitConfig,
}

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_WINDOW_SECS: u64 = 15 * 60;
const DEFAULT_MAX_REQUESTS: usize = 100;

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Malformed numbers
    /// fall back to their defaults; store settings are strict.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let store = match lookup("DARS_STORE").as_deref().unwrap_or("supabase") {
            "supabase" => StoreConfig::Supabase {
                url: lookup("SUPABASE_URL").context("SUPABASE_URL is not set")?,
                key: lookup("SUPABASE_KEY").context("SUPABASE_KEY is not set")?,
            },
            "mongodb" => StoreConfig::MongoDb {
                uri: lookup("MONGODB_URI")
                    .unwrap_or_else(|| "mongodb://localhost:27017".to_string()),
                database: lookup("MONGODB_DATABASE").unwrap_or_else(|| "dars".to_string()),
            },
            "memory" => StoreConfig::Memory,
            other => bail!("unknown DARS_STORE {other:?}, expected supabase, mongodb or memory"),
        };

        Ok(Config {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            store,
            rate_limit: RateLimitConfig {
                window: Duration::from_secs(parse_or(
                    &lookup,
                    "RATE_LIMIT_WINDOW_SECS",
                    DEFAULT_WINDOW_SECS,
                )),
                max_requests: parse_or(&lookup, "RATE_LIMIT_MAX", DEFAULT_MAX_REQUESTS),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
