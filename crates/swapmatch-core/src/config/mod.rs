//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `SWAPMATCH_*` environment
//! variables. The ranking provider credential is read by the provider client
//! itself (`GEMINI_API_KEY`), not through this struct.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SWAPMATCH_*` overrides on top of
/// defaults, then [`Config::validate`] before wiring anything up.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Catalog database URL. Default: `mysql://root@127.0.0.1:3306/catalog`.
    pub database_url: String,

    /// Max connections in the database pool. Default: `5`.
    pub db_max_conns: u32,

    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub qdrant_url: String,

    /// Qdrant collection holding the product index. Default: `products`.
    pub collection: String,

    /// Embedding provider endpoint (OpenAI-style `/embeddings`).
    pub embedding_url: String,

    /// Embedding model identifier. Default: `text-embedding-3-small`.
    pub embedding_model: String,

    /// Bearer token for the embedding provider, if it requires one.
    pub embedding_api_key: Option<String>,

    /// Embedding vector width. Default: `1536`.
    pub embedding_dim: usize,

    /// Ranking model identifier. Default: `gemini-2.5-flash`.
    pub ranking_model: String,

    /// Candidates fetched from the vector index per request. Default: `20`.
    pub candidate_pool: usize,

    /// Maximum substitutes returned per request. Default: `5`.
    pub max_substitutes: usize,

    /// Per-client daily request allowance. Default: `50`.
    pub daily_quota: u32,

    /// Cache TTL in seconds for retrieval and ranking results.
    /// `0` disables both caches. Default: `3600`.
    pub cache_ttl_secs: u64,
}

/// Default Qdrant URL used when `SWAPMATCH_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Default embedding endpoint used when `SWAPMATCH_EMBEDDING_URL` is not set.
pub const DEFAULT_EMBEDDING_URL: &str = "https://api.openai.com/v1/embeddings";

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            database_url: "mysql://root@127.0.0.1:3306/catalog".to_string(),
            db_max_conns: 5,
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            collection: "products".to_string(),
            embedding_url: DEFAULT_EMBEDDING_URL.to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_api_key: None,
            embedding_dim: 1536,
            ranking_model: "gemini-2.5-flash".to_string(),
            candidate_pool: 20,
            max_substitutes: 5,
            daily_quota: 50,
            cache_ttl_secs: 3600,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "SWAPMATCH_PORT";
    const ENV_BIND_ADDR: &'static str = "SWAPMATCH_BIND_ADDR";
    const ENV_DATABASE_URL: &'static str = "SWAPMATCH_DATABASE_URL";
    const ENV_DB_MAX_CONNS: &'static str = "SWAPMATCH_DB_MAX_CONNS";
    const ENV_QDRANT_URL: &'static str = "SWAPMATCH_QDRANT_URL";
    const ENV_COLLECTION: &'static str = "SWAPMATCH_COLLECTION";
    const ENV_EMBEDDING_URL: &'static str = "SWAPMATCH_EMBEDDING_URL";
    const ENV_EMBEDDING_MODEL: &'static str = "SWAPMATCH_EMBEDDING_MODEL";
    const ENV_EMBEDDING_API_KEY: &'static str = "SWAPMATCH_EMBEDDING_API_KEY";
    const ENV_EMBEDDING_DIM: &'static str = "SWAPMATCH_EMBEDDING_DIM";
    const ENV_RANKING_MODEL: &'static str = "SWAPMATCH_RANKING_MODEL";
    const ENV_CANDIDATE_POOL: &'static str = "SWAPMATCH_CANDIDATE_POOL";
    const ENV_MAX_SUBSTITUTES: &'static str = "SWAPMATCH_MAX_SUBSTITUTES";
    const ENV_DAILY_QUOTA: &'static str = "SWAPMATCH_DAILY_QUOTA";
    const ENV_CACHE_TTL_SECS: &'static str = "SWAPMATCH_CACHE_TTL_SECS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let database_url =
            Self::parse_string_from_env(Self::ENV_DATABASE_URL, defaults.database_url);
        let db_max_conns =
            Self::parse_u64_from_env(Self::ENV_DB_MAX_CONNS, defaults.db_max_conns as u64)? as u32;
        let qdrant_url = Self::parse_string_from_env(Self::ENV_QDRANT_URL, defaults.qdrant_url);
        let collection = Self::parse_string_from_env(Self::ENV_COLLECTION, defaults.collection);
        let embedding_url =
            Self::parse_string_from_env(Self::ENV_EMBEDDING_URL, defaults.embedding_url);
        let embedding_model =
            Self::parse_string_from_env(Self::ENV_EMBEDDING_MODEL, defaults.embedding_model);
        let embedding_api_key = Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_API_KEY);
        let embedding_dim =
            Self::parse_u64_from_env(Self::ENV_EMBEDDING_DIM, defaults.embedding_dim as u64)?
                as usize;
        let ranking_model =
            Self::parse_string_from_env(Self::ENV_RANKING_MODEL, defaults.ranking_model);
        let candidate_pool =
            Self::parse_u64_from_env(Self::ENV_CANDIDATE_POOL, defaults.candidate_pool as u64)?
                as usize;
        let max_substitutes =
            Self::parse_u64_from_env(Self::ENV_MAX_SUBSTITUTES, defaults.max_substitutes as u64)?
                as usize;
        let daily_quota =
            Self::parse_u64_from_env(Self::ENV_DAILY_QUOTA, defaults.daily_quota as u64)? as u32;
        let cache_ttl_secs =
            Self::parse_u64_from_env(Self::ENV_CACHE_TTL_SECS, defaults.cache_ttl_secs)?;

        Ok(Self {
            port,
            bind_addr,
            database_url,
            db_max_conns,
            qdrant_url,
            collection,
            embedding_url,
            embedding_model,
            embedding_api_key,
            embedding_dim,
            ranking_model,
            candidate_pool,
            max_substitutes,
            daily_quota,
            cache_ttl_secs,
        })
    }

    /// Validates cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_dim == 0 {
            return Err(ConfigError::ValueTooSmall {
                var: Self::ENV_EMBEDDING_DIM,
                min: 1,
            });
        }

        if self.max_substitutes == 0 {
            return Err(ConfigError::ValueTooSmall {
                var: Self::ENV_MAX_SUBSTITUTES,
                min: 1,
            });
        }

        if self.candidate_pool < self.max_substitutes {
            return Err(ConfigError::PoolTooNarrow {
                pool: self.candidate_pool,
                width: self.max_substitutes,
            });
        }

        if self.db_max_conns == 0 {
            return Err(ConfigError::ValueTooSmall {
                var: Self::ENV_DB_MAX_CONNS,
                min: 1,
            });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_u64_from_env(var_name: &'static str, default: u64) -> Result<u64, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { var: var_name, value }),
            Err(_) => Ok(default),
        }
    }
}
