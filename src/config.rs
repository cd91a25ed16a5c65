// Configuration module for cpgraph
// Reads from environment variables with sensible defaults

use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Read connection pool size (CPGRAPH_POOL_SIZE)
    pub pool_size: u32,

    /// Read connection pool minimum idle connections (CPGRAPH_POOL_MIN_IDLE)
    pub pool_min_idle: u32,

    /// SQLite busy timeout in milliseconds (CPGRAPH_BUSY_TIMEOUT_MS)
    pub busy_timeout_ms: u64,

    /// Requests slower than this are logged (CPGRAPH_SLOW_QUERY_MS)
    pub slow_query_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool_size: 8,
            pool_min_idle: 1,
            busy_timeout_ms: 5_000,
            slow_query_ms: 100,
        }
    }
}

fn override_from_env<T: FromStr + std::fmt::Display>(key: &str, target: &mut T) {
    if let Ok(val) = env::var(key) {
        match val.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => log::warn!(
                "Invalid {} value: {}, using default: {}",
                key,
                val,
                target
            ),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let mut config = Config::default();
        override_from_env("CPGRAPH_POOL_SIZE", &mut config.pool_size);
        override_from_env("CPGRAPH_POOL_MIN_IDLE", &mut config.pool_min_idle);
        override_from_env("CPGRAPH_BUSY_TIMEOUT_MS", &mut config.busy_timeout_ms);
        override_from_env("CPGRAPH_SLOW_QUERY_MS", &mut config.slow_query_ms);
        if config.pool_size == 0 {
            log::warn!("CPGRAPH_POOL_SIZE must be at least 1, using 1");
            config.pool_size = 1;
        }
        config.pool_min_idle = config.pool_min_idle.min(config.pool_size);
        config
    }

    /// Get the global configuration instance
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::from_env)
    }
}
