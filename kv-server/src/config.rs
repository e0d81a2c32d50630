use serde_derive::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8000;

/// Server configuration, layered: compiled-in defaults, then an optional
/// TOML file, then environment variables, then CLI flags - each layer
/// overriding the previous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shards: usize,
    /// `None` disables the cache entirely.
    pub cache_capacity: Option<usize>,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            shards: kv::router::DEFAULT_SHARD_COUNT,
            cache_capacity: None,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Loads the file layer via `confy`; a missing file is not an error, it
    /// just yields the compiled-in defaults.
    pub fn load_file(path: &str) -> anyhow::Result<Self> {
        let cfg: ServerConfig = confy::load_path(path)?;
        Ok(cfg)
    }

    /// Applies the environment-variable layer on top of `self`.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("KV_HOST") {
            self.host = v;
        }
        if let Ok(v) = std::env::var("KV_PORT") {
            if let Ok(port) = v.parse() {
                self.port = port;
            }
        }
        if let Ok(v) = std::env::var("KV_SHARDS") {
            if let Ok(shards) = v.parse() {
                self.shards = shards;
            }
        }
        if let Ok(v) = std::env::var("KV_CACHE_CAPACITY") {
            self.cache_capacity = v.parse().ok();
        }
        if let Ok(v) = std::env::var("KV_LOG_LEVEL") {
            self.log_level = v;
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, DEFAULT_HOST);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.cache_capacity, None);
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let cfg = ServerConfig { host: "0.0.0.0".to_string(), port: 9000, ..ServerConfig::default() };
        assert_eq!(cfg.bind_addr(), "0.0.0.0:9000");
    }
}
