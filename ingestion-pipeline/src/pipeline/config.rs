use std::time::Duration;

use common::utils::config::AppConfig;

#[derive(Debug, Clone)]
pub struct IndexingConfig {
    pub max_words: usize,
    pub fetch_timeout: Duration,
    pub embedding_concurrency: usize,
    pub embedding_retry_attempts: usize,
    pub retry_factor_ms: u64,
    pub retry_max_delay: Duration,
    /// Lets redirects land on loopback and private hosts.
    pub allow_private_hosts: bool,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_words: 200,
            fetch_timeout: Duration::from_secs(15),
            embedding_concurrency: 4,
            embedding_retry_attempts: 2,
            retry_factor_ms: 50,
            retry_max_delay: Duration::from_secs(2),
            allow_private_hosts: false,
        }
    }
}

impl IndexingConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_words: config.chunk_max_words,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            embedding_concurrency: config.embedding_concurrency,
            embedding_retry_attempts: config.embedding_retry_attempts,
            allow_private_hosts: config.allow_private_hosts,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_settings_carry_over() {
        let app = AppConfig {
            chunk_max_words: 50,
            fetch_timeout_secs: 3,
            allow_private_hosts: true,
            ..AppConfig::default()
        };

        let config = IndexingConfig::from_app_config(&app);

        assert_eq!(config.max_words, 50);
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
        assert!(config.allow_private_hosts);
        assert!(!IndexingConfig::default().allow_private_hosts);
    }
}
