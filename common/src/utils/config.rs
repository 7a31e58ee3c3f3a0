use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    OpenAI,
    Hashed,
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default)]
    pub embedding_backend: EmbeddingBackend,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: u32,
    #[serde(default = "default_query_model")]
    pub query_model: String,
    #[serde(default = "default_chunk_max_words")]
    pub chunk_max_words: usize,
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_embedding_concurrency")]
    pub embedding_concurrency: usize,
    #[serde(default = "default_embedding_retry_attempts")]
    pub embedding_retry_attempts: usize,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default)]
    pub allow_private_hosts: bool,
    #[serde(default = "default_max_question_bytes")]
    pub max_question_bytes: usize,
    #[serde(default = "default_max_site_id_len")]
    pub max_site_id_len: usize,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

const fn default_http_port() -> u16 {
    8000
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

const fn default_embedding_dimensions() -> u32 {
    1536
}

fn default_query_model() -> String {
    "gpt-4".to_string()
}

const fn default_chunk_max_words() -> usize {
    200
}

const fn default_retrieval_top_k() -> usize {
    3
}

const fn default_fetch_timeout_secs() -> u64 {
    15
}

const fn default_embedding_concurrency() -> usize {
    4
}

const fn default_embedding_retry_attempts() -> usize {
    2
}

fn default_static_dir() -> String {
    "./static".to_string()
}

const fn default_max_question_bytes() -> usize {
    4096
}

const fn default_max_site_id_len() -> usize {
    128
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: default_base_url(),
            http_port: default_http_port(),
            embedding_backend: EmbeddingBackend::default(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            query_model: default_query_model(),
            chunk_max_words: default_chunk_max_words(),
            retrieval_top_k: default_retrieval_top_k(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            embedding_concurrency: default_embedding_concurrency(),
            embedding_retry_attempts: default_embedding_retry_attempts(),
            cors_allowed_origins: Vec::new(),
            static_dir: default_static_dir(),
            allow_private_hosts: false,
            max_question_bytes: default_max_question_bytes(),
            max_site_id_len: default_max_site_id_len(),
        }
    }
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::default()
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cors_allowed_origins"),
        )
        .build()?;

    let config: AppConfig = config.try_deserialize()?;
    config.validate()?;

    Ok(config)
}

impl AppConfig {
    /// Rejects settings that would make indexing or retrieval degenerate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retrieval_top_k == 0 {
            return Err(ConfigError::Message(
                "retrieval_top_k must be at least 1".to_string(),
            ));
        }
        if self.chunk_max_words == 0 {
            return Err(ConfigError::Message(
                "chunk_max_words must be at least 1".to_string(),
            ));
        }
        if self.embedding_dimensions == 0 {
            return Err(ConfigError::Message(
                "embedding_dimensions must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
