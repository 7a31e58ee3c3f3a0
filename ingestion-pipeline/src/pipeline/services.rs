use std::sync::Arc;

use async_trait::async_trait;
use common::{error::AppError, utils::embedding::EmbeddingProvider};

use super::IndexingConfig;
use crate::utils::url_text_retrieval::{build_http_client, fetch_page};

/// Network-bound collaborators of the indexer.
#[async_trait]
pub trait IndexingServices: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, AppError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;

    /// Length of every vector `embed` is expected to return.
    fn embedding_dimension(&self) -> usize;
}

pub struct DefaultIndexingServices {
    http_client: reqwest::Client,
    embedding_provider: Arc<EmbeddingProvider>,
}

impl DefaultIndexingServices {
    pub fn new(
        config: &IndexingConfig,
        embedding_provider: Arc<EmbeddingProvider>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            http_client: build_http_client(config.fetch_timeout, config.allow_private_hosts)?,
            embedding_provider,
        })
    }
}

#[async_trait]
impl IndexingServices for DefaultIndexingServices {
    async fn fetch_page(&self, url: &str) -> Result<String, AppError> {
        fetch_page(&self.http_client, url).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        self.embedding_provider
            .embed(text)
            .await
            .map_err(AppError::from)
    }

    fn embedding_dimension(&self) -> usize {
        self.embedding_provider.dimension()
    }
}
