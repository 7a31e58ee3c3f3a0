use std::sync::Arc;

use async_openai::{config::OpenAIConfig, Client};
use common::{
    error::AppError,
    utils::{config::AppConfig, embedding::EmbeddingProvider},
};
use ingestion_pipeline::{IndexingConfig, IndexingPipeline};
use retrieval_pipeline::{
    answer_retrieval::{AnswerGenerator, OpenAIAnswerGenerator},
    SiteIndexStore,
};

#[derive(Clone)]
pub struct ApiState {
    pub config: AppConfig,
    pub store: Arc<SiteIndexStore>,
    pub indexing_pipeline: Arc<IndexingPipeline>,
    pub embedding_provider: Arc<EmbeddingProvider>,
    pub answer_generator: Arc<dyn AnswerGenerator>,
}

impl ApiState {
    pub fn new(
        config: &AppConfig,
        openai_client: Arc<Client<OpenAIConfig>>,
        embedding_provider: Arc<EmbeddingProvider>,
    ) -> Result<Self, AppError> {
        let indexing_pipeline = IndexingPipeline::new(
            IndexingConfig::from_app_config(config),
            Arc::clone(&embedding_provider),
        )?;
        let answer_generator =
            OpenAIAnswerGenerator::new(openai_client, config.query_model.clone());

        Ok(Self::with_resources(
            config.clone(),
            Arc::new(SiteIndexStore::new()),
            Arc::new(indexing_pipeline),
            embedding_provider,
            Arc::new(answer_generator),
        ))
    }

    pub fn with_resources(
        config: AppConfig,
        store: Arc<SiteIndexStore>,
        indexing_pipeline: Arc<IndexingPipeline>,
        embedding_provider: Arc<EmbeddingProvider>,
        answer_generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self {
            config,
            store,
            indexing_pipeline,
            embedding_provider,
            answer_generator,
        }
    }
}
