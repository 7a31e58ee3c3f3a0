use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessage, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};
use async_trait::async_trait;
use common::error::AppError;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{store::QueryOutcome, RetrievedChunk};

pub const NOT_INDEXED_ANSWER: &str = "The website is not indexed yet. Please send a POST request to /index with the website URL first.";
pub const EMPTY_INDEX_ANSWER: &str = "The website was indexed but no readable text was found. Try indexing a different page.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Answered,
    NotIndexed,
    EmptyIndex,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub status: AnswerStatus,
    pub answer: String,
    pub sources: usize,
}

/// Completion backend that turns an assembled prompt into answer text.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, prompt: String) -> Result<String, AppError>;
}

pub struct OpenAIAnswerGenerator {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAIAnswerGenerator {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl AnswerGenerator for OpenAIAnswerGenerator {
    async fn generate(&self, prompt: String) -> Result<String, AppError> {
        let request = create_chat_request(prompt, &self.model)?;
        let response = self.client.chat().create(request).await?;
        process_llm_response(response)
    }
}

/// Joins retrieved chunks in the order they were returned, most similar first.
pub fn build_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|retrieved| retrieved.chunk.chunk.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn create_system_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant. Use the context to answer:\n\nContext:\n{context}\n\nQuestion: {question}"
    )
}

pub fn create_chat_request(
    prompt: String,
    model: &str,
) -> Result<CreateChatCompletionRequest, OpenAIError> {
    CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages([ChatCompletionRequestSystemMessage::from(prompt).into()])
        .build()
}

pub fn process_llm_response(response: CreateChatCompletionResponse) -> Result<String, AppError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AppError::LLMParsing("No content found in LLM response".into()))
}

/// Produces the caller-facing answer for a retrieval outcome. Only the
/// `Matches` case reaches the completion backend.
#[instrument(skip_all)]
pub async fn answer_question(
    generator: &dyn AnswerGenerator,
    outcome: QueryOutcome,
    question: &str,
) -> Result<Answer, AppError> {
    match outcome {
        QueryOutcome::NotIndexed => Ok(Answer {
            status: AnswerStatus::NotIndexed,
            answer: NOT_INDEXED_ANSWER.to_string(),
            sources: 0,
        }),
        QueryOutcome::EmptyIndex => Ok(Answer {
            status: AnswerStatus::EmptyIndex,
            answer: EMPTY_INDEX_ANSWER.to_string(),
            sources: 0,
        }),
        QueryOutcome::Matches(chunks) => {
            let context = build_context(&chunks);
            debug!(
                sources = chunks.len(),
                context_chars = context.len(),
                "Assembled answer context"
            );
            let answer = generator
                .generate(create_system_prompt(&context, question))
                .await?;

            Ok(Answer {
                status: AnswerStatus::Answered,
                answer,
                sources: chunks.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::storage::types::text_chunk::TextChunk;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AnswerGenerator for RecordingGenerator {
        async fn generate(&self, prompt: String) -> Result<String, AppError> {
            self.prompts.lock().await.push(prompt);
            Ok("generated answer".to_string())
        }
    }

    fn retrieved(position: usize, text: &str, score: f32) -> RetrievedChunk {
        RetrievedChunk {
            chunk: TextChunk::new(position, text.to_string()),
            score,
        }
    }

    #[test]
    fn context_keeps_returned_order() {
        let chunks = vec![retrieved(4, "best", 0.9), retrieved(0, "second", 0.5)];
        assert_eq!(build_context(&chunks), "best\n\nsecond");
    }

    #[test]
    fn prompt_contains_context_and_question() {
        let prompt = create_system_prompt("ctx", "When do you open?");
        assert_eq!(
            prompt,
            "You are a helpful assistant. Use the context to answer:\n\nContext:\nctx\n\nQuestion: When do you open?"
        );
    }

    #[test]
    fn chat_request_uses_configured_model() {
        let request = create_chat_request("prompt".into(), "gpt-4").expect("request");
        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.messages.len(), 1);
    }

    #[tokio::test]
    async fn not_indexed_and_empty_skip_the_generator() {
        let generator = RecordingGenerator::default();

        let not_indexed = answer_question(&generator, QueryOutcome::NotIndexed, "q")
            .await
            .expect("answer");
        let empty = answer_question(&generator, QueryOutcome::EmptyIndex, "q")
            .await
            .expect("answer");

        assert_eq!(not_indexed.status, AnswerStatus::NotIndexed);
        assert_eq!(not_indexed.answer, NOT_INDEXED_ANSWER);
        assert_eq!(empty.status, AnswerStatus::EmptyIndex);
        assert_ne!(not_indexed.answer, empty.answer);
        assert!(generator.prompts.lock().await.is_empty());
    }

    #[tokio::test]
    async fn matches_are_forwarded_as_context() {
        let generator = RecordingGenerator::default();
        let outcome =
            QueryOutcome::Matches(vec![retrieved(2, "closest", 0.9), retrieved(0, "next", 0.4)]);

        let answer = answer_question(&generator, outcome, "What?")
            .await
            .expect("answer");

        assert_eq!(answer.status, AnswerStatus::Answered);
        assert_eq!(answer.answer, "generated answer");
        assert_eq!(answer.sources, 2);

        let prompts = generator.prompts.lock().await;
        let prompt = prompts.first().expect("prompt recorded");
        assert!(prompt.contains("Context:\nclosest\n\nnext\n\nQuestion: What?"));
    }
}
