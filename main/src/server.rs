use std::sync::Arc;

use api_router::{api_routes, api_state::ApiState};
use axum::{http::HeaderValue, response::IntoResponse, routing::get, Json, Router};
use common::utils::{
    config::{get_config, AppConfig},
    embedding::EmbeddingProvider,
};
use serde_json::json;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    services::ServeDir,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    let openai_client = Arc::new(async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    ));

    // Create embedding provider based on config
    let embedding_provider = Arc::new(EmbeddingProvider::from_config(
        &config,
        Some(Arc::clone(&openai_client)),
    )?);
    info!(
        embedding_backend = embedding_provider.backend_label(),
        embedding_dimension = embedding_provider.dimension(),
        embedding_model = ?embedding_provider.model_code(),
        "Embedding provider initialized"
    );

    let api_state = ApiState::new(&config, openai_client, embedding_provider)?;
    let app = build_app(&config, api_state);

    info!("Starting server listening on 0.0.0.0:{}", config.http_port);
    let serve_address = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_app(config: &AppConfig, api_state: ApiState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .merge(api_routes())
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(cors_layer(config))
        .with_state(api_state)
}

async fn welcome() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to the AI Chatbot API! Use POST /query to ask questions."
    }))
}

/// Credentialed CORS cannot use wildcards, so methods and headers mirror the request.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(origin = %origin, error = %err, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
