//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{HttpBackendAdapter, OpenAiCounsellorAdapter},
    config::{Config, CounsellorProvider},
    error::ApiError,
    web::{
        self,
        rest::ApiDoc,
        state::{AppState, SessionRegistry, SessionSettings},
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use dream_university_core::{
    ports::{CatalogService, CounsellorService},
    ResilienceSettings, ResilientClient,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let http_client = reqwest::Client::builder().build()?;
    let backend = Arc::new(HttpBackendAdapter::new(http_client, config.backend_base_url.clone()));
    info!("Using backend at {}", config.backend_base_url);

    let catalog: Arc<dyn CatalogService> = backend.clone();
    let counsellor: Arc<dyn CounsellorService> = match config.counsellor_provider {
        CounsellorProvider::Backend => backend,
        CounsellorProvider::OpenAi => {
            let openai_config = OpenAIConfig::new().with_api_key(
                config
                    .openai_api_key
                    .as_ref()
                    .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
            );
            info!("Counsellor answers come from model {}", config.counsellor_model);
            Arc::new(OpenAiCounsellorAdapter::new(
                Client::with_config(openai_config),
                config.counsellor_model.clone(),
                catalog.clone(),
            ))
        }
    };

    let client = ResilientClient::new(
        counsellor,
        ResilienceSettings {
            chat_timeout: Some(config.chat_timeout),
            draft_timeout: config.draft_timeout,
            draft_fallback_delay: config.draft_fallback_delay,
        },
    );

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        catalog,
        client,
        settings: SessionSettings::from_config(&config),
        sessions: Arc::new(SessionRegistry::default()),
    });
    tokio::spawn(web::sweep_expired_sessions(app_state.clone(), SWEEP_INTERVAL));

    let allowed_origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid ALLOWED_ORIGIN '{}': {}", config.allowed_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
