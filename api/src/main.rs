use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod dataset;
mod error;
mod extract;
mod middleware;
mod oracle;
mod prompts;
mod routes;
mod services;
mod state;

use oracle::{ChatOracle, OracleSettings};

const DEFAULT_ORACLE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_ORACLE_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_ORACLE_TIMEOUT_SECS: u64 = 30;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Riskgate API",
        version = "0.1.0",
        description = "Transaction fraud-risk scoring and identity-document extraction, \
                       backed by a generative model with typed, validated fallback behavior."
    ),
    paths(
        routes::health::health_check,
        routes::predict::predict,
        routes::extract_id::extract_id,
    ),
    components(schemas(
        riskgate_core::error::ApiError,
        riskgate_core::identity::IdentityRecord,
        routes::health::HealthResponse,
        routes::predict::PredictResponse,
        routes::extract_id::ExtractIdResponse,
    ))
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "riskgate_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let api_key =
        std::env::var("RISKGATE_ORACLE_API_KEY").expect("RISKGATE_ORACLE_API_KEY must be set");
    let base_url = env_or("RISKGATE_ORACLE_URL", DEFAULT_ORACLE_URL);
    let model = env_or("RISKGATE_ORACLE_MODEL", DEFAULT_ORACLE_MODEL);
    let timeout_secs: u64 = std::env::var("RISKGATE_ORACLE_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_ORACLE_TIMEOUT_SECS);

    let oracle = Arc::new(ChatOracle::new(OracleSettings {
        base_url,
        model: model.clone(),
        api_key,
        timeout: Duration::from_secs(timeout_secs),
    }));
    let dataset = Arc::new(dataset::load_from_env());

    let app_state = state::AppState {
        oracle,
        oracle_model: model,
        dataset,
    };

    let cors_layer = middleware::cors::build_cors_layer();

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::predict::router())
        .merge(routes::extract_id::router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Riskgate API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    axum::serve(listener, app).await.expect("server error");
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}
