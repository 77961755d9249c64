use crate::config::ServerConfig;
use crate::error::{EngineError, ErrorCode};
use crate::model::request::GenerationRequest;
use crate::model::response::ApiResponse;
use crate::pipeline::StimulusPipeline;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderValue, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state
pub type AppState = Arc<StimulusPipeline>;

/// Build the API router
pub fn router(pipeline: Arc<StimulusPipeline>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/api/v2/generate", post(generate))
        .route("/health", get(health_check))
        .layer(cors_layer(config))
        .with_state(pipeline)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the web server
pub async fn start_server(
    pipeline: Arc<StimulusPipeline>,
    config: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(pipeline, config);
    let address = config.bind_address();

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, "Stimulus engine listening");

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::GenerationFailed => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn failure(err: &EngineError) -> (StatusCode, Json<ApiResponse>) {
    (status_for(err.code()), Json(ApiResponse::failure(err)))
}

/// Body is parsed here so malformed JSON still gets the failure envelope
async fn generate(
    State(pipeline): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<ApiResponse>) {
    let request: GenerationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected malformed generate request");
            return failure(&EngineError::invalid_request(format!("Malformed request body: {}", e)));
        }
    };

    match pipeline.run(&request).await {
        Ok(result) => (StatusCode::OK, Json(ApiResponse::success(result))),
        Err(err) => {
            warn!(code = err.code().as_str(), details = ?err.details(), "Generate request failed");
            failure(&err)
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    llm: &'static str,
}

async fn health_check(State(pipeline): State<AppState>) -> Json<HealthResponse> {
    let llm = if pipeline.generator().health_check().await {
        "ok"
    } else {
        "unavailable"
    };
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        llm,
    })
}
