//! Query Lambda - Handles the /query endpoint.
//!
//! Endpoints:
//! - POST /query - Answer a citizen query
//! - GET / - Health check

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Serialize;
use shared::http::{error_response, json_response};
use shared::{parse_body, CivicAssistant, Config, QueryRequest};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Application state
struct AppState {
    assistant: CivicAssistant,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let mut config = Config::from_env()?;

        if config.gemini_api_key.is_none() {
            if let Some(secret_arn) = config.gemini_api_key_secret_arn.clone() {
                let sdk_config = config.aws_sdk_config().await;
                let secrets_client = aws_sdk_secretsmanager::Client::new(&sdk_config);
                match shared::resolve_api_key(&secrets_client, &secret_arn).await {
                    Ok(key) => config.gemini_api_key = Some(key),
                    Err(e) => warn!(error = %e, "Failed to resolve Gemini API key secret"),
                }
            }
        }

        let assistant = CivicAssistant::from_config(&config).await?;
        Ok(Self { assistant })
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = event.uri().path();

    info!("Query request: {} {}", method, path);

    match (method, path) {
        ("POST", "/query") => {
            let request: QueryRequest = parse_body!(event.body());
            let payload = state.assistant.handle(&request).await;
            json_response(200, &payload)
        }

        ("GET", "/") => json_response(
            200,
            &HealthResponse {
                status: "CivicNexus AI Backend Running",
            },
        ),

        _ => error_response(404, "Not found"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = state.clone();
        async move { handler(state, event).await }
    }))
    .await
}
