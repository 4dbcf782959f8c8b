use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use throne_core::constants::{models, server, status};
use throne_core::llm::LocalModel;
use throne_core::{validate_message, ProviderGateway, ReplyRequest};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::types::*;

pub async fn health_check() -> &'static str {
    server::HEALTH
}

pub async fn chat_info() -> Json<ChatInfoResponse> {
    Json(ChatInfoResponse {
        message: server::ROUTE_BANNER,
        description: server::ROUTE_DESCRIPTION,
        status: status::SERVICE_ACTIVE,
    })
}

pub async fn handle_chat(
    State(gateway): State<Arc<ProviderGateway>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!("Rejected chat body: {}", rejection.body_text());
            return bad_request(rejection.body_text());
        }
    };

    let message = match req.message {
        Some(message) if !message.is_empty() => message,
        _ => return bad_request(status::MESSAGE_REQUIRED),
    };
    if let Err(e) = validate_message(&message) {
        return bad_request(e.to_string());
    }

    let mut request = ReplyRequest::new(message)
        .with_history(req.conversation_history)
        .with_prefer_primary(req.use_openai.unwrap_or(true));
    if let Some(model) = req.model.filter(|m| !m.trim().is_empty()) {
        request = request.with_model(model);
    }

    // The reply resolves on its own task; dropping this handler (client gone)
    // cancels it through the guard.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let task = tokio::spawn(async move { gateway.get_reply(&request, &cancel).await });

    match task.await {
        Ok(reply) => {
            info!("Chat reply resolved by {} ({})", reply.source, reply.model_name);
            let diagnostics = match reply.diagnostics {
                Some(Value::Object(map)) => map,
                _ => Default::default(),
            };
            Json(ChatResponse {
                status: reply.source.status(),
                reply: reply.text,
                timestamp: reply.timestamp,
                model: reply.model_name,
                source: reply.source,
                diagnostics,
            })
            .into_response()
        }
        Err(e) => {
            error!("Chat reply task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: status::INTERNAL_ERROR.to_string(),
                    fallback: Some(status::INTERNAL_FALLBACK.to_string()),
                }),
            )
                .into_response()
        }
    }
}

pub async fn handle_models(State(gateway): State<Arc<ProviderGateway>>) -> Json<ModelsResponse> {
    let primary_models = models::PRIMARY_CATALOG
        .iter()
        .map(|&(name, label)| PrimaryModelInfo { name, label })
        .collect();

    let (local, outcome, failure) = match gateway.list_local_models().await {
        Ok(local) => (local, status::MODELS_RETRIEVED, None),
        Err(e) => {
            warn!("Failed to fetch local models: {}", e);
            (
                vec![fallback_model()],
                status::MODELS_FALLBACK,
                Some(status::MODELS_FAILURE_ERROR),
            )
        }
    };

    Json(ModelsResponse {
        count: local.len(),
        models: local,
        primary_models,
        status: outcome,
        error: failure,
        timestamp: Utc::now(),
    })
}

/// Advertised when the local provider cannot be reached.
fn fallback_model() -> LocalModel {
    LocalModel {
        name: models::DEFAULT_LOCAL_MODEL.to_string(),
        size: 0,
        modified_at: Utc::now().to_rfc3339(),
        digest: "fallback".to_string(),
        details: serde_json::json!({ "family": "omari", "format": "gguf" }),
    }
}

fn bad_request(error: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.into(),
            fallback: None,
        }),
    )
        .into_response()
}
