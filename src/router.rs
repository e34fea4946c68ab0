use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::gemini::{GeminiContent, GeminiInlineData, GeminiPart, GeminiRequest};
use crate::llm_client::GenerativeModel;
use crate::models::{ChatRequest, ConversationTurn, ErrorResponse, GenerateTextRequest, ResultResponse};
use crate::request_id;
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use bytes::Bytes;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};

pub const LIVENESS_TEXT: &str = "Gemini Flash API is running";

#[derive(Clone)]
pub struct AppState {
    pub llm_client: Arc<dyn GenerativeModel>,
    pub config: Arc<Config>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/generate-text", post(generate_text))
        .route("/generate-image", post(generate_image))
        .route("/generate-audio", post(generate_audio))
        .route("/generate-from-document", post(generate_from_document))
        .route("/api/chat", post(chat))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(axum::middleware::from_fn(request_id::inject_request_id))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Clone, Copy)]
enum Route {
    Text,
    Image,
    Audio,
    Document,
    Chat,
}

impl Route {
    fn failure_message(self) -> &'static str {
        match self {
            Route::Text => "Failed to generate text",
            Route::Image => "Failed to generate image",
            Route::Audio => "Failed to generate audio",
            Route::Document => "Failed to generate document",
            Route::Chat => "Failed to generate chat response",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Route::Text => "text",
            Route::Image => "image",
            Route::Audio => "audio",
            Route::Document => "document",
            Route::Chat => "chat response",
        }
    }

    fn default_prompt(self, config: &Config) -> Option<String> {
        match self {
            Route::Image => config.prompts.image.clone(),
            Route::Audio => Some(config.prompts.audio.clone()),
            Route::Document => Some(config.prompts.document.clone()),
            Route::Text | Route::Chat => None,
        }
    }
}

/// Text part first, then the inline payload.
pub fn build_content_parts(text: Option<String>, inline_data: Option<GeminiInlineData>) -> Vec<GeminiPart> {
    let mut parts = Vec::with_capacity(2);
    if let Some(text) = text {
        parts.push(GeminiPart::text(text));
    }
    if let Some(inline_data) = inline_data {
        parts.push(GeminiPart::InlineData { inline_data });
    }
    parts
}

pub async fn call_model(model: &dyn GenerativeModel, request: GeminiRequest) -> Result<Option<String>> {
    let response = model.generate_content(request).await?;
    if let Some(usage) = &response.usage_metadata {
        debug!(
            prompt_tokens = ?usage.prompt_token_count,
            candidates_tokens = ?usage.candidates_token_count,
            total_tokens = ?usage.total_token_count,
            "Gemini usage"
        );
    }
    let text = response.text();
    if text.is_none() {
        warn!("Gemini returned no text: {}", response.empty_reason());
    }
    Ok(text)
}

fn respond(route: Route, result: Result<String>) -> Response {
    match result {
        Ok(result) => (StatusCode::OK, Json(ResultResponse { result })).into_response(),
        Err(err) => failure(route, err),
    }
}

fn failure(route: Route, err: GatewayError) -> Response {
    match &err {
        GatewayError::Validation(_) => warn!("Error generating {}: {}", route.label(), err),
        GatewayError::Upstream(_) => error!("Error generating {}: {}", route.label(), err),
    }
    let body = ErrorResponse { error: route.failure_message().to_string() };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

pub async fn root() -> &'static str {
    LIVENESS_TEXT
}

#[axum_macros::debug_handler]
pub async fn generate_text(
    State(state): State<AppState>,
    body: std::result::Result<Json<GenerateTextRequest>, JsonRejection>,
) -> Response {
    respond(Route::Text, text_request(&state, body).await)
}

async fn text_request(
    state: &AppState,
    body: std::result::Result<Json<GenerateTextRequest>, JsonRejection>,
) -> Result<String> {
    let Json(request) = body.map_err(|e| GatewayError::Validation(e.body_text()))?;
    let request = GeminiRequest::from_parts(build_content_parts(Some(request.prompt), None));
    Ok(call_model(state.llm_client.as_ref(), request).await?.unwrap_or_default())
}

#[axum_macros::debug_handler]
pub async fn generate_image(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    respond(Route::Image, media_request(&state, Route::Image, "image", multipart).await)
}

#[axum_macros::debug_handler]
pub async fn generate_audio(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    respond(Route::Audio, media_request(&state, Route::Audio, "audio", multipart).await)
}

#[axum_macros::debug_handler]
pub async fn generate_from_document(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    respond(Route::Document, media_request(&state, Route::Document, "document", multipart).await)
}

struct Upload {
    bytes: Bytes,
    mime_type: String,
    prompt: Option<String>,
}

async fn read_upload(multipart: &mut Multipart, file_field: &str) -> Result<Upload> {
    let mut file: Option<(Bytes, String)> = None;
    let mut prompt = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::Validation(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == file_field && file.is_none() {
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| GatewayError::Validation(format!("Failed to read '{}': {}", file_field, e)))?;
            file = Some((bytes, mime_type));
        } else if name == "prompt" {
            let text = field
                .text()
                .await
                .map_err(|e| GatewayError::Validation(format!("Failed to read prompt: {}", e)))?;
            prompt = Some(text);
        }
    }

    let (bytes, mime_type) =
        file.ok_or_else(|| GatewayError::Validation(format!("No '{}' file uploaded", file_field)))?;
    Ok(Upload { bytes, mime_type, prompt })
}

/// `file_field` names the multipart field carrying the upload.
async fn media_request(
    state: &AppState,
    route: Route,
    file_field: &'static str,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<String> {
    let mut multipart = multipart.map_err(|e| GatewayError::Validation(e.body_text()))?;
    let upload = read_upload(&mut multipart, file_field).await?;
    info!(
        "Received {} upload: {} bytes ({})",
        file_field,
        upload.bytes.len(),
        upload.mime_type
    );

    let prompt = upload.prompt.or_else(|| route.default_prompt(&state.config));
    let inline_data = GeminiInlineData {
        mime_type: upload.mime_type,
        data: STANDARD.encode(&upload.bytes),
    };
    let request = GeminiRequest::from_parts(build_content_parts(prompt, Some(inline_data)));
    Ok(call_model(state.llm_client.as_ref(), request).await?.unwrap_or_default())
}

#[axum_macros::debug_handler]
pub async fn chat(
    State(state): State<AppState>,
    body: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    respond(Route::Chat, chat_request(&state, body).await)
}

async fn chat_request(
    state: &AppState,
    body: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<String> {
    let Json(request) = body.map_err(|e| GatewayError::Validation(e.body_text()))?;
    let turns = validate_conversation(&request.conversation)?;

    let contents = turns
        .into_iter()
        .map(|turn| GeminiContent {
            role: Some(turn.role),
            parts: vec![GeminiPart::text(turn.text)],
        })
        .collect();
    let request = GeminiRequest {
        contents,
        system_instruction: None,
        generation_config: None,
    }
    .with_system_instruction(state.config.chat.system_instruction.clone())
    .with_temperature(state.config.chat.temperature);

    match call_model(state.llm_client.as_ref(), request).await? {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(GatewayError::Upstream("Invalid response from Gemini API".to_string())),
    }
}

/// Every turn needs a non-empty string `role` and `text`; the first offender
/// is reported by index.
fn validate_conversation(conversation: &Value) -> Result<Vec<ConversationTurn>> {
    let items = conversation
        .as_array()
        .ok_or_else(|| GatewayError::Validation("Conversation must be an array".to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let field = |key: &str| {
                item.get(key)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            match (field("role"), field("text")) {
                (Some(role), Some(text)) => Ok(ConversationTurn { role, text }),
                _ => Err(GatewayError::Validation(format!(
                    "Invalid conversation at index {}: missing role or text",
                    index
                ))),
            }
        })
        .collect()
}
