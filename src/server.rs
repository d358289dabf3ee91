use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Form, Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::chat::on_submit;
use crate::config::{AppConfig, SessionConfig};
use crate::error::{ConfigError, SubmitError};
use crate::llm::{ChatClient, Creativity, Message};
use crate::session::{Session, SessionStore};
use crate::ui::{ChatView, about_page, chat_page, config_error_page};

/// Cookie carrying the browser's session id.
pub const SESSION_COOKIE: &str = "chat_session";

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Start the Axum server with the provided configuration.
pub async fn start_server(
    config: Arc<AppConfig>,
    client: ChatClient,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    info!(
        name: "llm.config.loaded",
        base_url = %config.gemini.base_url,
        model = %config.gemini.model,
        "Gemini configuration loaded"
    );

    let state = AppState::new(Arc::clone(&config), client, api_key);
    if let Err(e) = &state.api_key {
        tracing::error!(
            name: "config.api_key.unusable",
            error = %e,
            "Chat is disabled until the server is restarted with a valid API key"
        );
    }

    spawn_session_sweeper(state.sessions.clone(), &config.session);

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let timeout_duration = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .route("/", get(index))
        .route("/chat", post(submit))
        .route("/clear", post(clear))
        .route("/about", get(about))
        .route("/api/chat", post(api_chat))
        .route("/api/sessions", get(api_list_sessions).post(api_create_session))
        .route(
            "/api/sessions/{id}",
            get(api_get_session).delete(api_delete_session),
        )
        .route("/api/sessions/{id}/messages", get(api_get_messages))
        .route("/api/sessions/{id}/clear", post(api_clear_session))
        .route("/api/settings", get(api_settings))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically destroy sessions that have been idle too long.
fn spawn_session_sweeper(sessions: SessionStore, config: &SessionConfig) {
    let idle_timeout = Duration::from_secs(config.idle_timeout_secs);
    let period = Duration::from_secs(config.cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = sessions.cleanup_expired_with_timeout(idle_timeout);
            if removed > 0 {
                info!(
                    name: "session.expired",
                    removed,
                    remaining = sessions.len(),
                    "Destroyed idle sessions"
                );
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!(name: "server.stopping", "Shutdown signal received");
}

/// Every route reports a missing or malformed API key instead of serving.
async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match &state.api_key {
        Ok(_) => next.run(req).await,
        Err(e) if req.uri().path().starts_with("/api/") => ApiError::from(e.clone()).into_response(),
        Err(e) => config_error_response(e),
    }
}

fn config_error_response(error: &ConfigError) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Html(config_error_page(&error.to_string())),
    )
        .into_response()
}

/// Lenient creativity parsing for form and query input.
fn parse_creativity(raw: Option<&str>) -> Option<Creativity> {
    raw.and_then(|s| s.trim().parse::<f32>().ok())
        .map(Creativity::clamped)
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Handlers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    creativity: Option<String>,
}

/// Fields posted by the chat form, both for sending and for clearing.
#[derive(Debug, Deserialize)]
struct ChatForm {
    #[serde(default)]
    message: String,
    #[serde(default)]
    creativity: Option<String>,
}

/// Resolve the browser's session, creating one (and its cookie) when needed.
fn session_for(state: &AppState, jar: CookieJar) -> Result<(CookieJar, Session), ConfigError> {
    if let Some(session) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.get(cookie.value()))
    {
        return Ok((jar, session));
    }

    let session = state.new_session()?;
    let cookie = Cookie::build((SESSION_COOKIE, session.id().to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    Ok((jar.add(cookie), session))
}

fn render_chat(
    state: &AppState,
    session: &Session,
    creativity: Creativity,
    error: Option<&str>,
    draft: Option<&str>,
) -> Html<String> {
    let messages: Vec<Message> = session.render().collect();
    Html(chat_page(&ChatView {
        messages: &messages,
        creativity,
        model: &state.config.gemini.model,
        error,
        draft,
    }))
}

/// GET / - Chat page.
async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Response {
    let creativity = parse_creativity(query.creativity.as_deref())
        .unwrap_or_else(|| state.config.default_creativity());
    match session_for(&state, jar) {
        Ok((jar, session)) => (jar, render_chat(&state, &session, creativity, None, None)).into_response(),
        Err(e) => config_error_response(&e),
    }
}

/// POST /chat - Submit a prompt from the chat form.
async fn submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ChatForm>,
) -> Response {
    let creativity = parse_creativity(form.creativity.as_deref())
        .unwrap_or_else(|| state.config.default_creativity());
    let (jar, session) = match session_for(&state, jar) {
        Ok(found) => found,
        Err(e) => return config_error_response(&e),
    };

    match on_submit(&state.client, &session, &form.message, creativity).await {
        Ok(_) | Err(SubmitError::EmptyPrompt) => {
            (jar, Redirect::to(&format!("/?creativity={creativity}"))).into_response()
        }
        Err(SubmitError::Busy) => (
            StatusCode::CONFLICT,
            jar,
            render_chat(
                &state,
                &session,
                creativity,
                Some(&SubmitError::Busy.to_string()),
                Some(&form.message),
            ),
        )
            .into_response(),
        Err(SubmitError::Backend(e)) => {
            tracing::warn!(session_id = %session.id(), error = %e, "Chat request failed");
            (
                StatusCode::BAD_GATEWAY,
                jar,
                render_chat(
                    &state,
                    &session,
                    creativity,
                    Some(&e.to_string()),
                    Some(&form.message),
                ),
            )
                .into_response()
        }
    }
}

/// POST /clear - Empty the visible transcript.
async fn clear(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ChatForm>,
) -> Response {
    let creativity = parse_creativity(form.creativity.as_deref())
        .unwrap_or_else(|| state.config.default_creativity());
    match session_for(&state, jar) {
        Ok((jar, session)) => {
            session.clear();
            info!(session_id = %session.id(), "Transcript cleared");
            (jar, Redirect::to(&format!("/?creativity={creativity}"))).into_response()
        }
        Err(e) => config_error_response(&e),
    }
}

/// GET /about - About page.
async fn about(State(state): State<AppState>) -> Html<String> {
    Html(about_page(&state.config.gemini.model))
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// JSON error body with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn session_not_found(id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("Session not found: {id}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: e.to_string(),
        }
    }
}

impl From<SubmitError> for ApiError {
    fn from(e: SubmitError) -> Self {
        let status = match &e {
            SubmitError::EmptyPrompt => StatusCode::BAD_REQUEST,
            SubmitError::Busy => StatusCode::CONFLICT,
            SubmitError::Backend(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

/// Request body for chat API.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// User message content.
    message: String,
    /// Optional session ID (creates new if not provided).
    #[serde(default)]
    session_id: Option<String>,
    /// Sampling temperature; clamped to the slider range.
    #[serde(default)]
    creativity: Option<f32>,
}

/// Response from chat API.
#[derive(Debug, Serialize)]
struct ChatResponse {
    session_id: String,
    reply: String,
    /// Transcript length after the exchange.
    message_count: usize,
}

/// POST /api/chat - Send a prompt and wait for the reply.
async fn api_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    tracing::info!(
        prompt_length = req.message.len(),
        session_id = ?req.session_id,
        "Received chat request"
    );

    if req.message.trim().is_empty() {
        return Err(SubmitError::EmptyPrompt.into());
    }

    let session = match req.session_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => state
            .sessions
            .get(id)
            .ok_or_else(|| ApiError::session_not_found(id))?,
        None => state.new_session()?,
    };

    let creativity = req
        .creativity
        .map_or_else(|| state.config.default_creativity(), Creativity::clamped);
    let exchange = on_submit(&state.client, &session, &req.message, creativity).await?;

    Ok(Json(ChatResponse {
        session_id: session.id().to_string(),
        reply: exchange.reply,
        message_count: session.message_count(),
    }))
}

#[derive(Debug, Serialize)]
struct SessionSummary {
    id: String,
    created_at: DateTime<Utc>,
    message_count: usize,
    busy: bool,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id().to_string(),
            created_at: session.created_at(),
            message_count: session.message_count(),
            busy: session.is_busy(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionList {
    sessions: Vec<String>,
    count: usize,
}

/// GET /api/sessions - List live session ids.
async fn api_list_sessions(State(state): State<AppState>) -> Json<SessionList> {
    let sessions = state.sessions.list_ids();
    Json(SessionList {
        count: sessions.len(),
        sessions,
    })
}

/// POST /api/sessions - Create an empty session.
async fn api_create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionSummary>), ApiError> {
    let session = state.new_session()?;
    Ok((StatusCode::CREATED, Json(SessionSummary::from(&session))))
}

/// GET /api/sessions/:id - Session metadata.
async fn api_get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSummary>, ApiError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ApiError::session_not_found(&id))?;
    Ok(Json(SessionSummary::from(&session)))
}

/// DELETE /api/sessions/:id - Destroy a session.
async fn api_delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| ApiError::session_not_found(&id))
}

/// GET /api/sessions/:id/messages - Get session messages.
async fn api_get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ApiError::session_not_found(&id))?;
    Ok(Json(session.render().collect()))
}

/// POST /api/sessions/:id/clear - Empty the transcript.
async fn api_clear_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSummary>, ApiError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ApiError::session_not_found(&id))?;
    session.clear();
    Ok(Json(SessionSummary::from(&session)))
}

#[derive(Debug, Serialize)]
struct CreativityBounds {
    min: f32,
    max: f32,
    step: f32,
    default: Creativity,
}

#[derive(Debug, Serialize)]
struct SettingsResponse {
    model: String,
    creativity: CreativityBounds,
}

/// GET /api/settings - Slider bounds and model name.
async fn api_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        model: state.config.gemini.model.clone(),
        creativity: CreativityBounds {
            min: Creativity::MIN,
            max: Creativity::MAX,
            step: Creativity::STEP,
            default: state.config.default_creativity(),
        },
    })
}
