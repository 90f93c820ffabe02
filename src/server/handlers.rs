//! HTTP handlers for the web API.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::stream::StreamExt;
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::content::ContentFetcher;
use crate::features::{self, Quiz};
use crate::llm::LlmClient;
use crate::store::{ChatSession, ExplorationSuggestion, KnowledgeGraph, ReflectionSession, Store};

use super::api::{
    ApiError, ChatRequest, ChatResponse, ProcessContentRequest, ProcessContentResponse,
    StatusResponse,
};
use super::state::PushEvent;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Knowledge store, serialized behind a lock so concurrent requests
    /// cannot interleave read-modify-write cycles.
    pub store: Arc<Mutex<Store>>,
    /// LLM client.
    pub llm: Arc<LlmClient>,
    /// Content fetcher.
    pub fetcher: Arc<ContentFetcher>,
    /// Sender for broadcasting push events to SSE clients.
    pub event_tx: broadcast::Sender<PushEvent>,
    /// Cancellation token for graceful shutdown.
    pub cancel: CancellationToken,
}

impl AppState {
    /// Create app state from its parts.
    #[must_use]
    pub fn new(
        store: Arc<Mutex<Store>>,
        llm: Arc<LlmClient>,
        fetcher: Arc<ContentFetcher>,
        event_tx: broadcast::Sender<PushEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            llm,
            fetcher,
            event_tx,
            cancel,
        }
    }

    /// Broadcast a push event, ignoring the no-subscribers case.
    pub fn push(&self, event: PushEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// GET /api/status - Service and store summary.
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let store = state.store.lock().await;
    let connected = state.event_tx.receiver_count() > 0;
    Json(StatusResponse {
        status: "ok".to_string(),
        model: state.llm.model().to_string(),
        connected,
        stats: store.stats(),
    })
}

/// GET /api/knowledge-graph - The full knowledge graph document.
pub async fn get_knowledge_graph(State(state): State<AppState>) -> Json<KnowledgeGraph> {
    let store = state.store.lock().await;
    Json(store.graph().clone())
}

/// POST /api/process-content - Fetch, extract, and merge one content item.
pub async fn post_process_content(
    State(state): State<AppState>,
    Json(request): Json<ProcessContentRequest>,
) -> Result<Json<ProcessContentResponse>, ApiError> {
    let mut store = state.store.lock().await;
    let item =
        features::process_content(&mut store, &state.llm, &state.fetcher, &request.content)
            .await?;

    state.push(PushEvent::activity("content_processed", &item.title));
    state.push(PushEvent::graph_update(store.graph().concepts.len()));

    Ok(Json(ProcessContentResponse {
        item_id: item.id,
        title: item.title,
        key_concepts: item.key_concepts,
        insights: item.insights,
    }))
}

/// POST /api/generate-reinforcement - Quiz over due concepts.
pub async fn post_generate_reinforcement(
    State(state): State<AppState>,
) -> Result<Json<Quiz>, ApiError> {
    let store = state.store.lock().await;
    let quiz = features::generate_quiz(&store, &state.llm).await?;
    Ok(Json(quiz))
}

/// GET /api/exploration-suggestions - Generate and persist suggestions.
pub async fn get_exploration_suggestions(
    State(state): State<AppState>,
) -> Result<Json<Vec<ExplorationSuggestion>>, ApiError> {
    let mut store = state.store.lock().await;
    let suggestions = features::suggest_exploration(&mut store, &state.llm).await?;
    state.push(PushEvent::activity(
        "exploration_suggested",
        &format!("{} suggestions", suggestions.len()),
    ));
    Ok(Json(suggestions))
}

/// POST /api/reflection-session - Run a reflection session.
pub async fn post_reflection_session(
    State(state): State<AppState>,
) -> Result<Json<ReflectionSession>, ApiError> {
    let mut store = state.store.lock().await;
    let session = features::run_reflection(&mut store, &state.llm).await?;
    state.push(PushEvent::activity(
        "reflection_completed",
        &format!("{} insights", session.insights.len()),
    ));
    state.push(PushEvent::graph_update(store.graph().concepts.len()));
    Ok(Json(session))
}

/// POST /api/session - Create a chat session.
pub async fn post_create_session(
    State(state): State<AppState>,
) -> Result<Json<ChatSession>, ApiError> {
    let mut store = state.store.lock().await;
    let session = store.create_session().await.map_err(|e| {
        ApiError::Feature(crate::features::FeatureError::Store(e))
    })?;
    Ok(Json(session))
}

/// GET /api/session/:id - Fetch a chat session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChatSession>, ApiError> {
    let store = state.store.lock().await;
    store
        .session(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("session {id}")))
}

/// POST /api/session/:id/chat - Send a message and get a reply.
pub async fn post_session_chat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let mut store = state.store.lock().await;
    let reply = features::chat_reply(&mut store, &state.llm, id, &request.message).await?;
    Ok(Json(ChatResponse { reply }))
}

/// GET /api/events - SSE stream of push events.
pub async fn get_events_sse(
    State(state): State<AppState>,
) -> Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => {
                let data = serde_json::to_string(&event).ok()?;
                Some(Ok(Event::default().event(&event.event_type).data(data)))
            }
            Err(_) => None, // Skip lagged messages
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
