//! Web API server with axum router and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::content::ContentFetcher;
use crate::llm::LlmClient;
use crate::store::Store;

use super::handlers::{
    get_events_sse, get_exploration_suggestions, get_knowledge_graph, get_session, get_status,
    post_create_session, post_generate_reinforcement, post_process_content,
    post_reflection_session, post_session_chat, AppState,
};
use super::state::{create_push_channel, PushEvent};

/// How often the background task checks for concepts due for review.
const REVIEW_CHECK_INTERVAL: Duration = Duration::from_secs(3600);

/// Web API server for the knowledge assistant.
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Create a new server around shared store and clients.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: Arc<Mutex<Store>>,
        llm: Arc<LlmClient>,
        fetcher: Arc<ContentFetcher>,
    ) -> Self {
        let (event_tx, cancel) = create_push_channel();
        let state = AppState::new(store, llm, fetcher, event_tx, cancel);
        Self { config, state }
    }

    /// The shared handler state (exposed for tests and the review watcher).
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get the configured address as a string.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/api/status", get(get_status))
            .route("/api/knowledge-graph", get(get_knowledge_graph))
            .route("/api/process-content", post(post_process_content))
            .route(
                "/api/generate-reinforcement",
                post(post_generate_reinforcement),
            )
            .route(
                "/api/exploration-suggestions",
                get(get_exploration_suggestions),
            )
            .route("/api/reflection-session", post(post_reflection_session))
            .route("/api/session", post(post_create_session))
            .route("/api/session/:id", get(get_session))
            .route("/api/session/:id/chat", post(post_session_chat))
            .route("/api/events", get(get_events_sse))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.cors_permissive {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Run the server, binding to the configured address.
    ///
    /// Also spawns the periodic due-review watcher. The server runs until the
    /// cancellation token is triggered, then shuts down gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or serve.
    pub async fn run(self) -> std::io::Result<()> {
        let addr = self.address();
        let cancel = self.state.cancel.clone();
        let watcher = tokio::spawn(review_watcher(self.state.clone()));
        let app = self.build_router();

        tracing::info!(address = %addr, "Starting API server");

        let listener = TcpListener::bind(&addr).await?;

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("API server shutting down gracefully");
            })
            .await;

        watcher.abort();
        result
    }
}

/// Periodically broadcast a `review_due` event when concepts are waiting.
async fn review_watcher(state: AppState) {
    let mut interval = tokio::time::interval(REVIEW_CHECK_INTERVAL);
    loop {
        tokio::select! {
            () = state.cancel.cancelled() => break,
            _ = interval.tick() => {
                let due = {
                    let store = state.store.lock().await;
                    store.concepts_due_for_review(Utc::now()).len()
                };
                if due > 0 {
                    tracing::debug!(due, "Concepts due for review");
                    state.push(PushEvent::new(
                        "review_due",
                        serde_json::json!({ "due_count": due }),
                    ));
                }
            }
        }
    }
}
