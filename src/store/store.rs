//! Load/save access to the JSON documents plus convenience mutators.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::documents::{
    ActivityEntry, ActivityLog, CachedContent, ChatMessage, ChatSession, Concept, ContentCache,
    ContentItem, ExplorationSuggestion, KnowledgeGraph, ReflectionSession, ReinforcementSession,
    SessionBook, UserProfile,
};
use super::error::StoreError;

/// File name of the knowledge graph document.
pub const KNOWLEDGE_GRAPH_FILE: &str = "knowledge-graph.json";
/// File name of the activity log document.
pub const ACTIVITY_LOG_FILE: &str = "activity-log.json";
/// File name of the content cache document.
pub const CONTENT_CACHE_FILE: &str = "content-cache.json";
/// File name of the learner profile document.
pub const MEMORY_FILE: &str = "memory.json";
/// File name of the chat sessions document.
pub const SESSION_FILE: &str = "session.json";

/// Maximum number of activity entries retained.
pub const ACTIVITY_RETENTION: usize = 1000;

/// Read a document from disk, initializing it with defaults if absent.
///
/// A missing file is created immediately so directory initialization happens
/// exactly once; a present-but-corrupt file is an error, not a silent reset.
async fn load_or_init<T>(path: &Path) -> Result<T, StoreError>
where
    T: Default + DeserializeOwned + Serialize,
{
    match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content).map_err(|e| StoreError::Parse {
            path: path.to_path_buf(),
            source: e,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Document missing, initializing");
            let default = T::default();
            write_document(path, &default).await?;
            Ok(default)
        }
        Err(e) => Err(StoreError::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Write a document atomically (temp file + sync + rename).
async fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::Write {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let json = serde_json::to_string_pretty(value)?;

    let temp_path = path.with_extension("json.tmp");
    let write = async {
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_data().await?;
        drop(file);
        tokio::fs::rename(&temp_path, path).await
    };
    write.await.map_err(|e| StoreError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Summary counts for the stats surface.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct KnowledgeStats {
    pub concept_count: usize,
    pub content_count: usize,
    pub reinforcement_sessions: usize,
    pub reflection_sessions: usize,
    pub due_for_review: usize,
    pub average_confidence: f64,
}

/// The knowledge store: five JSON documents held in memory, persisted on
/// every mutation.
pub struct Store {
    data_dir: PathBuf,
    graph: KnowledgeGraph,
    profile: UserProfile,
    activity: ActivityLog,
    cache: ContentCache,
    sessions: SessionBook,
}

impl Store {
    /// Open the store, loading every document (and creating missing ones).
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if a document cannot be read, written, or parsed.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        let graph: KnowledgeGraph = load_or_init(&data_dir.join(KNOWLEDGE_GRAPH_FILE)).await?;
        let profile = load_or_init(&data_dir.join(MEMORY_FILE)).await?;
        let activity = load_or_init(&data_dir.join(ACTIVITY_LOG_FILE)).await?;
        let cache = load_or_init(&data_dir.join(CONTENT_CACHE_FILE)).await?;
        let sessions = load_or_init(&data_dir.join(SESSION_FILE)).await?;

        tracing::debug!(
            dir = %data_dir.display(),
            concepts = graph.concepts.len(),
            "Opened knowledge store"
        );

        Ok(Self {
            data_dir,
            graph,
            profile,
            activity,
            cache,
            sessions,
        })
    }

    /// The data directory this store persists into.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The in-memory knowledge graph.
    #[must_use]
    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    /// Mutable access to the knowledge graph. Callers must follow up with
    /// [`Store::save_graph`].
    pub fn graph_mut(&mut self) -> &mut KnowledgeGraph {
        &mut self.graph
    }

    /// Persist the knowledge graph, stamping `last_updated`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if the document cannot be written.
    pub async fn save_graph(&mut self) -> Result<(), StoreError> {
        self.graph.last_updated = Some(Utc::now());
        write_document(&self.data_dir.join(KNOWLEDGE_GRAPH_FILE), &self.graph).await
    }

    /// Add or merge a concept by name and persist.
    ///
    /// On a name match, fields are merged (last write wins for scalars) and the
    /// timestamp bumped; otherwise the concept is appended. Calling twice with
    /// the same record leaves the concept list length unchanged.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if persisting fails.
    pub async fn add_concept(&mut self, concept: Concept) -> Result<(), StoreError> {
        if let Some(existing) = self
            .graph
            .concepts
            .iter_mut()
            .find(|c| c.name == concept.name)
        {
            existing.merge_from(&concept);
            tracing::debug!(name = %concept.name, "Merged existing concept");
        } else {
            tracing::debug!(name = %concept.name, "Added new concept");
            self.graph.concepts.push(concept);
        }
        self.save_graph().await
    }

    /// Look up a concept by name.
    #[must_use]
    pub fn concept(&self, name: &str) -> Option<&Concept> {
        self.graph.concepts.iter().find(|c| c.name == name)
    }

    /// Concepts whose review schedule is unset or past due.
    #[must_use]
    pub fn concepts_due_for_review(&self, now: DateTime<Utc>) -> Vec<&Concept> {
        self.graph
            .concepts
            .iter()
            .filter(|c| c.reinforcement_schedule.is_none_or(|at| at <= now))
            .collect()
    }

    /// Append a processed content item and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if persisting fails.
    pub async fn add_content_item(&mut self, item: ContentItem) -> Result<(), StoreError> {
        self.graph.content_items.push(item);
        self.save_graph().await
    }

    /// Record a completed reinforcement session and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if persisting fails.
    pub async fn record_reinforcement(
        &mut self,
        session: ReinforcementSession,
    ) -> Result<(), StoreError> {
        self.graph.reinforcement_sessions.push(session);
        self.save_graph().await
    }

    /// Record a completed reflection session and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if persisting fails.
    pub async fn record_reflection(
        &mut self,
        session: ReflectionSession,
    ) -> Result<(), StoreError> {
        self.graph.reflection_sessions.push(session);
        self.save_graph().await
    }

    /// Replace the current exploration suggestions and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if persisting fails.
    pub async fn set_exploration_suggestions(
        &mut self,
        suggestions: Vec<ExplorationSuggestion>,
    ) -> Result<(), StoreError> {
        self.graph.exploration_suggestions = suggestions;
        self.save_graph().await
    }

    /// The learner profile.
    #[must_use]
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Replace the learner profile and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if persisting fails.
    pub async fn set_profile(&mut self, mut profile: UserProfile) -> Result<(), StoreError> {
        profile.last_updated = Some(Utc::now());
        self.profile = profile;
        write_document(&self.data_dir.join(MEMORY_FILE), &self.profile).await
    }

    /// Recent activity entries, newest last.
    #[must_use]
    pub fn activity(&self) -> &[ActivityEntry] {
        &self.activity.entries
    }

    /// Append an activity entry, trim to the retention cap, and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if persisting fails.
    pub async fn append_activity(&mut self, entry: ActivityEntry) -> Result<(), StoreError> {
        self.activity.entries.push(entry);
        if self.activity.entries.len() > ACTIVITY_RETENTION {
            let excess = self.activity.entries.len() - ACTIVITY_RETENTION;
            self.activity.entries.drain(..excess);
        }
        write_document(&self.data_dir.join(ACTIVITY_LOG_FILE), &self.activity).await
    }

    /// Fetch a cached page if present and younger than `ttl`.
    #[must_use]
    pub fn cache_get(&self, url: &str, ttl: Duration) -> Option<&CachedContent> {
        self.cache
            .entries
            .get(url)
            .filter(|c| Utc::now() - c.fetched_at < ttl)
    }

    /// Store a fetched page in the cache and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if persisting fails.
    pub async fn cache_put(
        &mut self,
        url: impl Into<String>,
        cached: CachedContent,
    ) -> Result<(), StoreError> {
        self.cache.entries.insert(url.into(), cached);
        write_document(&self.data_dir.join(CONTENT_CACHE_FILE), &self.cache).await
    }

    /// Create a new chat session and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if persisting fails.
    pub async fn create_session(&mut self) -> Result<ChatSession, StoreError> {
        let session = ChatSession::new();
        self.sessions.sessions.insert(session.id, session.clone());
        write_document(&self.data_dir.join(SESSION_FILE), &self.sessions).await?;
        Ok(session)
    }

    /// Look up a chat session.
    #[must_use]
    pub fn session(&self, id: Uuid) -> Option<&ChatSession> {
        self.sessions.sessions.get(&id)
    }

    /// Append a message to a chat session and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UnknownSession` if no session has that id.
    pub async fn push_message(
        &mut self,
        id: Uuid,
        message: ChatMessage,
    ) -> Result<(), StoreError> {
        let session = self
            .sessions
            .sessions
            .get_mut(&id)
            .ok_or(StoreError::UnknownSession(id))?;
        session.messages.push(message);
        write_document(&self.data_dir.join(SESSION_FILE), &self.sessions).await
    }

    /// Summary statistics for the stats surface.
    #[must_use]
    pub fn stats(&self) -> KnowledgeStats {
        let concept_count = self.graph.concepts.len();
        let average_confidence = if concept_count == 0 {
            0.0
        } else {
            self.graph.concepts.iter().map(|c| c.confidence).sum::<f64>() / concept_count as f64
        };
        KnowledgeStats {
            concept_count,
            content_count: self.graph.content_items.len(),
            reinforcement_sessions: self.graph.reinforcement_sessions.len(),
            reflection_sessions: self.graph.reflection_sessions.len(),
            due_for_review: self.concepts_due_for_review(Utc::now()).len(),
            average_confidence,
        }
    }

    /// Reset every document to its default empty shape and persist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Write` if persisting fails.
    pub async fn reset(&mut self) -> Result<(), StoreError> {
        self.graph = KnowledgeGraph::default();
        self.profile = UserProfile::default();
        self.activity = ActivityLog::default();
        self.cache = ContentCache::default();
        self.sessions = SessionBook::default();

        self.save_graph().await?;
        write_document(&self.data_dir.join(MEMORY_FILE), &self.profile).await?;
        write_document(&self.data_dir.join(ACTIVITY_LOG_FILE), &self.activity).await?;
        write_document(&self.data_dir.join(CONTENT_CACHE_FILE), &self.cache).await?;
        write_document(&self.data_dir.join(SESSION_FILE), &self.sessions).await?;
        tracing::info!(dir = %self.data_dir.display(), "Store reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ChatRole;

    #[tokio::test]
    async fn test_open_initializes_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).await.unwrap();

        assert!(store.graph().concepts.is_empty());
        // Exactly-once initialization: files exist after open.
        assert!(dir.path().join(KNOWLEDGE_GRAPH_FILE).exists());
        assert!(dir.path().join(MEMORY_FILE).exists());
        assert!(dir.path().join(ACTIVITY_LOG_FILE).exists());
        assert!(dir.path().join(CONTENT_CACHE_FILE).exists());
        assert!(dir.path().join(SESSION_FILE).exists());
    }

    #[tokio::test]
    async fn test_graph_roundtrip_modulo_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = Store::open(dir.path()).await.unwrap();
            store
                .add_concept(Concept::new("ownership", 0.6, "rust"))
                .await
                .unwrap();
        }

        let reopened = Store::open(dir.path()).await.unwrap();
        assert_eq!(reopened.graph().concepts.len(), 1);
        assert_eq!(reopened.graph().concepts[0].name, "ownership");
        assert!(reopened.graph().last_updated.is_some());
    }

    #[tokio::test]
    async fn test_add_concept_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).await.unwrap();

        let concept = Concept::new("bfs", 0.5, "algorithms");
        store.add_concept(concept.clone()).await.unwrap();
        store.add_concept(concept).await.unwrap();

        assert_eq!(store.graph().concepts.len(), 1);
    }

    #[tokio::test]
    async fn test_add_concept_merges_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).await.unwrap();

        store
            .add_concept(Concept::new("bfs", 0.5, "algorithms"))
            .await
            .unwrap();
        let mut update = Concept::new("bfs", 0.8, "graph algorithms");
        update.connections.push("queues".to_string());
        store.add_concept(update).await.unwrap();

        let concept = store.concept("bfs").unwrap();
        assert!((concept.confidence - 0.8).abs() < f64::EPSILON);
        assert_eq!(concept.category, "graph algorithms");
        assert_eq!(concept.connections, vec!["queues"]);
    }

    #[tokio::test]
    async fn test_concept_names_are_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).await.unwrap();

        store.add_concept(Concept::new("Rust", 0.5, "")).await.unwrap();
        store.add_concept(Concept::new("rust", 0.5, "")).await.unwrap();
        assert_eq!(store.graph().concepts.len(), 2);
    }

    #[tokio::test]
    async fn test_due_for_review_filter() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).await.unwrap();
        let now = Utc::now();

        // Unset schedule: due immediately.
        store.add_concept(Concept::new("fresh", 0.5, "")).await.unwrap();

        let mut past = Concept::new("overdue", 0.5, "");
        past.reinforcement_schedule = Some(now - Duration::days(1));
        store.add_concept(past).await.unwrap();

        let mut future = Concept::new("scheduled", 0.5, "");
        future.reinforcement_schedule = Some(now + Duration::days(7));
        store.add_concept(future).await.unwrap();

        let due: Vec<_> = store
            .concepts_due_for_review(now)
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert!(due.contains(&"fresh".to_string()));
        assert!(due.contains(&"overdue".to_string()));
        assert!(!due.contains(&"scheduled".to_string()));
    }

    #[tokio::test]
    async fn test_activity_retention_cap() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).await.unwrap();

        for i in 0..(ACTIVITY_RETENTION + 5) {
            store
                .append_activity(ActivityEntry::new("test", format!("entry {i}")))
                .await
                .unwrap();
        }

        assert_eq!(store.activity().len(), ACTIVITY_RETENTION);
        // Oldest entries were dropped, newest kept.
        assert_eq!(
            store.activity().last().unwrap().detail,
            format!("entry {}", ACTIVITY_RETENTION + 4)
        );
    }

    #[tokio::test]
    async fn test_cache_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).await.unwrap();

        store
            .cache_put(
                "https://example.com",
                CachedContent {
                    title: "Example".to_string(),
                    content: "body".to_string(),
                    fetched_at: Utc::now() - Duration::hours(2),
                },
            )
            .await
            .unwrap();

        assert!(store
            .cache_get("https://example.com", Duration::hours(24))
            .is_some());
        assert!(store
            .cache_get("https://example.com", Duration::hours(1))
            .is_none());
        assert!(store.cache_get("https://other.com", Duration::hours(24)).is_none());
    }

    #[tokio::test]
    async fn test_sessions_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let mut store = Store::open(dir.path()).await.unwrap();
            let session = store.create_session().await.unwrap();
            store
                .push_message(
                    session.id,
                    ChatMessage {
                        role: ChatRole::User,
                        content: "what should I review?".to_string(),
                        at: Utc::now(),
                    },
                )
                .await
                .unwrap();
            session.id
        };

        let reopened = Store::open(dir.path()).await.unwrap();
        let session = reopened.session(id).unwrap();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, ChatRole::User);
    }

    #[tokio::test]
    async fn test_push_message_unknown_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).await.unwrap();

        let result = store
            .push_message(
                Uuid::new_v4(),
                ChatMessage {
                    role: ChatRole::User,
                    content: "hi".to_string(),
                    at: Utc::now(),
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::UnknownSession(_))));
    }

    #[tokio::test]
    async fn test_corrupt_graph_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(KNOWLEDGE_GRAPH_FILE), "{not json")
            .await
            .unwrap();

        let result = Store::open(dir.path()).await;
        assert!(matches!(result, Err(StoreError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).await.unwrap();

        store.add_concept(Concept::new("x", 0.5, "")).await.unwrap();
        store
            .append_activity(ActivityEntry::new("test", "entry"))
            .await
            .unwrap();
        store.reset().await.unwrap();

        assert!(store.graph().concepts.is_empty());
        assert!(store.activity().is_empty());

        let reopened = Store::open(dir.path()).await.unwrap();
        assert!(reopened.graph().concepts.is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).await.unwrap();

        store.add_concept(Concept::new("a", 0.4, "")).await.unwrap();
        store.add_concept(Concept::new("b", 0.8, "")).await.unwrap();

        let stats = store.stats();
        assert_eq!(stats.concept_count, 2);
        assert!((stats.average_confidence - 0.6).abs() < 1e-9);
        assert_eq!(stats.due_for_review, 2);
    }
}
