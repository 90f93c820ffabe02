//! Serde shapes for the persisted JSON documents.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named unit of knowledge with an estimated mastery score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Concept {
    /// Unique name (case-sensitive key within the graph).
    pub name: String,
    /// Estimated mastery in [0,1].
    pub confidence: f64,
    /// Free-form category label.
    #[serde(default)]
    pub category: String,
    /// Names of related concepts. Not guaranteed symmetric.
    #[serde(default)]
    pub connections: Vec<String>,
    /// Identifiers of content items this concept came from.
    #[serde(default)]
    pub sources: Vec<String>,
    /// When this concept is next due for review. `None` means due now.
    #[serde(default)]
    pub reinforcement_schedule: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Concept {
    /// Create a concept with clamped confidence and current timestamps.
    #[must_use]
    pub fn new(name: impl Into<String>, confidence: f64, category: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            confidence: confidence.clamp(0.0, 1.0),
            category: category.into(),
            connections: Vec::new(),
            sources: Vec::new(),
            reinforcement_schedule: None,
            created_at: now,
            last_updated: now,
        }
    }

    /// Merge fields from another record with the same name.
    ///
    /// Scalar fields take the incoming value (last write wins); connection and
    /// source lists are unioned so the merge stays idempotent.
    pub fn merge_from(&mut self, other: &Concept) {
        self.confidence = other.confidence.clamp(0.0, 1.0);
        if !other.category.is_empty() {
            self.category = other.category.clone();
        }
        if other.reinforcement_schedule.is_some() {
            self.reinforcement_schedule = other.reinforcement_schedule;
        }
        for connection in &other.connections {
            if !self.connections.contains(connection) {
                self.connections.push(connection.clone());
            }
        }
        for source in &other.sources {
            if !self.sources.contains(source) {
                self.sources.push(source.clone());
            }
        }
        self.last_updated = Utc::now();
    }
}

/// Kind of processed content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Webpage,
    Text,
    YoutubeVideo,
    RssItem,
}

/// A processed piece of learning content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentItem {
    pub id: String,
    pub kind: ContentKind,
    #[serde(default)]
    pub url: Option<String>,
    pub title: String,
    /// Raw text, truncated to the configured cap.
    pub content: String,
    /// Concept names extracted from this item.
    #[serde(default)]
    pub key_concepts: Vec<String>,
    #[serde(default)]
    pub insights: Vec<String>,
    pub processed_at: DateTime<Utc>,
}

impl ContentItem {
    /// Create an unprocessed content item with a fresh id.
    #[must_use]
    pub fn new(kind: ContentKind, url: Option<String>, title: String, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            url,
            title,
            content,
            key_concepts: Vec::new(),
            insights: Vec::new(),
            processed_at: Utc::now(),
        }
    }
}

/// Result of one question in a review session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionResult {
    pub concept: String,
    pub question: String,
    pub answer: String,
    /// Self-reported accuracy score in [0,1].
    pub accuracy: f64,
    /// Self-reported completeness score in [0,1].
    pub completeness: f64,
    #[serde(default)]
    pub feedback: String,
}

/// A completed spaced-repetition review session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReinforcementSession {
    pub id: String,
    pub reviewed_concepts: Vec<String>,
    pub questions: Vec<QuestionResult>,
    pub overall_performance: f64,
    pub completed_at: DateTime<Utc>,
}

/// A suggested area of exploration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExplorationSuggestion {
    pub area: String,
    pub priority: String,
    pub reason: String,
    #[serde(default)]
    pub related_concepts: Vec<String>,
    #[serde(default)]
    pub estimated_time: String,
}

/// One prompt/response pair from a reflection session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReflectionInsight {
    pub prompt: String,
    pub insight: String,
}

/// Progress assessment against one learning goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoalProgress {
    pub goal: String,
    pub assessment: String,
}

/// A completed reflection session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReflectionSession {
    pub id: String,
    pub insights: Vec<ReflectionInsight>,
    #[serde(default)]
    pub goal_progress: Vec<GoalProgress>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Top-level knowledge graph document (`knowledge-graph.json`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KnowledgeGraph {
    #[serde(default)]
    pub concepts: Vec<Concept>,
    #[serde(default)]
    pub content_items: Vec<ContentItem>,
    #[serde(default)]
    pub reinforcement_sessions: Vec<ReinforcementSession>,
    #[serde(default)]
    pub exploration_suggestions: Vec<ExplorationSuggestion>,
    #[serde(default)]
    pub reflection_sessions: Vec<ReflectionSession>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Learner profile document (`memory.json`).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UserProfile {
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub learning_style: String,
    #[serde(default)]
    pub time_commitment: String,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

/// One entry in the activity log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    /// Short machine-readable kind (`content_processed`, `review_completed`, ...).
    pub kind: String,
    pub detail: String,
}

impl ActivityEntry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(kind: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: kind.into(),
            detail: detail.into(),
        }
    }
}

/// Activity log document (`activity-log.json`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActivityLog {
    #[serde(default)]
    pub entries: Vec<ActivityEntry>,
}

/// A cached fetch result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedContent {
    pub title: String,
    pub content: String,
    pub fetched_at: DateTime<Utc>,
}

/// Content cache document (`content-cache.json`), keyed by URL.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContentCache {
    #[serde(default)]
    pub entries: HashMap<String, CachedContent>,
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in a web chat session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// A web chat session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Create an empty session with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Chat sessions document (`session.json`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionBook {
    #[serde(default)]
    pub sessions: HashMap<Uuid, ChatSession>,
}
