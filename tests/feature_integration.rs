//! Integration tests for the feature flows, driven by a canned LLM provider.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use eumicus::content::ContentFetcher;
use eumicus::features;
use eumicus::graph::clusters;
use eumicus::llm::{LlmClient, LlmError, LlmProvider};
use eumicus::store::{Concept, QuestionResult, Store};
use tempfile::TempDir;

/// Provider that always returns the same canned response.
struct CannedProvider(String);

#[async_trait]
impl LlmProvider for CannedProvider {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
        Ok(self.0.clone())
    }
}

/// Provider that fails every request at the transport level.
struct FailingProvider;

#[async_trait]
impl LlmProvider for FailingProvider {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, LlmError> {
        Err(LlmError::RequestFailed("connection refused".to_string()))
    }
}

fn canned(response: &str) -> LlmClient {
    LlmClient::with_provider(Box::new(CannedProvider(response.to_string())), "test-model")
}

fn fetcher() -> ContentFetcher {
    ContentFetcher::new(eumicus::config::FetchConfig::default())
}

/// Test the full extraction flow: raw text in, scheduled concepts out.
#[tokio::test]
async fn test_process_text_extracts_and_schedules_concepts() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = Store::open(temp_dir.path()).await.expect("Failed to open");
    let llm = canned(
        r#"{
            "concepts": [
                {"name": "merge sort", "confidence": 0.4, "category": "algorithms"},
                {"name": "recursion", "confidence": 0.5, "category": "fundamentals"}
            ],
            "connections": [
                {"from": "merge sort", "to": "recursion", "relationship": "uses"}
            ],
            "insights": ["Divide and conquer splits work recursively."]
        }"#,
    );

    let item = features::process_content(
        &mut store,
        &llm,
        &fetcher(),
        "Merge sort splits the input and recursively sorts the halves.",
    )
    .await
    .expect("Processing failed");

    assert_eq!(item.key_concepts.len(), 2);
    assert_eq!(store.graph().concepts.len(), 2);

    let merge_sort = store.concept("merge sort").expect("Concept missing");
    assert!(merge_sort.reinforcement_schedule.is_some());
    assert!(merge_sort.connections.contains(&"recursion".to_string()));
    assert!(merge_sort.sources.contains(&item.id));

    // Connection merging is bidirectional.
    let recursion = store.concept("recursion").expect("Concept missing");
    assert!(recursion.connections.contains(&"merge sort".to_string()));
}

/// Test that reprocessing the same concepts merges instead of duplicating.
#[tokio::test]
async fn test_reprocessing_merges_concepts() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = Store::open(temp_dir.path()).await.expect("Failed to open");
    let llm = canned(
        r#"{"concepts": [{"name": "hashing", "confidence": 0.4}], "connections": [], "insights": []}"#,
    );

    for _ in 0..2 {
        features::process_content(&mut store, &llm, &fetcher(), "Hashing maps keys to buckets.")
            .await
            .expect("Processing failed");
    }

    assert_eq!(store.graph().concepts.len(), 1);
    assert_eq!(store.graph().content_items.len(), 2);
    // Both content items are recorded as sources.
    assert_eq!(store.concept("hashing").expect("missing").sources.len(), 2);
}

/// Test that malformed extraction output falls back to a low-confidence stub
/// instead of failing the flow.
#[tokio::test]
async fn test_malformed_extraction_uses_fallback() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = Store::open(temp_dir.path()).await.expect("Failed to open");
    let llm = canned("Sorry, I cannot produce JSON today.");

    let item = features::process_content(&mut store, &llm, &fetcher(), "Some pasted notes.")
        .await
        .expect("Fallback should not error");

    assert_eq!(item.key_concepts.len(), 1);
    let concept = &store.graph().concepts[0];
    assert!((concept.confidence - 0.2).abs() < f64::EPSILON);
    assert_eq!(concept.category, "uncategorized");
}

/// Test that a transport failure propagates instead of falling back.
#[tokio::test]
async fn test_transport_failure_propagates() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = Store::open(temp_dir.path()).await.expect("Failed to open");
    let llm = LlmClient::with_provider(Box::new(FailingProvider), "test-model");

    let result = features::process_content(&mut store, &llm, &fetcher(), "Some text.").await;
    assert!(result.is_err());
    assert!(store.graph().concepts.is_empty());
}

/// Test the quiz fallback when the model output is not parseable.
#[tokio::test]
async fn test_malformed_quiz_uses_fallback() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = Store::open(temp_dir.path()).await.expect("Failed to open");
    store
        .add_concept(Concept::new("pointers", 0.3, "memory"))
        .await
        .expect("add");
    let llm = canned("```\nnot json\n");

    let quiz = features::generate_quiz(&store, &llm)
        .await
        .expect("Fallback should not error");
    assert!(!quiz.questions.is_empty());
    assert_eq!(quiz.questions[0].concept, "pointers");
}

/// Test an empty quiz when nothing is due.
#[tokio::test]
async fn test_quiz_empty_when_nothing_due() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = Store::open(temp_dir.path()).await.expect("Failed to open");
    let mut concept = Concept::new("settled", 0.9, "");
    concept.reinforcement_schedule = Some(Utc::now() + Duration::days(30));
    store.add_concept(concept).await.expect("add");
    let llm = canned("irrelevant");

    let quiz = features::generate_quiz(&store, &llm)
        .await
        .expect("Quiz failed");
    assert!(quiz.questions.is_empty());
}

/// Test that completing a review session moves confidence by the blend and
/// schedules the next review into the matching bucket.
#[tokio::test]
async fn test_complete_session_updates_confidence_and_schedule() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = Store::open(temp_dir.path()).await.expect("Failed to open");
    store
        .add_concept(Concept::new("closures", 0.5, "rust"))
        .await
        .expect("add");

    let before = Utc::now();
    let session = features::complete_session(
        &mut store,
        vec![QuestionResult {
            concept: "closures".to_string(),
            question: "What does a closure capture?".to_string(),
            answer: "Variables from its environment.".to_string(),
            accuracy: 1.0,
            completeness: 1.0,
            feedback: String::new(),
        }],
    )
    .await
    .expect("Session failed");

    // 0.7 * 0.5 + 0.3 * 1.0 = 0.65 -> the 7-day bucket.
    let concept = store.concept("closures").expect("missing");
    assert!((concept.confidence - 0.65).abs() < 1e-9);
    let next = concept.reinforcement_schedule.expect("unscheduled");
    assert!(next >= before + Duration::days(7) - Duration::seconds(5));
    assert!(next <= before + Duration::days(7) + Duration::seconds(5));

    assert!((session.overall_performance - 1.0).abs() < f64::EPSILON);
    assert_eq!(store.graph().reinforcement_sessions.len(), 1);
}

/// Test the two-concept clustering scenario: a single bidirectional link
/// yields one component of size two.
#[tokio::test]
async fn test_connected_concepts_form_one_cluster() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = Store::open(temp_dir.path()).await.expect("Failed to open");

    store
        .add_concept(Concept::new("tcp", 0.6, "networking"))
        .await
        .expect("add");
    let mut udp = Concept::new("udp", 0.4, "networking");
    udp.connections.push("tcp".to_string());
    store.add_concept(udp).await.expect("add");

    let found = clusters(store.graph());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].size(), 2);
}

/// Test that malformed exploration output falls back to a cluster-derived
/// suggestion and still persists it.
#[tokio::test]
async fn test_malformed_exploration_uses_fallback() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = Store::open(temp_dir.path()).await.expect("Failed to open");
    store
        .add_concept(Concept::new("b-trees", 0.2, "data structures"))
        .await
        .expect("add");
    let llm = canned("no json here");

    let suggestions = features::suggest_exploration(&mut store, &llm)
        .await
        .expect("Fallback should not error");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].priority, "medium");
    assert_eq!(store.graph().exploration_suggestions, suggestions);
}

/// Test that malformed reflection output falls back to a generic insight.
#[tokio::test]
async fn test_malformed_reflection_uses_fallback() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = Store::open(temp_dir.path()).await.expect("Failed to open");
    let llm = canned("not a json object");

    let session = features::run_reflection(&mut store, &llm)
        .await
        .expect("Fallback should not error");
    assert_eq!(session.insights.len(), 1);
    assert_eq!(store.graph().reflection_sessions.len(), 1);
}

/// Test that malformed profile output keeps the raw answers verbatim.
#[tokio::test]
async fn test_malformed_profile_uses_answers_verbatim() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = Store::open(temp_dir.path()).await.expect("Failed to open");
    let llm = canned("not json");

    let answers = vec![
        (
            "What do you want to learn?".to_string(),
            "Distributed systems".to_string(),
        ),
        (
            "What topics interest you?".to_string(),
            "Consensus protocols".to_string(),
        ),
    ];
    let profile = features::update_profile(&mut store, &llm, &answers)
        .await
        .expect("Fallback should not error");

    assert_eq!(profile.goals, vec!["Distributed systems"]);
    assert_eq!(profile.interests, vec!["Consensus protocols"]);
}

/// Test the chat flow end to end: both messages persist and the reply comes
/// back from the model.
#[tokio::test]
async fn test_chat_reply_persists_both_sides() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = Store::open(temp_dir.path()).await.expect("Failed to open");
    let session = store.create_session().await.expect("create");
    let llm = canned("You know two sorting algorithms so far.");

    let reply = features::chat_reply(&mut store, &llm, session.id, "What do I know?")
        .await
        .expect("Chat failed");

    assert_eq!(reply.content, "You know two sorting algorithms so far.");
    let session = store.session(session.id).expect("missing");
    assert_eq!(session.messages.len(), 2);
}
