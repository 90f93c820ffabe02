//! Reflection sessions: insights, derived connections, goal progress.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::graph::{merge_connections, ConnectionProposal};
use crate::llm::{prompts, LlmClient, LlmError};
use crate::store::{
    ActivityEntry, GoalProgress, ReflectionInsight, ReflectionSession, Store,
};

use super::concept_summary;
use super::FeatureError;

/// Number of recent activity entries included in the reflection prompt.
const REFLECTION_ACTIVITY_WINDOW: usize = 20;

/// Parsed reflection response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReflectionOutcome {
    #[serde(default)]
    pub insights: Vec<ReflectionInsight>,
    #[serde(default)]
    pub derived_connections: Vec<ConnectionProposal>,
    #[serde(default)]
    pub goal_progress: Vec<GoalProgress>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

/// Fallback when the model returns malformed JSON: a single generic insight.
#[must_use]
pub fn fallback_reflection() -> ReflectionOutcome {
    ReflectionOutcome {
        insights: vec![ReflectionInsight {
            prompt: "What stood out in your recent learning?".to_string(),
            insight: "Review your recent activity and note one thing that surprised you."
                .to_string(),
        }],
        derived_connections: Vec::new(),
        goal_progress: Vec::new(),
        next_steps: vec!["Process one new piece of content.".to_string()],
    }
}

/// Run a reflection session: generate insights from recent activity, merge any
/// derived connections into the graph, and record the session.
///
/// # Errors
///
/// Returns `FeatureError` on LLM transport or store failure.
pub async fn run_reflection(
    store: &mut Store,
    llm: &LlmClient,
) -> Result<ReflectionSession, FeatureError> {
    let recent_activity: String = store
        .activity()
        .iter()
        .rev()
        .take(REFLECTION_ACTIVITY_WINDOW)
        .map(|e| format!("[{}] {}: {}", e.timestamp.format("%Y-%m-%d"), e.kind, e.detail))
        .collect::<Vec<_>>()
        .join("\n");
    let user = prompts::format_reflection(
        &store.profile().goals,
        &recent_activity,
        &concept_summary(store.graph()),
    );

    let outcome = match llm
        .complete_json::<ReflectionOutcome>(prompts::REFLECTION_SYSTEM_PROMPT, &user)
        .await
    {
        Ok(parsed) => parsed,
        Err(LlmError::ParseError(e)) => {
            tracing::warn!(error = %e, "Malformed reflection response, using fallback");
            fallback_reflection()
        }
        Err(e) => return Err(e.into()),
    };

    let added = merge_connections(store.graph_mut(), &outcome.derived_connections);

    let session = ReflectionSession {
        id: Uuid::new_v4().to_string(),
        insights: outcome.insights,
        goal_progress: outcome.goal_progress,
        next_steps: outcome.next_steps,
        completed_at: Utc::now(),
    };
    store.record_reflection(session.clone()).await?;
    store
        .append_activity(ActivityEntry::new(
            "reflection_completed",
            format!(
                "{} insights, {} new connections",
                session.insights.len(),
                added
            ),
        ))
        .await?;

    Ok(session)
}
