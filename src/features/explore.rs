//! Exploration suggestions: what to learn next.

use serde::{Deserialize, Serialize};

use crate::graph::clusters;
use crate::llm::{prompts, LlmClient, LlmError};
use crate::store::{ActivityEntry, ExplorationSuggestion, KnowledgeGraph, Store};

use super::FeatureError;

/// Parsed exploration response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SuggestionList {
    #[serde(default)]
    pub suggestions: Vec<ExplorationSuggestion>,
}

/// Human-readable summary of the knowledge graph for prompts: cluster sizes,
/// mean confidences, and the weakest concepts.
#[must_use]
pub fn concept_summary(graph: &KnowledgeGraph) -> String {
    if graph.concepts.is_empty() {
        return "No concepts tracked yet.".to_string();
    }

    let mut lines = Vec::new();
    for (i, cluster) in clusters(graph).iter().take(10).enumerate() {
        lines.push(format!(
            "Cluster {}: {} (size {}, mean confidence {:.2})",
            i + 1,
            cluster.members.join(", "),
            cluster.size(),
            cluster.average_confidence
        ));
    }

    let mut weakest: Vec<_> = graph.concepts.iter().collect();
    weakest.sort_by(|a, b| a.confidence.total_cmp(&b.confidence));
    let weak_names: Vec<String> = weakest
        .iter()
        .take(5)
        .map(|c| format!("{} ({:.2})", c.name, c.confidence))
        .collect();
    lines.push(format!("Weakest concepts: {}", weak_names.join(", ")));

    lines.join("\n")
}

/// Fallback when the model returns malformed JSON: one generic suggestion
/// pointing at the lowest-confidence cluster.
#[must_use]
pub fn fallback_suggestions(graph: &KnowledgeGraph) -> Vec<ExplorationSuggestion> {
    let target = clusters(graph)
        .into_iter()
        .min_by(|a, b| a.average_confidence.total_cmp(&b.average_confidence));

    let (area, related) = match target {
        Some(cluster) => (
            format!("Deepen {}", cluster.members.join(" / ")),
            cluster.members,
        ),
        None => ("Pick a first topic to track".to_string(), Vec::new()),
    };

    vec![ExplorationSuggestion {
        area,
        priority: "medium".to_string(),
        reason: "These concepts have the lowest confidence in your graph.".to_string(),
        related_concepts: related,
        estimated_time: "30 minutes".to_string(),
    }]
}

/// Generate exploration suggestions and persist them.
///
/// # Errors
///
/// Returns `FeatureError` on LLM transport or store failure.
pub async fn suggest_exploration(
    store: &mut Store,
    llm: &LlmClient,
) -> Result<Vec<ExplorationSuggestion>, FeatureError> {
    let profile = store.profile();
    let user = prompts::format_exploration(
        &profile.goals,
        &profile.interests,
        &concept_summary(store.graph()),
    );

    let suggestions = match llm
        .complete_json::<SuggestionList>(prompts::EXPLORATION_SYSTEM_PROMPT, &user)
        .await
    {
        Ok(list) => list.suggestions,
        Err(LlmError::ParseError(e)) => {
            tracing::warn!(error = %e, "Malformed exploration response, using fallback");
            fallback_suggestions(store.graph())
        }
        Err(e) => return Err(e.into()),
    };

    store.set_exploration_suggestions(suggestions.clone()).await?;
    store
        .append_activity(ActivityEntry::new(
            "exploration_suggested",
            format!("{} suggestions generated", suggestions.len()),
        ))
        .await?;
    Ok(suggestions)
}
