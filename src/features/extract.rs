//! Concept extraction from fetched content.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::content::{ContentFetcher, FetchedContent};
use crate::graph::{merge_connections, ConnectionProposal};
use crate::llm::{prompts, LlmClient, LlmError};
use crate::schedule::next_review_at;
use crate::store::{ActivityEntry, CachedContent, Concept, ContentItem, ContentKind, Store};

use super::FeatureError;

/// One concept as reported by the extraction prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedConcept {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_extracted_confidence")]
    pub confidence: f64,
}

fn default_extracted_confidence() -> f64 {
    0.3
}

/// Parsed extraction response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ExtractedKnowledge {
    #[serde(default)]
    pub concepts: Vec<ExtractedConcept>,
    #[serde(default)]
    pub connections: Vec<ConnectionProposal>,
    #[serde(default)]
    pub insights: Vec<String>,
}

/// Fallback when the model returns malformed JSON: a single low-confidence
/// concept derived from the content title.
#[must_use]
pub fn fallback_extraction(title: &str) -> ExtractedKnowledge {
    ExtractedKnowledge {
        concepts: vec![ExtractedConcept {
            name: title.to_string(),
            category: "uncategorized".to_string(),
            confidence: 0.2,
        }],
        connections: Vec::new(),
        insights: Vec::new(),
    }
}

/// Fetch one piece of content, extract concepts, and merge into the store.
///
/// Web fetches go through the content cache first; fresh results are cached.
///
/// # Errors
///
/// Returns `FeatureError` on fetch, LLM transport, or store failures.
/// Malformed LLM output falls back instead of failing.
pub async fn process_content(
    store: &mut Store,
    llm: &LlmClient,
    fetcher: &ContentFetcher,
    input: &str,
) -> Result<ContentItem, FeatureError> {
    let fetched = fetch_with_cache(store, fetcher, input).await?;

    let known: Vec<String> = store
        .graph()
        .concepts
        .iter()
        .map(|c| c.name.clone())
        .collect();
    let user = prompts::format_extraction(&fetched.title, &fetched.content, &known);

    let extracted = match llm
        .complete_json::<ExtractedKnowledge>(prompts::EXTRACTION_SYSTEM_PROMPT, &user)
        .await
    {
        Ok(parsed) => parsed,
        Err(LlmError::ParseError(e)) => {
            tracing::warn!(error = %e, "Malformed extraction response, using fallback");
            fallback_extraction(&fetched.title)
        }
        Err(e) => return Err(e.into()),
    };

    let mut item = ContentItem::new(
        fetched.kind,
        fetched.url.clone(),
        fetched.title.clone(),
        fetched.content.clone(),
    );
    item.key_concepts = extracted.concepts.iter().map(|c| c.name.clone()).collect();
    item.insights = extracted.insights.clone();

    let now = Utc::now();
    for extracted_concept in &extracted.concepts {
        let mut concept = Concept::new(
            extracted_concept.name.clone(),
            extracted_concept.confidence,
            extracted_concept.category.clone(),
        );
        concept.sources.push(item.id.clone());
        concept.reinforcement_schedule = Some(next_review_at(now, concept.confidence));
        store.add_concept(concept).await?;
    }

    let added = merge_connections(store.graph_mut(), &extracted.connections);
    store.add_content_item(item.clone()).await?;
    store
        .append_activity(ActivityEntry::new(
            "content_processed",
            format!(
                "{} ({} concepts, {} new connections)",
                item.title,
                item.key_concepts.len(),
                added
            ),
        ))
        .await?;

    tracing::info!(
        title = %item.title,
        concepts = item.key_concepts.len(),
        connections = added,
        "Processed content"
    );
    Ok(item)
}

/// Process several inputs sequentially with a fixed pause between items, so
/// the external API is not hammered.
///
/// # Errors
///
/// Stops at the first failing item and returns its error.
pub async fn process_batch(
    store: &mut Store,
    llm: &LlmClient,
    fetcher: &ContentFetcher,
    inputs: &[String],
) -> Result<Vec<ContentItem>, FeatureError> {
    let delay = std::time::Duration::from_secs(fetcher.config().batch_delay_secs);
    let mut items = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(delay).await;
        }
        items.push(process_content(store, llm, fetcher, input).await?);
    }
    Ok(items)
}

/// Fetch through the content cache for URL inputs.
async fn fetch_with_cache(
    store: &mut Store,
    fetcher: &ContentFetcher,
    input: &str,
) -> Result<FetchedContent, FeatureError> {
    let trimmed = input.trim();
    let is_url = trimmed.starts_with("http://") || trimmed.starts_with("https://");
    if is_url {
        let ttl = chrono::Duration::seconds(fetcher.config().cache_ttl_secs);
        if let Some(cached) = store.cache_get(trimmed, ttl) {
            tracing::debug!(url = trimmed, "Content cache hit");
            let kind = if crate::content::youtube_video_id(trimmed).is_some() {
                ContentKind::YoutubeVideo
            } else {
                ContentKind::Webpage
            };
            return Ok(FetchedContent {
                kind,
                url: Some(trimmed.to_string()),
                title: cached.title.clone(),
                content: cached.content.clone(),
            });
        }
    }

    let fetched = fetcher.fetch(trimmed).await?;
    if let Some(url) = &fetched.url {
        store
            .cache_put(
                url.clone(),
                CachedContent {
                    title: fetched.title.clone(),
                    content: fetched.content.clone(),
                    fetched_at: Utc::now(),
                },
            )
            .await?;
    }
    Ok(fetched)
}
