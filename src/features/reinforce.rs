//! Spaced-repetition review: question generation, scoring, and confidence
//! updates.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::llm::{prompts, LlmClient, LlmError};
use crate::schedule::{next_review_at, performance_score, updated_confidence};
use crate::store::{ActivityEntry, QuestionResult, ReinforcementSession, Store};

use super::FeatureError;

/// Number of concepts reviewed per session.
pub const REVIEW_BATCH_SIZE: usize = 5;

/// One generated review question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestion {
    pub concept: String,
    pub question: String,
    #[serde(default)]
    pub ideal_answer: String,
}

/// Parsed quiz-generation response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Quiz {
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

/// Parsed answer-scoring response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerScore {
    pub accuracy: f64,
    pub completeness: f64,
    #[serde(default)]
    pub feedback: String,
}

/// Fallback when quiz generation returns malformed JSON: a fixed two-question
/// quiz over the first due concepts.
#[must_use]
pub fn fallback_quiz(due: &[(String, f64)]) -> Quiz {
    let questions = due
        .iter()
        .take(2)
        .flat_map(|(name, _)| {
            [
                QuizQuestion {
                    concept: name.clone(),
                    question: format!("Explain {name} in your own words."),
                    ideal_answer: String::new(),
                },
                QuizQuestion {
                    concept: name.clone(),
                    question: format!("Where would you apply {name} in practice?"),
                    ideal_answer: String::new(),
                },
            ]
        })
        .take(2)
        .collect();
    Quiz { questions }
}

/// Fallback when answer scoring returns malformed JSON: a neutral score so the
/// session can finish.
#[must_use]
pub fn fallback_score() -> AnswerScore {
    AnswerScore {
        accuracy: 0.5,
        completeness: 0.5,
        feedback: "Could not grade this answer automatically.".to_string(),
    }
}

/// Generate a quiz over the concepts currently due for review.
///
/// Returns an empty quiz when nothing is due.
///
/// # Errors
///
/// Returns `FeatureError` on LLM transport failure. Malformed output falls
/// back to [`fallback_quiz`].
pub async fn generate_quiz(store: &Store, llm: &LlmClient) -> Result<Quiz, FeatureError> {
    let due: Vec<(String, f64)> = store
        .concepts_due_for_review(Utc::now())
        .iter()
        .take(REVIEW_BATCH_SIZE)
        .map(|c| (c.name.clone(), c.confidence))
        .collect();

    if due.is_empty() {
        tracing::info!("No concepts due for review");
        return Ok(Quiz::default());
    }

    let user = prompts::format_quiz_request(&due);
    match llm
        .complete_json::<Quiz>(prompts::QUIZ_SYSTEM_PROMPT, &user)
        .await
    {
        Ok(quiz) => Ok(quiz),
        Err(LlmError::ParseError(e)) => {
            tracing::warn!(error = %e, "Malformed quiz response, using fallback");
            Ok(fallback_quiz(&due))
        }
        Err(e) => Err(e.into()),
    }
}

/// Score a learner's answer against the question's ideal answer.
///
/// # Errors
///
/// Returns `FeatureError` on LLM transport failure. Malformed output falls
/// back to [`fallback_score`].
pub async fn score_answer(
    llm: &LlmClient,
    question: &QuizQuestion,
    answer: &str,
) -> Result<AnswerScore, FeatureError> {
    let user = prompts::format_scoring(&question.question, &question.ideal_answer, answer);
    match llm
        .complete_json::<AnswerScore>(prompts::SCORING_SYSTEM_PROMPT, &user)
        .await
    {
        Ok(mut score) => {
            score.accuracy = score.accuracy.clamp(0.0, 1.0);
            score.completeness = score.completeness.clamp(0.0, 1.0);
            Ok(score)
        }
        Err(LlmError::ParseError(e)) => {
            tracing::warn!(error = %e, "Malformed scoring response, using fallback");
            Ok(fallback_score())
        }
        Err(e) => Err(e.into()),
    }
}

/// Record a finished review session: update each concept's confidence (EMA)
/// and next-review schedule, then append the session and an activity entry.
///
/// # Errors
///
/// Returns `FeatureError` if persisting fails.
pub async fn complete_session(
    store: &mut Store,
    results: Vec<QuestionResult>,
) -> Result<ReinforcementSession, FeatureError> {
    let now = Utc::now();
    let mut reviewed = Vec::new();

    for result in &results {
        let performance = performance_score(result.accuracy, result.completeness);
        if let Some(concept) = store
            .graph_mut()
            .concepts
            .iter_mut()
            .find(|c| c.name == result.concept)
        {
            concept.confidence = updated_confidence(concept.confidence, performance);
            concept.reinforcement_schedule = Some(next_review_at(now, concept.confidence));
            concept.last_updated = now;
            if !reviewed.contains(&result.concept) {
                reviewed.push(result.concept.clone());
            }
        } else {
            tracing::warn!(concept = %result.concept, "Review result for unknown concept");
        }
    }

    let overall_performance = if results.is_empty() {
        0.0
    } else {
        results
            .iter()
            .map(|r| performance_score(r.accuracy, r.completeness))
            .sum::<f64>()
            / results.len() as f64
    };

    let session = ReinforcementSession {
        id: Uuid::new_v4().to_string(),
        reviewed_concepts: reviewed,
        questions: results,
        overall_performance,
        completed_at: now,
    };

    store.record_reinforcement(session.clone()).await?;
    store
        .append_activity(ActivityEntry::new(
            "review_completed",
            format!(
                "{} concepts reviewed, performance {:.2}",
                session.reviewed_concepts.len(),
                session.overall_performance
            ),
        ))
        .await?;

    Ok(session)
}
