//! Learner profile extraction from conversational answers.

use crate::llm::{prompts, LlmClient, LlmError};
use crate::store::{ActivityEntry, Store, UserProfile};

use super::FeatureError;

/// The onboarding questions asked by the profile flow.
pub const PROFILE_QUESTIONS: [&str; 4] = [
    "What do you want to learn or get better at?",
    "What topics are you naturally curious about?",
    "How do you learn best (reading, videos, projects, discussion)?",
    "How much time can you commit per week?",
];

/// Fallback when the model returns malformed JSON: carry the learner's answers
/// over verbatim as free-text lists.
#[must_use]
pub fn fallback_profile(answers: &[(String, String)]) -> UserProfile {
    let mut profile = UserProfile::default();
    for (i, (_, answer)) in answers.iter().enumerate() {
        let answer = answer.trim().to_string();
        if answer.is_empty() {
            continue;
        }
        match i {
            0 => profile.goals.push(answer),
            1 => profile.interests.push(answer),
            2 => profile.learning_style = answer,
            _ => profile.time_commitment = answer,
        }
    }
    profile
}

/// Extract a profile from question/answer pairs and persist it.
///
/// # Errors
///
/// Returns `FeatureError` on LLM transport or store failure.
pub async fn update_profile(
    store: &mut Store,
    llm: &LlmClient,
    answers: &[(String, String)],
) -> Result<UserProfile, FeatureError> {
    let user = prompts::format_profile(answers);

    let profile = match llm
        .complete_json::<UserProfile>(prompts::PROFILE_SYSTEM_PROMPT, &user)
        .await
    {
        Ok(parsed) => parsed,
        Err(LlmError::ParseError(e)) => {
            tracing::warn!(error = %e, "Malformed profile response, using fallback");
            fallback_profile(answers)
        }
        Err(e) => return Err(e.into()),
    };

    store.set_profile(profile).await?;
    store
        .append_activity(ActivityEntry::new("profile_updated", "Learner profile updated"))
        .await?;
    Ok(store.profile().clone())
}
