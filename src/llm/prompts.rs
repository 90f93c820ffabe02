//! System prompts and prompt builders for the knowledge flows.

/// System prompt for concept extraction from content.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are a knowledge extraction assistant.

Given a piece of learning content, identify the key concepts it teaches and how
they relate to each other.

Respond with a single JSON object:
{
  "concepts": [{"name": "...", "category": "...", "confidence": 0.0}],
  "connections": [{"from": "...", "to": "...", "relationship": "..."}],
  "insights": ["..."]
}

Concept names must be short noun phrases. Confidence is your estimate (0-1) of
how central the concept is to the content. Keep lists focused: at most 8
concepts, 10 connections, 5 insights."#;

/// System prompt for review question generation.
pub const QUIZ_SYSTEM_PROMPT: &str = r#"You are a spaced-repetition tutor.

Generate short-answer review questions that test real understanding of the
given concepts, not rote recall of definitions.

Respond with a single JSON object:
{
  "questions": [{"concept": "...", "question": "...", "ideal_answer": "..."}]
}"#;

/// System prompt for scoring a review answer.
pub const SCORING_SYSTEM_PROMPT: &str = r#"You are grading a learner's answer to a review question.

Compare the learner's answer against the ideal answer.

Respond with a single JSON object:
{
  "accuracy": 0.0,
  "completeness": 0.0,
  "feedback": "..."
}

Both scores are in [0,1]. Feedback is one or two sentences."#;

/// System prompt for exploration suggestions.
pub const EXPLORATION_SYSTEM_PROMPT: &str = r#"You are a learning path advisor.

Given a learner's profile and the current state of their knowledge graph,
suggest areas worth exploring next.

Respond with a single JSON object:
{
  "suggestions": [{
    "area": "...",
    "priority": "high|medium|low",
    "reason": "...",
    "related_concepts": ["..."],
    "estimated_time": "..."
  }]
}

At most 5 suggestions, ordered by priority."#;

/// System prompt for reflection sessions.
pub const REFLECTION_SYSTEM_PROMPT: &str = r#"You are guiding a learning reflection session.

Given recent activity and the learner's goals, produce reflection insights,
any new connections between known concepts, and next steps.

Respond with a single JSON object:
{
  "insights": [{"prompt": "...", "insight": "..."}],
  "derived_connections": [{"from": "...", "to": "...", "relationship": "..."}],
  "goal_progress": [{"goal": "...", "assessment": "..."}],
  "next_steps": ["..."]
}"#;

/// System prompt for profile extraction from conversational answers.
pub const PROFILE_SYSTEM_PROMPT: &str = r#"You extract a learner profile from free-form answers.

Respond with a single JSON object:
{
  "goals": ["..."],
  "interests": ["..."],
  "learning_style": "...",
  "time_commitment": "..."
}

Use the learner's own wording where possible."#;

/// System prompt for the web chat surface.
pub const CHAT_SYSTEM_PROMPT: &str = r#"You are Eumicus, a personal learning companion.

Answer questions about the learner's tracked concepts, suggest what to review,
and explain connections in their knowledge graph. Be concise and concrete."#;

/// Format content for the extraction prompt.
#[must_use]
pub fn format_extraction(title: &str, content: &str, known_concepts: &[String]) -> String {
    let known = if known_concepts.is_empty() {
        "none yet".to_string()
    } else {
        known_concepts.join(", ")
    };
    format!(
        "Title: {title}\n\nAlready-tracked concepts (connect to these where relevant): {known}\n\nContent:\n{content}"
    )
}

/// Format due concepts for the quiz prompt.
#[must_use]
pub fn format_quiz_request(concepts: &[(String, f64)]) -> String {
    let listing = concepts
        .iter()
        .map(|(name, confidence)| format!("- {name} (current confidence {confidence:.2})"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Concepts due for review:\n{listing}\n\nGenerate one question per concept.")
}

/// Format a question/answer pair for the scoring prompt.
#[must_use]
pub fn format_scoring(question: &str, ideal_answer: &str, learner_answer: &str) -> String {
    format!(
        "Question: {question}\n\nIdeal answer: {ideal_answer}\n\nLearner's answer: {learner_answer}"
    )
}

/// Format the knowledge state for the exploration prompt.
#[must_use]
pub fn format_exploration(
    goals: &[String],
    interests: &[String],
    concept_summary: &str,
) -> String {
    format!(
        "Goals: {}\nInterests: {}\n\nKnowledge graph summary:\n{concept_summary}",
        goals.join("; "),
        interests.join("; ")
    )
}

/// Format recent activity for the reflection prompt.
#[must_use]
pub fn format_reflection(goals: &[String], recent_activity: &str, concept_summary: &str) -> String {
    format!(
        "Goals: {}\n\nRecent activity:\n{recent_activity}\n\nKnowledge graph summary:\n{concept_summary}",
        goals.join("; ")
    )
}

/// Format conversational answers for the profile prompt.
#[must_use]
pub fn format_profile(answers: &[(String, String)]) -> String {
    answers
        .iter()
        .map(|(question, answer)| format!("Q: {question}\nA: {answer}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}
