//! One-shot command implementations shared by the menu and the subcommands.

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::content::ContentFetcher;
use crate::display;
use crate::features::{self, FeatureError, QuizQuestion, PROFILE_QUESTIONS};
use crate::llm::LlmClient;
use crate::store::{QuestionResult, Store};

/// Everything a command needs: the store plus the external clients.
pub struct App {
    pub store: Store,
    pub llm: LlmClient,
    pub fetcher: ContentFetcher,
}

/// Read one trimmed line from stdin.
///
/// # Errors
///
/// Returns an error if stdin is closed or unreadable.
pub async fn read_line() -> std::io::Result<String> {
    let mut line = String::new();
    let mut reader = BufReader::new(tokio::io::stdin());
    reader.read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

impl App {
    /// Process one or more content inputs (URLs or raw text).
    ///
    /// # Errors
    ///
    /// Returns `FeatureError` if fetching, extraction, or persistence fails.
    pub async fn process(&mut self, inputs: &[String]) -> Result<(), FeatureError> {
        let items =
            features::process_batch(&mut self.store, &self.llm, &self.fetcher, inputs).await?;
        for item in &items {
            display::print_processed(&item.title, &item.key_concepts, &item.insights);
        }
        Ok(())
    }

    /// Run an interactive reinforcement quiz over due concepts.
    ///
    /// # Errors
    ///
    /// Returns `FeatureError` on LLM transport or store failure. A stdin
    /// failure ends the quiz early and scores what was answered.
    pub async fn reinforce(&mut self) -> Result<(), FeatureError> {
        let quiz = features::generate_quiz(&self.store, &self.llm).await?;
        if quiz.questions.is_empty() {
            display::print_info("Nothing is due for review right now.");
            return Ok(());
        }

        let total = quiz.questions.len();
        let mut results = Vec::with_capacity(total);
        for (i, question) in quiz.questions.iter().enumerate() {
            display::print_question(i, total, question);
            display::print_prompt("answer");
            let answer = match read_line().await {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read answer, ending quiz early");
                    break;
                }
            };
            if answer.is_empty() {
                display::print_info("Skipped.");
                continue;
            }
            results.push(score_one(&self.llm, question, &answer).await?);
        }

        if results.is_empty() {
            display::print_info("No answers given, nothing recorded.");
            return Ok(());
        }
        let session = features::complete_session(&mut self.store, results).await?;
        display::print_quiz_summary(&quiz, session.overall_performance);
        Ok(())
    }

    /// Generate and print exploration suggestions.
    ///
    /// # Errors
    ///
    /// Returns `FeatureError` on LLM transport or store failure.
    pub async fn suggest(&mut self) -> Result<(), FeatureError> {
        let suggestions = features::suggest_exploration(&mut self.store, &self.llm).await?;
        display::print_suggestions(&suggestions);
        Ok(())
    }

    /// Run a reflection session and print the outcome.
    ///
    /// # Errors
    ///
    /// Returns `FeatureError` on LLM transport or store failure.
    pub async fn reflect(&mut self) -> Result<(), FeatureError> {
        let session = features::run_reflection(&mut self.store, &self.llm).await?;
        display::print_reflection(&session);
        Ok(())
    }

    /// Walk through the profile questions and persist the extracted profile.
    ///
    /// # Errors
    ///
    /// Returns `FeatureError` on LLM transport or store failure.
    pub async fn profile(&mut self) -> Result<(), FeatureError> {
        let mut answers = Vec::with_capacity(PROFILE_QUESTIONS.len());
        for question in PROFILE_QUESTIONS {
            println!("{question}");
            display::print_prompt("");
            match read_line().await {
                Ok(answer) => answers.push((question.to_string(), answer)),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read answer, stopping early");
                    break;
                }
            }
        }
        let profile = features::update_profile(&mut self.store, &self.llm, &answers).await?;
        display::print_info(&format!(
            "Profile saved: {} goals, {} interests",
            profile.goals.len(),
            profile.interests.len()
        ));
        Ok(())
    }

    /// Print store statistics and the weakest concepts.
    pub fn stats(&self) {
        display::print_stats(&self.store.stats());
        let mut weakest: Vec<_> = self.store.graph().concepts.iter().collect();
        weakest.sort_by(|a, b| a.confidence.total_cmp(&b.confidence));
        if !weakest.is_empty() {
            display::print_info("Weakest concepts:");
            for concept in weakest.iter().take(5) {
                display::print_concept(concept);
            }
        }
    }

    /// Wipe all stored documents after an explicit confirmation.
    ///
    /// # Errors
    ///
    /// Returns `FeatureError::Store` if rewriting the documents fails.
    pub async fn reset(&mut self) -> Result<(), FeatureError> {
        display::print_prompt("Type 'yes' to erase all knowledge data");
        match read_line().await {
            Ok(line) if line == "yes" => {
                self.store.reset().await?;
                display::print_info("All data reset.");
            }
            Ok(_) => display::print_info("Reset cancelled."),
            Err(e) => tracing::warn!(error = %e, "Failed to read confirmation"),
        }
        Ok(())
    }
}

/// Score a single answer and fold it into a stored result.
async fn score_one(
    llm: &LlmClient,
    question: &QuizQuestion,
    answer: &str,
) -> Result<QuestionResult, FeatureError> {
    let score = features::score_answer(llm, question, answer).await?;
    display::print_score(score.accuracy, score.completeness, &score.feedback);
    Ok(QuestionResult {
        concept: question.concept.clone(),
        question: question.question.clone(),
        answer: answer.to_string(),
        accuracy: score.accuracy,
        completeness: score.completeness,
        feedback: score.feedback,
    })
}
