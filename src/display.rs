//! Colored CLI display utilities.
//!
//! This module provides functions for printing colored, formatted output
//! to the terminal during interactive sessions.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use crate::features::{Quiz, QuizQuestion};
use crate::store::{Concept, ExplorationSuggestion, KnowledgeStats, ReflectionSession};

/// Maximum length for truncated display strings.
const DEFAULT_MAX_LEN: usize = 80;

/// Truncate a string to a maximum length, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{cut}...")
    }
}

/// Render a confidence value as a colored bar with the numeric value.
#[must_use]
pub fn confidence_bar(confidence: f64) -> String {
    let clamped = confidence.clamp(0.0, 1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = (clamped * 10.0).round() as usize;
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled));
    if clamped >= 0.8 {
        format!("{} {clamped:.2}", bar.green())
    } else if clamped >= 0.4 {
        format!("{} {clamped:.2}", bar.yellow())
    } else {
        format!("{} {clamped:.2}", bar.red())
    }
}

/// Print the interactive menu header and options.
pub fn print_menu() {
    println!();
    println!("{}", "Eumicus — personal knowledge assistant".bold());
    println!("  {} Update learning profile", "1.".cyan());
    println!("  {} Process content (URL or text)", "2.".cyan());
    println!("  {} Reinforcement quiz", "3.".cyan());
    println!("  {} Exploration suggestions", "4.".cyan());
    println!("  {} Reflection session", "5.".cyan());
    println!("  {} Knowledge stats", "6.".cyan());
    println!("  {} Reset all data", "7.".cyan());
    println!("  {} Quit", "q.".cyan());
    let _ = io::stdout().flush();
}

/// Print a prompt without a trailing newline and flush.
pub fn print_prompt(prompt: &str) {
    print!("{} ", format!("{prompt}>").bold());
    let _ = io::stdout().flush();
}

/// Print a processed-content summary.
pub fn print_processed(title: &str, key_concepts: &[String], insights: &[String]) {
    println!(
        "{} {}",
        "[PROCESSED]".green().bold(),
        truncate(title, DEFAULT_MAX_LEN)
    );
    if !key_concepts.is_empty() {
        println!("  concepts: {}", key_concepts.join(", ").cyan());
    }
    for insight in insights {
        println!("  {} {}", "•".dimmed(), truncate(insight, 120));
    }
    let _ = io::stdout().flush();
}

/// Print a single concept with its confidence bar.
pub fn print_concept(concept: &Concept) {
    println!(
        "  {} {} {}",
        confidence_bar(concept.confidence),
        concept.name.bold(),
        format!("({})", concept.category).dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print a quiz question with its position in the quiz.
pub fn print_question(index: usize, total: usize, question: &QuizQuestion) {
    println!(
        "{} {}",
        format!("[{}/{}]", index + 1, total).cyan().bold(),
        question.concept.bold()
    );
    println!("  {}", question.question);
    let _ = io::stdout().flush();
}

/// Print the scoring feedback for an answer.
pub fn print_score(accuracy: f64, completeness: f64, feedback: &str) {
    println!(
        "  accuracy {} completeness {}",
        format!("{accuracy:.2}").yellow(),
        format!("{completeness:.2}").yellow()
    );
    if !feedback.is_empty() {
        println!("  {}", feedback.dimmed());
    }
    let _ = io::stdout().flush();
}

/// Print the session summary after a completed quiz.
pub fn print_quiz_summary(quiz: &Quiz, overall_performance: f64) {
    println!(
        "{} {} questions, overall performance {}",
        "[REINFORCE]".blue().bold(),
        quiz.questions.len(),
        format!("{overall_performance:.2}").yellow().bold()
    );
    let _ = io::stdout().flush();
}

/// Print exploration suggestions.
pub fn print_suggestions(suggestions: &[ExplorationSuggestion]) {
    if suggestions.is_empty() {
        println!("{} nothing to suggest yet", "[EXPLORE]".magenta().bold());
        return;
    }
    println!("{}", "[EXPLORE]".magenta().bold());
    for suggestion in suggestions {
        println!(
            "  {} {} {}",
            priority_tag(&suggestion.priority),
            suggestion.area.bold(),
            format!("~{}", suggestion.estimated_time).dimmed()
        );
        println!("    {}", truncate(&suggestion.reason, 120).dimmed());
    }
    let _ = io::stdout().flush();
}

fn priority_tag(priority: &str) -> String {
    match priority {
        "high" => "[high]".red().bold().to_string(),
        "low" => "[low]".dimmed().to_string(),
        _ => "[medium]".yellow().to_string(),
    }
}

/// Print a reflection session's insights and next steps.
pub fn print_reflection(session: &ReflectionSession) {
    println!("{}", "[REFLECT]".blue().bold());
    for insight in &session.insights {
        println!("  {} {}", "?".dimmed(), truncate(&insight.prompt, 100).dimmed());
        println!("    {}", truncate(&insight.insight, 120));
    }
    for progress in &session.goal_progress {
        println!(
            "  goal {} — {}",
            progress.goal.bold(),
            truncate(&progress.assessment, 100).dimmed()
        );
    }
    if !session.next_steps.is_empty() {
        println!("  {}", "next steps:".bold());
        for step in &session.next_steps {
            println!("    {} {}", "→".cyan(), truncate(step, 120));
        }
    }
    let _ = io::stdout().flush();
}

/// Print knowledge store statistics.
pub fn print_stats(stats: &KnowledgeStats) {
    println!("{}", "[STATS]".blue().bold());
    println!("  concepts:              {}", stats.concept_count);
    println!("  content items:         {}", stats.content_count);
    println!("  reinforcement rounds:  {}", stats.reinforcement_sessions);
    println!("  reflection sessions:   {}", stats.reflection_sessions);
    println!(
        "  due for review:        {}",
        if stats.due_for_review > 0 {
            stats.due_for_review.to_string().yellow().to_string()
        } else {
            stats.due_for_review.to_string()
        }
    );
    println!(
        "  average confidence:    {}",
        confidence_bar(stats.average_confidence)
    );
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stdout().flush();
}

/// Print an informational message.
pub fn print_info(message: &str) {
    println!("{} {}", "[INFO]".blue().bold(), message);
    let _ = io::stdout().flush();
}
