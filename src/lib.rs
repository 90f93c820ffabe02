//! Eumicus - Personal knowledge-tracking assistant.
//!
//! Collects learning goals, processes content through an LLM to extract
//! concepts and connections, and drives spaced-repetition review.

pub mod cli;
pub mod config;
pub mod content;
pub mod display;
pub mod features;
pub mod graph;
pub mod llm;
pub mod schedule;
pub mod server;
pub mod store;
