//! LLM completion client and prompt builders.

mod client;
pub mod prompts;

pub use client::*;
