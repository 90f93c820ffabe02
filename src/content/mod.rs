//! Content acquisition: fetching web pages and YouTube transcripts, parsing
//! them into plain text for the extraction flow.

mod fetch;
mod html;

pub use fetch::*;
pub use html::*;
