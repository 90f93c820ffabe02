//! Feature flows: each builds a prompt, calls the LLM, and merges the parsed
//! result into the store. Malformed model output falls back to a hardcoded
//! shape instead of failing the flow.

mod chat;
mod error;
mod explore;
mod extract;
mod profile;
mod reflect;
mod reinforce;

pub use chat::*;
pub use error::*;
pub use explore::*;
pub use extract::*;
pub use profile::*;
pub use reflect::*;
pub use reinforce::*;
