//! Web API server: REST endpoints plus an SSE push channel.

mod api;
mod handlers;
#[allow(clippy::module_inception)]
mod server;
mod state;

pub use api::*;
pub use handlers::AppState;
pub use server::*;
pub use state::*;
