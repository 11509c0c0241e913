//! Web server module
//!
//! Exposes the launcher to a presentation client over a local HTTP API.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
