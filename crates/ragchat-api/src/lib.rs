//! ragchat API crate - axum HTTP server and route handlers.
//!
//! Exposes the document list, conversation creation, messaging, history,
//! and health endpoints over the conversation layer in `ragchat-chat`.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
