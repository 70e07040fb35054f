pub mod config;
pub mod error;
pub mod types;

pub use config::RagChatConfig;
pub use error::{RagChatError, Result};
pub use types::*;
