//! Protocol types for the JSON-RPC capability endpoint

mod messages;
mod types;

pub use messages::*;
pub use types::*;

/// Protocol version advertised by `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";
