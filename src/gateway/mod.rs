//! HTTP gateway: authentication gate, router and server lifecycle

pub mod auth;
pub mod router;
pub mod server;

pub use router::{AppState, create_router};
pub use server::Gateway;
