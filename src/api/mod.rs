//! API Module
//!
//! HTTP surface of the gateway: handlers, route table, and the caller
//! identity extractor.

mod handlers;
mod routes;

pub use handlers::{AppState, Caller, IDENTITY_HEADER};
pub use routes::create_router;
