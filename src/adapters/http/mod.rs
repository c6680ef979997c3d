//! HTTP inbound adapter.
//!
//! Exposes the catalog lookup and the streaming download over axum.

mod error;
mod routes;
pub mod sink;

pub use error::status_for;
pub use routes::{router, AppState, StreamParams};
