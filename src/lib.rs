//! vidrelay - On-demand media download relay
//!
//! Hexagonal Architecture:
//! - domain/: Pure logic (video ids, quality tiers, catalog parsing, argument
//!   building, response framing, errors)
//! - ports/: Trait definitions (tool runner, outbound sink, details source)
//! - adapters/: Concrete implementations (yt-dlp process, YouTube Data API, axum)
//! - application/: Catalog resolver and streaming process manager
//! - config: Environment configuration
//!
//! Nothing is written to disk: the tool's stdout is relayed straight into
//! the HTTP response, and the process is terminated as soon as the client
//! goes away.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use adapters::http::{router, AppState};
pub use config::{RelayConfig, ToolLocator};
pub use domain::{RelayError, RelayResult};
