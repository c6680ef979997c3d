//! Adapters - Concrete implementations of ports.

pub mod http;
pub mod youtube_api;
pub mod ytdlp;
