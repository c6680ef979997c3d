//! Domain layer - Pure logic, no processes and no sockets.

pub mod arguments;
pub mod catalog;
pub mod details;
pub mod errors;
pub mod framing;
pub mod quality;
pub mod video_id;

pub use errors::{RelayError, RelayResult};
pub use quality::{MediaKind, QualityRequest};
pub use video_id::VideoId;
