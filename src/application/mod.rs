//! Application layer - Services generic over the tool port.

pub mod resolver;
pub mod streamer;
