//! Ports - Trait definitions at the edges of the relay.

pub mod details;
pub mod sink;
pub mod tool;
