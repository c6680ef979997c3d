use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use super::errors::{RelayError, RelayResult};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

fn id_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("valid video id pattern"))
}

/// Shape-checked video identifier.
///
/// Only the form is validated (11 URL-safe characters); whether the video
/// exists is for the tool to find out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn parse(raw: &str) -> RelayResult<Self> {
        let raw = raw.trim();
        if id_shape().is_match(raw) {
            Ok(VideoId(raw.to_string()))
        } else {
            Err(RelayError::malformed(format!(
                "'{}' is not a valid video id",
                raw.chars().take(32).collect::<String>()
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL handed to the tool.
    pub fn watch_url(&self) -> String {
        format!("{}{}", WATCH_URL, self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
