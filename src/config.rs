//! Process-wide configuration, read once at startup and never mutated.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Where the external programs live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolLocator {
    /// The extraction tool (`yt-dlp` or a compatible binary)
    pub tool_path: PathBuf,
    /// Forwarded as `--ffmpeg-location` when set; otherwise the tool finds ffmpeg on `PATH`
    pub ffmpeg_path: Option<PathBuf>,
}

impl Default for ToolLocator {
    fn default() -> Self {
        Self {
            tool_path: PathBuf::from("yt-dlp"),
            ffmpeg_path: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    pub tools: ToolLocator,
    /// Simultaneous transcodes allowed
    pub max_concurrent_streams: usize,
    /// How long a request may wait for a transcode slot
    pub admission_timeout: Duration,
    /// Time between closing the pipe and killing the process
    pub kill_grace: Duration,
    /// Upper bound for metadata and title queries
    pub metadata_timeout: Duration,
    /// Enables `/api/details` when present
    pub youtube_api_key: Option<String>,
    /// Built front-end served as fallback
    pub static_dir: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl RelayConfig {
    /// Load configuration from `.env` and environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Missing or unparsable values
    /// fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secs = |key: &str, default: u64| {
            Duration::from_secs(
                non_empty(key)
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(default),
            )
        };

        Self {
            addr: non_empty("ADDR").unwrap_or_else(|| String::from("127.0.0.1")),
            port: non_empty("PORT").unwrap_or_else(|| String::from("3001")),
            tools: ToolLocator {
                tool_path: non_empty("YTDLP_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("yt-dlp")),
                ffmpeg_path: non_empty("FFMPEG_PATH").map(PathBuf::from),
            },
            max_concurrent_streams: non_empty("MAX_CONCURRENT_STREAMS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(4),
            admission_timeout: secs("ADMISSION_TIMEOUT_SECS", 10),
            kill_grace: secs("KILL_GRACE_SECS", 3),
            metadata_timeout: secs("METADATA_TIMEOUT_SECS", 60),
            youtube_api_key: non_empty("YOUTUBE_API_KEY"),
            static_dir: non_empty("STATIC_DIR").map(PathBuf::from),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}
