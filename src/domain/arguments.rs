//! Translates a request into the tool's argument vector.

use std::path::Path;

use super::quality::{MediaKind, QualityRequest};
use super::video_id::VideoId;

/// Arguments for one streaming invocation of the tool, program name excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentVector(Vec<String>);

impl ArgumentVector {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }

    /// Value following `flag`, if present.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.0
            .iter()
            .position(|arg| arg == flag)
            .and_then(|i| self.0.get(i + 1))
            .map(String::as_str)
    }
}

/// Selector for the best video no taller than `height` plus the best audio,
/// falling back to a single pre-muxed stream under the same ceiling.
pub fn video_selector(height: u32) -> String {
    format!(
        "bestvideo[height<={h}]+bestaudio/best[height<={h}]",
        h = height
    )
}

/// Pure: identical inputs always yield identical vectors.
pub fn build_arguments(
    video: &VideoId,
    quality: &QualityRequest,
    ffmpeg_location: Option<&Path>,
) -> ArgumentVector {
    let mut args: Vec<String> = vec![
        video.watch_url(),
        "-o".into(),
        "-".into(),
        "--no-playlist".into(),
        "--no-progress".into(),
    ];

    if let Some(location) = ffmpeg_location {
        args.push("--ffmpeg-location".into());
        args.push(location.to_string_lossy().into_owned());
    }

    match quality.kind {
        MediaKind::Audio => {
            args.extend([
                "-x".into(),
                "--audio-format".into(),
                "mp3".into(),
                "--audio-quality".into(),
                format!("{}K", quality.target),
            ]);
        }
        MediaKind::Video => {
            args.extend([
                "-f".into(),
                video_selector(quality.target),
                "--merge-output-format".into(),
                "mp4".into(),
            ]);
        }
    }

    ArgumentVector(args)
}
