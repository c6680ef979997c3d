//! Quality tokens and tier clamping.

use regex::Regex;
use serde::Serialize;
use std::cmp::Reverse;
use std::sync::OnceLock;

use super::errors::{RelayError, RelayResult};

/// Supported video ceilings, highest first.
pub const VIDEO_TIERS: [u32; 3] = [1080, 720, 480];
/// Supported mp3 bitrates in kbps, highest first.
pub const AUDIO_TIERS: [u32; 3] = [320, 192, 128];

pub const DEFAULT_VIDEO_HEIGHT: u32 = 720;
pub const DEFAULT_AUDIO_BITRATE: u32 = 192;

fn token_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(r"^([0-9]{1,5})[pPkK]?$").expect("valid quality pattern"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Anything other than `audio` is treated as a video request.
    pub fn from_token(token: Option<&str>) -> Self {
        match token.map(str::trim) {
            Some(t) if t.eq_ignore_ascii_case("audio") => MediaKind::Audio,
            _ => MediaKind::Video,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            MediaKind::Video => "video/mp4",
            MediaKind::Audio => "audio/mpeg",
        }
    }
}

/// What the client asked for, already clamped to a supported tier.
///
/// `target` is a maximum height for video and a bitrate in kbps for audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityRequest {
    pub kind: MediaKind,
    pub target: u32,
}

impl QualityRequest {
    pub fn new(kind: MediaKind, target: Option<u32>) -> Self {
        let target = match kind {
            MediaKind::Video => clamp_height(target.unwrap_or(DEFAULT_VIDEO_HEIGHT)),
            MediaKind::Audio => clamp_bitrate(target.unwrap_or(DEFAULT_AUDIO_BITRATE)),
        };
        Self { kind, target }
    }

    pub fn video(height: u32) -> Self {
        Self::new(MediaKind::Video, Some(height))
    }

    pub fn audio(bitrate: u32) -> Self {
        Self::new(MediaKind::Audio, Some(bitrate))
    }

    /// Builds a request from the `type` and `format` query values.
    ///
    /// Stale or odd numbers are clamped, never rejected; only a token that is
    /// not a number at all is an error.
    pub fn from_tokens(kind: Option<&str>, quality: Option<&str>) -> RelayResult<Self> {
        let kind = MediaKind::from_token(kind);
        let target = match quality.map(str::trim).filter(|q| !q.is_empty()) {
            None => None,
            Some(token) => {
                let digits = token_shape()
                    .captures(token)
                    .and_then(|caps| caps.get(1))
                    .ok_or_else(|| {
                        RelayError::malformed(format!("'{}' is not a quality tier", token))
                    })?;
                // at most five digits, always fits
                Some(digits.as_str().parse::<u32>().unwrap_or(0))
            }
        };
        Ok(Self::new(kind, target))
    }
}

/// Largest tier not above `height`, or the smallest tier when every tier is.
pub fn clamp_height(height: u32) -> u32 {
    VIDEO_TIERS
        .iter()
        .copied()
        .find(|tier| *tier <= height)
        .unwrap_or(VIDEO_TIERS[VIDEO_TIERS.len() - 1])
}

/// Nearest bitrate tier; ties go to the higher tier.
pub fn clamp_bitrate(bitrate: u32) -> u32 {
    AUDIO_TIERS
        .iter()
        .copied()
        .min_by_key(|tier| (tier.abs_diff(bitrate), Reverse(*tier)))
        .unwrap_or(DEFAULT_AUDIO_BITRATE)
}
