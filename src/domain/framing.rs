//! Response headers for a download: filename, disposition, content type.

use super::quality::{MediaKind, QualityRequest};

/// Headers that must be applied before the first payload byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedHeaders {
    pub content_type: &'static str,
    pub content_disposition: String,
    pub filename: String,
}

/// Keeps ASCII letters, digits, whitespace, `.`, `-` and `_`, then trims.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || matches!(c, '.' | '-' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn filename_for(title: &str, quality: &QualityRequest) -> String {
    let mut stem = sanitize_title(title);
    // leading dots would make a hidden file
    while stem.starts_with('.') {
        stem.remove(0);
    }
    let stem = stem.trim();
    let stem = if stem.is_empty() {
        match quality.kind {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    } else {
        stem
    };

    match quality.kind {
        MediaKind::Video => format!("{} - {}p.{}", stem, quality.target, quality.kind.extension()),
        MediaKind::Audio => format!("{}.{}", stem, quality.kind.extension()),
    }
}

pub fn frame(title: &str, quality: &QualityRequest) -> FramedHeaders {
    let filename = filename_for(title, quality);
    let content_disposition = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        filename,
        urlencoding::encode(&filename)
    );

    FramedHeaders {
        content_type: quality.kind.content_type(),
        content_disposition,
        filename,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_outside_allow_list() {
        assert_eq!(sanitize_title("  AC/DC: \"Back in Black\" (Live) "), "ACDC Back in Black Live");
        assert_eq!(sanitize_title("file_name-v1.2"), "file_name-v1.2");
        assert_eq!(sanitize_title("Café 東京 ♪"), "Caf");
    }

    #[test]
    fn test_video_filename_carries_resolution() {
        let headers = frame("My Clip", &QualityRequest::video(720));
        assert_eq!(headers.filename, "My Clip - 720p.mp4");
        assert_eq!(headers.content_type, "video/mp4");
        assert!(headers.content_disposition.starts_with("attachment;"));
        assert!(headers.content_disposition.contains(".mp4"));
    }

    #[test]
    fn test_audio_filename() {
        let headers = frame("Song / Artist", &QualityRequest::audio(320));
        assert_eq!(headers.filename, "Song  Artist.mp3");
        assert_eq!(headers.content_type, "audio/mpeg");
        assert!(headers
            .content_disposition
            .ends_with("filename*=UTF-8''Song%20%20Artist.mp3"));
    }

    #[test]
    fn test_empty_title_falls_back() {
        assert_eq!(filename_for("東京", &QualityRequest::audio(192)), "audio.mp3");
        assert_eq!(filename_for("...", &QualityRequest::video(1080)), "video - 1080p.mp4");
    }

    #[test]
    fn test_disposition_has_no_quote_injection() {
        let headers = frame("a\"; filename=evil.exe", &QualityRequest::video(480));
        assert_eq!(headers.filename, "a filenameevil.exe - 480p.mp4");
        assert_eq!(headers.content_disposition.matches('"').count(), 2);
    }
}
