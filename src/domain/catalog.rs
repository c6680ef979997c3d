//! Normalized view of what the tool reports for one video.

use serde::Serialize;
use serde_json::Value;

/// How many distinct heights the resolution picker shows.
pub const RESOLUTION_VIEW_LIMIT: usize = 6;

pub trait FromDump {
    fn from_dump(data: &Value) -> Option<Self>
    where
        Self: Sized;
}

/// One encoded stream. `height` is `None` for audio-only entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatEntry {
    pub format_id: String,
    pub container: String,
    pub height: Option<u32>,
    pub bitrate_kbps: Option<u32>,
    pub approx_size_bytes: Option<u64>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
}

impl FormatEntry {
    pub fn is_audio_only(&self) -> bool {
        self.height.is_none()
    }
}

/// `"none"` is how the tool spells an absent codec.
fn codec(data: &Value, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty() && *c != "none")
        .map(String::from)
}

fn bitrate(data: &Value) -> Option<u32> {
    ["tbr", "abr", "vbr"]
        .iter()
        .filter_map(|key| data.get(*key).and_then(Value::as_f64))
        .find(|kbps| *kbps > 0.0)
        .map(|kbps| kbps.round() as u32)
}

impl FromDump for FormatEntry {
    fn from_dump(data: &Value) -> Option<Self> {
        let format_id = data.get("format_id")?.as_str()?.to_string();
        let vcodec = codec(data, "vcodec");
        let acodec = codec(data, "acodec");
        let height = data
            .get("height")
            .and_then(Value::as_u64)
            .filter(|h| *h > 0)
            .map(|h| h as u32);

        // a missing vcodec key is unknown, an explicit "none" is audio or a storyboard
        let video_ruled_out = data.get("vcodec").and_then(Value::as_str) == Some("none");

        // storyboards and other entries without a usable stream are dropped
        let height = match (height, &vcodec, &acodec) {
            (Some(h), Some(_), _) => Some(h),
            (Some(h), None, _) if !video_ruled_out => Some(h),
            (_, None, Some(_)) => None,
            _ => return None,
        };

        Some(FormatEntry {
            format_id,
            container: data
                .get("ext")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
            height,
            bitrate_kbps: bitrate(data),
            approx_size_bytes: data
                .get("filesize")
                .and_then(Value::as_u64)
                .or_else(|| data.get("filesize_approx").and_then(Value::as_u64)),
            vcodec,
            acodec,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnail {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl FromDump for Thumbnail {
    fn from_dump(data: &Value) -> Option<Self> {
        Some(Thumbnail {
            url: data.get("url")?.as_str()?.to_string(),
            width: data.get("width").and_then(Value::as_u64).map(|w| w as u32),
            height: data.get("height").and_then(Value::as_u64).map(|h| h as u32),
        })
    }
}

/// Entry of the resolution picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionOption {
    pub height: u32,
    pub label: String,
    pub available: bool,
}

/// Sorted catalog: video entries by descending height, then audio-only
/// entries by descending bitrate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<FormatEntry>,
}

impl Catalog {
    pub fn new(mut entries: Vec<FormatEntry>) -> Self {
        entries.sort_by(|a, b| match (a.height, b.height) {
            (Some(ha), Some(hb)) => hb.cmp(&ha),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => b.bitrate_kbps.cmp(&a.bitrate_kbps),
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[FormatEntry] {
        &self.entries
    }

    pub fn video(&self) -> impl Iterator<Item = &FormatEntry> {
        self.entries.iter().filter(|e| !e.is_audio_only())
    }

    pub fn audio(&self) -> impl Iterator<Item = &FormatEntry> {
        self.entries.iter().filter(|e| e.is_audio_only())
    }

    /// Distinct heights, highest first, truncated to `limit`.
    pub fn recent_resolutions(&self, limit: usize) -> Vec<u32> {
        let mut heights: Vec<u32> = self.video().filter_map(|e| e.height).collect();
        // already sorted descending, so duplicates are adjacent
        heights.dedup();
        heights.truncate(limit);
        heights
    }

    pub fn resolution_options(&self) -> Vec<ResolutionOption> {
        self.recent_resolutions(RESOLUTION_VIEW_LIMIT)
            .into_iter()
            .map(|height| ResolutionOption {
                height,
                label: format!("{}p", height),
                available: true,
            })
            .collect()
    }
}

/// Everything `/api/formats` reports about one video.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub title: String,
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub uploader: Option<String>,
    pub view_count: Option<u64>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub thumbnails: Vec<Thumbnail>,
    pub video_formats: Vec<ResolutionOption>,
    pub catalog: Catalog,
}

fn text(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(String::from)
}

impl FromDump for VideoInfo {
    /// Needs at least a title and a `formats` array.
    fn from_dump(data: &Value) -> Option<Self> {
        let title = text(data, "title")?;
        let catalog = Catalog::new(
            data.get("formats")?
                .as_array()?
                .iter()
                .filter_map(FormatEntry::from_dump)
                .collect(),
        );

        Some(VideoInfo {
            title,
            duration: data.get("duration").and_then(Value::as_f64),
            thumbnail: text(data, "thumbnail"),
            uploader: text(data, "uploader"),
            view_count: data.get("view_count").and_then(Value::as_u64),
            description: text(data, "description"),
            tags: data
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(Value::as_str)
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            thumbnails: data
                .get("thumbnails")
                .and_then(Value::as_array)
                .map(|thumbs| thumbs.iter().filter_map(Thumbnail::from_dump).collect())
                .unwrap_or_default(),
            video_formats: catalog.resolution_options(),
            catalog,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dump() -> Value {
        json!({
            "title": "Test Video",
            "duration": 212.0,
            "thumbnail": "https://i.ytimg.com/vi/abc123def45/maxresdefault.jpg",
            "uploader": "Someone",
            "view_count": 1400,
            "description": "desc",
            "tags": ["music", "test"],
            "thumbnails": [
                {"url": "https://i.ytimg.com/a.jpg", "width": 120, "height": 90},
                {"url": "https://i.ytimg.com/b.jpg"},
                {"width": 10}
            ],
            "formats": [
                {"format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none", "height": 45},
                {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "abr": 129.5, "filesize": 3400000},
                {"format_id": "251", "ext": "webm", "vcodec": "none", "acodec": "opus", "abr": 160.1},
                {"format_id": "134", "ext": "mp4", "vcodec": "avc1.4d401e", "acodec": "none", "height": 360, "tbr": 300.0},
                {"format_id": "137", "ext": "mp4", "vcodec": "avc1.640028", "acodec": "none", "height": 1080, "filesize_approx": 90000000},
                {"format_id": "248", "ext": "webm", "vcodec": "vp9", "acodec": "none", "height": 1080},
                {"format_id": "22", "ext": "mp4", "vcodec": "avc1.64001F", "acodec": "mp4a.40.2", "height": 720},
                {"format_id": "136", "ext": "mp4", "vcodec": "avc1.4d401f", "acodec": "none", "height": 720},
                {"format_id": "135", "ext": "mp4", "vcodec": "avc1.4d401f", "acodec": "none", "height": 480},
                {"ext": "mp4", "vcodec": "avc1", "height": 240}
            ]
        })
    }

    #[test]
    fn test_from_dump_full_record() {
        let info = VideoInfo::from_dump(&dump()).unwrap();
        assert_eq!(info.title, "Test Video");
        assert_eq!(info.duration, Some(212.0));
        assert_eq!(info.uploader.as_deref(), Some("Someone"));
        assert_eq!(info.view_count, Some(1400));
        assert_eq!(info.tags, vec!["music", "test"]);
        assert_eq!(info.thumbnails.len(), 2);
        assert_eq!(info.thumbnails[1].width, None);
    }

    #[test]
    fn test_storyboards_and_unidentified_entries_dropped() {
        let info = VideoInfo::from_dump(&dump()).unwrap();
        let ids: Vec<&str> = info
            .catalog
            .entries()
            .iter()
            .map(|e| e.format_id.as_str())
            .collect();
        assert!(!ids.contains(&"sb0"));
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn test_entry_with_height_but_no_codec_keys_is_video() {
        let entry = FormatEntry::from_dump(&json!({"format_id": "18", "ext": "mp4", "height": 360}))
            .unwrap();
        assert_eq!(entry.height, Some(360));
        assert_eq!(entry.vcodec, None);

        let storyboard = json!({"format_id": "sb1", "vcodec": "none", "acodec": "none", "height": 90});
        assert!(FormatEntry::from_dump(&storyboard).is_none());
        assert!(FormatEntry::from_dump(&json!({"format_id": "x", "ext": "mp4"})).is_none());
    }

    #[test]
    fn test_video_entries_sorted_descending_then_audio() {
        let info = VideoInfo::from_dump(&dump()).unwrap();
        let heights: Vec<Option<u32>> = info.catalog.entries().iter().map(|e| e.height).collect();
        assert_eq!(
            heights,
            vec![Some(1080), Some(1080), Some(720), Some(720), Some(480), Some(360), None, None]
        );
        let audio: Vec<&str> = info.catalog.audio().map(|e| e.format_id.as_str()).collect();
        assert_eq!(audio, vec!["251", "140"]);
    }

    #[test]
    fn test_recent_resolutions_unique_and_truncated() {
        let info = VideoInfo::from_dump(&dump()).unwrap();
        assert_eq!(info.catalog.recent_resolutions(6), vec![1080, 720, 480, 360]);
        assert_eq!(info.catalog.recent_resolutions(2), vec![1080, 720]);
        assert_eq!(info.video_formats[0].label, "1080p");
        assert!(info.video_formats.iter().all(|o| o.available));
    }

    #[test]
    fn test_size_and_bitrate_fallbacks() {
        let info = VideoInfo::from_dump(&dump()).unwrap();
        let find = |id: &str| {
            info.catalog
                .entries()
                .iter()
                .find(|e| e.format_id == id)
                .cloned()
                .unwrap()
        };
        assert_eq!(find("137").approx_size_bytes, Some(90_000_000));
        assert_eq!(find("140").approx_size_bytes, Some(3_400_000));
        assert_eq!(find("140").bitrate_kbps, Some(130));
        assert_eq!(find("134").bitrate_kbps, Some(300));
        assert_eq!(find("134").acodec, None);
    }

    #[test]
    fn test_from_dump_requires_title_and_formats() {
        assert!(VideoInfo::from_dump(&json!({"formats": []})).is_none());
        assert!(VideoInfo::from_dump(&json!({"title": "x"})).is_none());
        let empty = VideoInfo::from_dump(&json!({"title": "x", "formats": []})).unwrap();
        assert!(empty.catalog.entries().is_empty());
        assert!(empty.tags.is_empty());
    }

    #[test]
    fn test_serialized_field_names() {
        let info = VideoInfo::from_dump(&dump()).unwrap();
        let value = serde_json::to_value(&info).unwrap();
        assert!(value.get("viewCount").is_some());
        assert!(value.get("videoFormats").is_some());
        assert_eq!(value["catalog"][0]["formatId"], "137");
        assert!(value["catalog"][0].get("approxSizeBytes").is_some());
    }
}
