//! Display record from the public catalog API, independent of streaming.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub id: String,
    pub title: String,
    pub thumbnail: Option<String>,
    pub duration: String,
    pub uploader: String,
    pub view_count: u64,
    pub published_at: String,
    pub description: String,
}

impl VideoDetails {
    /// Reads one entry of a `videos?part=snippet,contentDetails,statistics` reply.
    pub fn from_api_item(item: &Value) -> Option<Self> {
        let snippet = item.get("snippet")?;
        let thumbnails = snippet.get("thumbnails");
        let thumbnail = ["maxres", "high", "medium"].iter().find_map(|size| {
            thumbnails
                .and_then(|t| t.get(*size))
                .and_then(|t| t.get("url"))
                .and_then(Value::as_str)
                .map(String::from)
        });
        let str_at = |value: Option<&Value>, key: &str| {
            value
                .and_then(|v| v.get(key))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Some(VideoDetails {
            id: item.get("id")?.as_str()?.to_string(),
            title: snippet.get("title")?.as_str()?.to_string(),
            thumbnail,
            duration: format_iso_duration(&str_at(item.get("contentDetails"), "duration")),
            uploader: str_at(Some(snippet), "channelTitle"),
            view_count: str_at(item.get("statistics"), "viewCount")
                .parse()
                .unwrap_or(0),
            published_at: str_at(Some(snippet), "publishedAt"),
            description: str_at(Some(snippet), "description"),
        })
    }
}

fn iso_duration() -> &'static Regex {
    static ISO: OnceLock<Regex> = OnceLock::new();
    ISO.get_or_init(|| {
        Regex::new(r"^P(?:(\d+)D)?T?(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("valid duration pattern")
    })
}

/// `PT1H2M3S` -> `1:02:03`, `PT4M5S` -> `4:05`. Unknown input gives `0:00`.
pub fn format_iso_duration(raw: &str) -> String {
    let Some(caps) = iso_duration().captures(raw.trim()) else {
        return "0:00".to_string();
    };
    let part = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    let total = part(1)
        .saturating_mul(86_400)
        .saturating_add(part(2).saturating_mul(3_600))
        .saturating_add(part(3).saturating_mul(60))
        .saturating_add(part(4));
    format_seconds(total)
}

pub fn format_seconds(total: u64) -> String {
    let hours = total / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_iso_durations() {
        assert_eq!(format_iso_duration("PT3M32S"), "3:32");
        assert_eq!(format_iso_duration("PT1H2M3S"), "1:02:03");
        assert_eq!(format_iso_duration("PT45S"), "0:45");
        assert_eq!(format_iso_duration("PT2H"), "2:00:00");
        assert_eq!(format_iso_duration("P1DT1M"), "24:01:00");
        assert_eq!(format_iso_duration("garbage"), "0:00");
        assert_eq!(format_iso_duration(""), "0:00");
    }

    #[test]
    fn test_oversized_duration_saturates() {
        assert_eq!(
            format_iso_duration("P99999999999999999DT1S"),
            "5124095576030431:00:15"
        );
    }

    #[test]
    fn test_from_api_item() {
        let item = json!({
            "id": "dQw4w9WgXcQ",
            "snippet": {
                "title": "Never Gonna Give You Up",
                "description": "The official video",
                "channelTitle": "Rick Astley",
                "publishedAt": "2009-10-25T06:57:33Z",
                "thumbnails": {
                    "medium": {"url": "https://i.ytimg.com/m.jpg"},
                    "high": {"url": "https://i.ytimg.com/h.jpg"}
                }
            },
            "contentDetails": {"duration": "PT3M33S"},
            "statistics": {"viewCount": "1400000000"}
        });
        let details = VideoDetails::from_api_item(&item).unwrap();
        assert_eq!(details.thumbnail.as_deref(), Some("https://i.ytimg.com/h.jpg"));
        assert_eq!(details.duration, "3:33");
        assert_eq!(details.view_count, 1_400_000_000);
        assert_eq!(details.uploader, "Rick Astley");
    }

    #[test]
    fn test_from_api_item_tolerates_missing_sections() {
        let item = json!({"id": "x", "snippet": {"title": "t"}});
        let details = VideoDetails::from_api_item(&item).unwrap();
        assert_eq!(details.thumbnail, None);
        assert_eq!(details.duration, "0:00");
        assert_eq!(details.view_count, 0);
        assert!(VideoDetails::from_api_item(&json!({"id": "x"})).is_none());
    }
}
