//! `VideoDetailsSource` backed by the YouTube Data API v3.

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::domain::details::VideoDetails;
use crate::domain::{RelayError, RelayResult, VideoId};
use crate::ports::details::VideoDetailsSource;

const API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Clone, Debug)]
pub struct YouTubeDataApi {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeDataApi {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: API_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl VideoDetailsSource for YouTubeDataApi {
    async fn video_details(&self, video: &VideoId) -> RelayResult<VideoDetails> {
        let response = self
            .client
            .get(format!("{}/videos", self.base_url))
            .query(&[
                ("part", "snippet,contentDetails,statistics"),
                ("id", video.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RelayError::metadata(format!("catalog API unreachable: {}", e)))?;

        if !response.status().is_success() {
            warn!(video = %video, status = %response.status(), "catalog API error");
            return Err(RelayError::metadata(format!(
                "catalog API returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RelayError::metadata(format!("catalog API sent bad JSON: {}", e)))?;

        body.get("items")
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .and_then(VideoDetails::from_api_item)
            .ok_or_else(|| RelayError::metadata(format!("no catalog entry for {}", video)))
    }
}
