use async_trait::async_trait;

use crate::domain::details::VideoDetails;
use crate::domain::{RelayResult, VideoId};

/// Read-only lookup against the public video catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoDetailsSource: Send + Sync {
    async fn video_details(&self, video: &VideoId) -> RelayResult<VideoDetails>;
}
