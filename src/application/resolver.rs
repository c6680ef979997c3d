use std::process::Output;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::catalog::{FromDump, VideoInfo};
use crate::domain::{RelayError, RelayResult, VideoId};
use crate::ports::tool::ToolRunner;

/// Asks the tool what a video is made of. Both lookups block until the
/// child process has exited.
pub struct CatalogResolver<T> {
    runner: Arc<T>,
}

impl<T> Clone for CatalogResolver<T> {
    fn clone(&self) -> Self {
        Self {
            runner: self.runner.clone(),
        }
    }
}

/// Last non-empty stderr line, which is where the tool puts its verdict.
fn stderr_tail(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("no diagnostics")
        .to_string()
}

impl<T: ToolRunner> CatalogResolver<T> {
    pub fn new(runner: Arc<T>) -> Self {
        Self { runner }
    }

    fn checked(&self, video: &VideoId, output: std::io::Result<Output>) -> RelayResult<Output> {
        let output = output.map_err(|e| {
            warn!(video = %video, error = %e, "metadata query failed to run");
            RelayError::metadata(e.to_string())
        })?;
        if !output.status.success() {
            let tail = stderr_tail(&output);
            warn!(video = %video, status = %output.status, %tail, "metadata query failed");
            return Err(RelayError::metadata(tail));
        }
        Ok(output)
    }

    pub async fn resolve_catalog(&self, video: &VideoId) -> RelayResult<VideoInfo> {
        let output = self.runner.dump_metadata(&video.watch_url()).await;
        let output = self.checked(video, output)?;

        let dump: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            warn!(video = %video, error = %e, "metadata dump is not JSON");
            RelayError::metadata(format!("unparsable metadata: {}", e))
        })?;

        let info = VideoInfo::from_dump(&dump)
            .ok_or_else(|| RelayError::metadata("metadata dump lacks title or formats"))?;
        debug!(
            video = %video,
            entries = info.catalog.entries().len(),
            "catalog resolved"
        );
        Ok(info)
    }

    /// Cheaper lookup used to name the download.
    pub async fn resolve_title(&self, video: &VideoId) -> RelayResult<String> {
        let output = self.runner.query_title(&video.watch_url()).await;
        let output = self.checked(video, output)?;

        let title = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        if title.is_empty() {
            return Err(RelayError::metadata("tool returned an empty title"));
        }
        Ok(title)
    }
}
