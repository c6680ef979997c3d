//! Real `ToolRunner` backed by the yt-dlp binary.

use async_trait::async_trait;
use std::io;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::config::ToolLocator;
use crate::ports::tool::ToolRunner;

#[derive(Clone, Debug)]
pub struct YtDlpRunner {
    locator: ToolLocator,
    query_timeout: Duration,
}

impl YtDlpRunner {
    pub fn new(locator: ToolLocator, query_timeout: Duration) -> Self {
        Self {
            locator,
            query_timeout,
        }
    }

    pub fn locator(&self) -> &ToolLocator {
        &self.locator
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.locator.tool_path);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    /// Runs to completion; past the timeout the child is killed with the future.
    async fn run_query(&self, mut command: Command) -> io::Result<Output> {
        match tokio::time::timeout(self.query_timeout, command.output()).await {
            Ok(output) => output,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("query timed out after {}s", self.query_timeout.as_secs()),
            )),
        }
    }
}

#[async_trait]
impl ToolRunner for YtDlpRunner {
    async fn dump_metadata(&self, url: &str) -> io::Result<Output> {
        let mut command = self.command();
        command.arg("-j").arg("--no-playlist").arg(url);
        debug!(url, "dumping metadata");
        self.run_query(command).await
    }

    async fn query_title(&self, url: &str) -> io::Result<Output> {
        let mut command = self.command();
        command
            .arg("--get-filename")
            .arg("-o")
            .arg("%(title)s")
            .arg("--no-playlist")
            .arg(url);
        debug!(url, "querying title");
        self.run_query(command).await
    }

    fn spawn_stream(&self, args: &[String]) -> io::Result<Child> {
        let mut command = self.command();
        command.args(args);
        // leader of its own group, so ffmpeg children can be signalled with it
        #[cfg(unix)]
        command.process_group(0);
        command.spawn()
    }
}
