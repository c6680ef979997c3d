//! Streaming process manager: one tool process per client response.

use bytes::Bytes;
use futures::StreamExt;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

use super::resolver::CatalogResolver;
use crate::config::RelayConfig;
use crate::domain::arguments::build_arguments;
use crate::domain::framing::{frame, FramedHeaders};
use crate::domain::{QualityRequest, RelayError, RelayResult, VideoId};
use crate::ports::sink::OutboundSink;
use crate::ports::tool::ToolRunner;

/// Largest chunk read from the pipe before it is handed to the sink.
const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Clone, Debug)]
pub struct StreamSettings {
    pub max_concurrent_streams: usize,
    pub admission_timeout: Duration,
    pub kill_grace: Duration,
    pub ffmpeg_location: Option<PathBuf>,
}

impl From<&RelayConfig> for StreamSettings {
    fn from(config: &RelayConfig) -> Self {
        Self {
            max_concurrent_streams: config.max_concurrent_streams,
            admission_timeout: config.admission_timeout,
            kill_grace: config.kill_grace,
            ffmpeg_location: config.tools.ffmpeg_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed { bytes_sent: u64 },
    /// The client left; the process has been terminated.
    Cancelled { bytes_sent: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Spawned,
    Streaming,
    Finished,
    Cancelled,
    Failed,
}

pub struct StreamService<T> {
    runner: Arc<T>,
    resolver: CatalogResolver<T>,
    gate: Arc<Semaphore>,
    settings: StreamSettings,
}

/// Runs `fut` unless the client goes away first.
async fn unless_closed<S, F>(sink: &S, fut: F) -> Option<F::Output>
where
    S: OutboundSink,
    F: Future,
{
    tokio::select! {
        out = fut => Some(out),
        _ = sink.closed() => None,
    }
}

impl<T: ToolRunner> StreamService<T> {
    pub fn new(runner: Arc<T>, settings: StreamSettings) -> Self {
        Self {
            resolver: CatalogResolver::new(runner.clone()),
            gate: Arc::new(Semaphore::new(settings.max_concurrent_streams.max(1))),
            runner,
            settings,
        }
    }

    /// Transcode slots currently free.
    pub fn available_slots(&self) -> usize {
        self.gate.available_permits()
    }

    async fn admit(&self) -> RelayResult<OwnedSemaphorePermit> {
        match tokio::time::timeout(
            self.settings.admission_timeout,
            self.gate.clone().acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) | Err(_) => Err(RelayError::Overloaded),
        }
    }

    /// Streams one download into `sink`.
    ///
    /// Errors returned before any header was committed leave the sink
    /// untouched, so the caller can still answer with a JSON error.
    pub async fn stream<S: OutboundSink>(
        &self,
        video: &VideoId,
        quality: QualityRequest,
        sink: S,
    ) -> RelayResult<StreamOutcome> {
        let not_started = StreamOutcome::Cancelled { bytes_sent: 0 };

        let Some(permit) = unless_closed(&sink, self.admit()).await else {
            return Ok(not_started);
        };
        let permit = permit.map_err(|e| {
            warn!(video = %video, "no transcode slot available");
            e
        })?;

        let Some(title) = unless_closed(&sink, self.resolver.resolve_title(video)).await else {
            return Ok(not_started);
        };
        let headers = frame(&title?, &quality);

        let args = build_arguments(video, &quality, self.settings.ffmpeg_location.as_deref());
        debug!(video = %video, args = ?args.as_slice(), "spawning tool");
        let child = self.runner.spawn_stream(args.as_slice()).map_err(|e| {
            error!(video = %video, error = %e, "failed to start tool");
            RelayError::transcode(format!("could not start the tool: {}", e))
        })?;

        let mut job = StreamJob::start(
            video.clone(),
            quality,
            child,
            sink,
            permit,
            self.settings.kill_grace,
        )?;
        let result = job.relay(headers).await;

        match &result {
            Ok(StreamOutcome::Completed { bytes_sent }) => {
                info!(video = %video, bytes_sent, "stream completed")
            }
            Ok(StreamOutcome::Cancelled { bytes_sent }) => {
                info!(video = %video, bytes_sent, "client went away, tool terminated")
            }
            Err(e) => error!(video = %video, state = ?job.state(), error = %e, "stream failed"),
        }
        result
    }
}

/// The live pairing of one tool process with one client response.
///
/// The process is never left running once the job is gone: every exit from
/// `relay` terminates and reaps it, and `Drop` kills whatever is left.
pub struct StreamJob<S> {
    video: VideoId,
    quality: QualityRequest,
    child: Option<Child>,
    stdout: Option<ReaderStream<ChildStdout>>,
    sink: S,
    state: JobState,
    bytes_sent: u64,
    kill_grace: Duration,
    _permit: OwnedSemaphorePermit,
}

enum Step {
    Chunk(Bytes),
    Eof,
    ReadFailed(io::Error),
    ClientGone,
}

impl<S: OutboundSink> StreamJob<S> {
    fn start(
        video: VideoId,
        quality: QualityRequest,
        mut child: Child,
        sink: S,
        permit: OwnedSemaphorePermit,
        kill_grace: Duration,
    ) -> RelayResult<Self> {
        let Some(stdout) = child.stdout.take() else {
            let _ = child.start_kill();
            return Err(RelayError::transcode("tool stdout is not piped"));
        };
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_diagnostics(video.clone(), stderr));
        }

        Ok(Self {
            video,
            quality,
            child: Some(child),
            stdout: Some(ReaderStream::with_capacity(stdout, CHUNK_SIZE)),
            sink,
            state: JobState::Spawned,
            bytes_sent: 0,
            kill_grace,
            _permit: permit,
        })
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Forwards stdout to the sink until EOF, failure or cancellation.
    ///
    /// Headers go out with the first chunk, so a tool that dies before
    /// writing anything still yields a reportable `TranscodeFailed`.
    async fn relay(&mut self, headers: FramedHeaders) -> RelayResult<StreamOutcome> {
        let mut headers = Some(headers);

        loop {
            let step = match self.stdout.as_mut() {
                None => Step::Eof,
                Some(stdout) => tokio::select! {
                    chunk = stdout.next() => match chunk {
                        Some(Ok(chunk)) => Step::Chunk(chunk),
                        Some(Err(e)) => Step::ReadFailed(e),
                        None => Step::Eof,
                    },
                    _ = self.sink.closed() => Step::ClientGone,
                },
            };

            match step {
                Step::Chunk(chunk) => {
                    if let Some(headers) = headers.take() {
                        debug!(video = %self.video, filename = %headers.filename, "committing headers");
                        if self.sink.commit(headers).is_err() {
                            return Ok(self.cancel().await);
                        }
                        self.state = JobState::Streaming;
                    }
                    let len = chunk.len() as u64;
                    if self.sink.write(chunk).await.is_err() {
                        return Ok(self.cancel().await);
                    }
                    self.bytes_sent += len;
                }
                Step::ReadFailed(e) => {
                    let committed = headers.is_none();
                    return self
                        .fail(committed, format!("reading tool output: {}", e))
                        .await;
                }
                Step::ClientGone => return Ok(self.cancel().await),
                Step::Eof => break,
            }
        }
        self.stdout = None;

        let exit = match self.child.as_mut() {
            None => return Err(RelayError::transcode("tool process already released")),
            Some(child) => tokio::select! {
                status = child.wait() => Some(status),
                _ = self.sink.closed() => None,
            },
        };
        let Some(status) = exit else {
            return Ok(self.cancel().await);
        };
        // reaped
        self.child = None;

        let committed = headers.is_none();
        match status {
            Ok(status) if status.success() => {
                if let Some(headers) = headers.take() {
                    // clean exit without output still gets a framed, empty body
                    if self.sink.commit(headers).is_err() {
                        self.state = JobState::Cancelled;
                        return Ok(StreamOutcome::Cancelled { bytes_sent: 0 });
                    }
                }
                self.state = JobState::Finished;
                debug!(video = %self.video, quality = ?self.quality, "tool exited cleanly");
                Ok(StreamOutcome::Completed {
                    bytes_sent: self.bytes_sent,
                })
            }
            Ok(status) => self.fail(committed, format!("tool exited with {}", status)).await,
            Err(e) => self.fail(committed, format!("waiting for tool: {}", e)).await,
        }
    }

    async fn fail(&mut self, committed: bool, message: String) -> RelayResult<StreamOutcome> {
        self.state = JobState::Failed;
        self.terminate().await;
        if committed {
            // headers are out, the only signal left is a truncated body
            self.sink.abort(message.clone()).await;
            Err(RelayError::StreamInterrupted {
                message,
                bytes_sent: self.bytes_sent,
            })
        } else {
            Err(RelayError::transcode(message))
        }
    }

    async fn cancel(&mut self) -> StreamOutcome {
        self.state = JobState::Cancelled;
        self.terminate().await;
        StreamOutcome::Cancelled {
            bytes_sent: self.bytes_sent,
        }
    }

    /// Closes our end of the pipe and sends SIGTERM to the tool's process
    /// group, then kills the group if the tool outlives the grace period.
    async fn terminate(&mut self) {
        self.stdout = None;
        let Some(mut child) = self.child.take() else {
            return;
        };
        let pid = child.id();
        if let Some(pid) = pid {
            signal_group(pid, GroupSignal::Terminate);
        }
        match tokio::time::timeout(self.kill_grace, child.wait()).await {
            Ok(Ok(status)) => debug!(video = %self.video, %status, "tool exited after SIGTERM"),
            Ok(Err(e)) => warn!(video = %self.video, error = %e, "could not wait for tool"),
            Err(_) => {
                debug!(video = %self.video, "grace period elapsed, killing tool");
                if let Some(pid) = pid {
                    signal_group(pid, GroupSignal::Kill);
                }
                if let Err(e) = child.kill().await {
                    warn!(video = %self.video, error = %e, "failed to kill tool");
                }
            }
        }
        if let Some(pid) = pid {
            // helpers that ignored SIGTERM outlive the leader
            signal_group(pid, GroupSignal::Kill);
        }
    }
}

impl<S> Drop for StreamJob<S> {
    fn drop(&mut self) {
        if let Some(child) = self.child.as_mut() {
            // relay future dropped mid-flight, e.g. on shutdown
            if let Some(pid) = child.id() {
                signal_group(pid, GroupSignal::Kill);
            }
            let _ = child.start_kill();
            warn!(video = %self.video, "stream job dropped with tool running, killed");
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum GroupSignal {
    Terminate,
    Kill,
}

/// Signals every process in the group led by `pid`.
#[cfg(unix)]
fn signal_group(pid: u32, signal: GroupSignal) {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    let signal = match signal {
        GroupSignal::Terminate => Signal::SIGTERM,
        GroupSignal::Kill => Signal::SIGKILL,
    };
    match killpg(Pid::from_raw(raw), signal) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(pid, ?signal, error = %e, "failed to signal tool process group"),
    }
}

#[cfg(not(unix))]
fn signal_group(_pid: u32, _signal: GroupSignal) {}

/// Tool diagnostics go to the log only.
async fn log_diagnostics(video: VideoId, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.starts_with("ERROR") {
            warn!(video = %video, "yt-dlp: {}", line);
        } else {
            debug!(video = %video, "yt-dlp: {}", line);
        }
    }
}
