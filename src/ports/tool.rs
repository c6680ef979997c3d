use async_trait::async_trait;
use std::io;
use std::process::Output;
use tokio::process::Child;

/// Invocations of the external extraction tool.
///
/// The two queries run to completion: the child has exited by the time they
/// return. `spawn_stream` hands back a live child whose stdout and stderr
/// are both piped.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Structured metadata dump (`-j`) for `url`.
    async fn dump_metadata(&self, url: &str) -> io::Result<Output>;

    /// Title only, one line on stdout.
    async fn query_title(&self, url: &str) -> io::Result<Output>;

    /// Starts a streaming run with the given argument vector.
    ///
    /// On unix the child leads its own process group, so signalling the
    /// group reaches any helper processes it forks.
    fn spawn_stream(&self, args: &[String]) -> io::Result<Child>;
}
