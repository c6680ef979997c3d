use async_trait::async_trait;
use bytes::Bytes;
use std::io;

use crate::domain::framing::FramedHeaders;

/// Write side of one client response.
///
/// `commit` applies the headers and must come before the first `write`.
/// Dropping the sink ends the body cleanly; `abort` ends it with an error so
/// the client sees a truncated transfer.
#[async_trait]
pub trait OutboundSink: Send + Sync {
    fn commit(&mut self, headers: FramedHeaders) -> io::Result<()>;

    /// Resolves once the chunk has been accepted; waits while the client is slow.
    async fn write(&mut self, chunk: Bytes) -> io::Result<()>;

    /// Resolves once the client has gone away.
    async fn closed(&self);

    async fn abort(&mut self, reason: String);
}
