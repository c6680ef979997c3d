//! `OutboundSink` that feeds an axum streaming body.
//!
//! The streaming job runs on its own task. Headers travel over a oneshot so
//! the handler can build the response only once they are committed; body
//! chunks travel over a small bounded channel, which is what carries the
//! client's back-pressure down to the tool's pipe.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use std::io;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::application::streamer::StreamOutcome;
use crate::domain::framing::FramedHeaders;
use crate::domain::{RelayError, RelayResult};
use crate::ports::sink::OutboundSink;

/// Chunks buffered between the job and hyper.
const BODY_QUEUE: usize = 4;

type BodyItem = io::Result<Bytes>;

pub struct ChannelSink {
    head: Option<oneshot::Sender<FramedHeaders>>,
    body: mpsc::Sender<BodyItem>,
}

/// Handler side of a `ChannelSink`.
pub struct PendingResponse {
    head: oneshot::Receiver<FramedHeaders>,
    body: mpsc::Receiver<BodyItem>,
}

pub fn channel() -> (ChannelSink, PendingResponse) {
    let (head_tx, head_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(BODY_QUEUE);
    (
        ChannelSink {
            head: Some(head_tx),
            body: body_tx,
        },
        PendingResponse {
            head: head_rx,
            body: body_rx,
        },
    )
}

fn gone() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "client disconnected")
}

#[async_trait]
impl OutboundSink for ChannelSink {
    fn commit(&mut self, headers: FramedHeaders) -> io::Result<()> {
        let head = self.head.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::Other, "headers already committed")
        })?;
        head.send(headers).map_err(|_| gone())
    }

    async fn write(&mut self, chunk: Bytes) -> io::Result<()> {
        if self.head.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "payload written before headers",
            ));
        }
        self.body.send(Ok(chunk)).await.map_err(|_| gone())
    }

    async fn closed(&self) {
        self.body.closed().await
    }

    async fn abort(&mut self, reason: String) {
        let _ = self
            .body
            .send(Err(io::Error::new(io::ErrorKind::Other, reason)))
            .await;
    }
}

fn header_value(value: &str) -> RelayResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| RelayError::transcode(format!("invalid header value: {}", e)))
}

impl PendingResponse {
    /// Waits for the job to either commit headers or fail.
    ///
    /// Dropping this (the client left before headers) closes the body
    /// channel, which the job observes as cancellation.
    pub async fn resolve(
        self,
        job: JoinHandle<RelayResult<StreamOutcome>>,
    ) -> RelayResult<Response> {
        let PendingResponse { head, body } = self;
        match head.await {
            Ok(headers) => streaming_response(headers, body),
            Err(_) => match job.await {
                Ok(Err(e)) => Err(e),
                Ok(Ok(_)) => Err(RelayError::transcode("stream ended before it started")),
                Err(e) => Err(RelayError::transcode(format!("stream task failed: {}", e))),
            },
        }
    }
}

fn streaming_response(
    headers: FramedHeaders,
    body: mpsc::Receiver<BodyItem>,
) -> RelayResult<Response> {
    let stream = futures::stream::unfold(body, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    });

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = StatusCode::OK;
    let map = response.headers_mut();
    map.insert(header::CONTENT_TYPE, HeaderValue::from_static(headers.content_type));
    map.insert(
        header::CONTENT_DISPOSITION,
        header_value(&headers.content_disposition)?,
    );
    map.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    map.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    Ok(response)
}
