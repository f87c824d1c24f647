//! Streaming reader: incremental consumption of a backend response stream

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::types::{ContentBlock, InboundResponse, ResponseStatus, UsageCounters};

/// One raw frame from the streaming transport: the payload of a single SSE
/// `data:` message. Framing below this point is backend-defined and opaque
/// to everything above the reader.
pub type TransportStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Receives human-visible text deltas in wire arrival order. Each delta is
/// delivered at most once, before the reader consumes the next frame.
#[async_trait]
pub trait ChunkSink: Send {
    async fn emit(&mut self, delta: &str);
}

/// Incremental fields carried by a single decoded frame. Every field is
/// optional; a frame carries whatever subset the backend chose to send.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ResponseStatus>,
    /// Human-visible text fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageCounters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
}

/// Reader lifecycle: `Idle -> Receiving -> {Complete, Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Idle,
    Receiving,
    Complete,
    Failed,
}

/// Folds stream chunks into one complete response once the stream ends
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    id: Option<String>,
    status: Option<ResponseStatus>,
    text: String,
    usage: UsageCounters,
    previous_response_id: Option<String>,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one chunk's incremental fields: text fragments append, scalar
    /// fields take the latest value seen.
    pub fn fold(&mut self, chunk: &StreamChunk) {
        if let Some(ref id) = chunk.id {
            self.id = Some(id.clone());
        }
        if let Some(status) = chunk.status {
            self.status = Some(status);
        }
        if let Some(ref delta) = chunk.delta {
            self.text.push_str(delta);
        }
        if let Some(ref usage) = chunk.usage {
            self.usage = usage.clone();
        }
        if let Some(ref previous) = chunk.previous_response_id {
            self.previous_response_id = Some(previous.clone());
        }
    }

    /// Assemble the final response. A stream that ended without ever
    /// carrying a response id cannot yield a continuation handle, which is
    /// a backend contract violation.
    pub fn finish(self) -> Result<InboundResponse> {
        let id = self.id.ok_or_else(|| {
            Error::MalformedResponse("stream ended without a response id".to_string())
        })?;
        let content = if self.text.is_empty() {
            vec![]
        } else {
            vec![ContentBlock::output_text(self.text)]
        };
        Ok(InboundResponse {
            id,
            status: self.status.unwrap_or(ResponseStatus::Completed),
            content,
            usage: self.usage,
            previous_response_id: self.previous_response_id,
        })
    }
}

/// State machine over an open response stream. Reads the transport
/// incrementally and never buffers the whole body before emitting.
pub struct StreamReader {
    state: ReaderState,
}

impl StreamReader {
    pub fn new() -> Self {
        Self {
            state: ReaderState::Idle,
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Drain `transport` to completion, delivering each text delta to
    /// `sink` before the next frame is read. Delivery order is exactly wire
    /// arrival order; the reader does not read ahead of the sink. With no
    /// sink, state still accumulates but nothing is emitted.
    ///
    /// Any decode failure fails the call with `StreamCorrupted`; transport
    /// errors propagate typed. Either way the partial response is
    /// discarded. Cancellation stops consumption, suppresses further sink
    /// calls, and fails with `Cancelled`; no response is produced.
    pub async fn read_to_end(
        &mut self,
        mut transport: TransportStream,
        mut sink: Option<&mut dyn ChunkSink>,
        cancel: &CancellationToken,
    ) -> Result<InboundResponse> {
        self.state = ReaderState::Receiving;
        let mut builder = ResponseBuilder::new();

        loop {
            let frame = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.state = ReaderState::Failed;
                    return Err(Error::Cancelled);
                }
                frame = transport.next() => frame,
            };

            let Some(frame) = frame else { break };

            let payload = match frame {
                Ok(payload) => payload,
                Err(e) => {
                    self.state = ReaderState::Failed;
                    return Err(e);
                }
            };

            let chunk: StreamChunk = match serde_json::from_str(&payload) {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.state = ReaderState::Failed;
                    return Err(Error::StreamCorrupted(format!("undecodable chunk: {e}")));
                }
            };

            builder.fold(&chunk);

            if let Some(delta) = chunk.delta.as_deref() {
                if !delta.is_empty() {
                    if let Some(sink) = sink.as_mut() {
                        sink.emit(delta).await;
                    }
                }
            }
        }

        match builder.finish() {
            Ok(response) => {
                self.state = ReaderState::Complete;
                Ok(response)
            }
            Err(e) => {
                self.state = ReaderState::Failed;
                Err(e)
            }
        }
    }
}

impl Default for StreamReader {
    fn default() -> Self {
        Self::new()
    }
}
