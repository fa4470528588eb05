//! Streaming coordinator.
//!
//! Sequences filter synthesis, catalog fetch and the streamed answer, pushing
//! [`StreamEvent`]s into an [`EventSink`]. A successful run emits one
//! `price_data`, zero or more `ai_response_chunk` and one
//! `ai_response_complete`; a failed run ends with one `error`. The sink is
//! closed after the terminal event either way.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::catalog::PriceFetcher;
use crate::error::{PriceAgentError, Result};
use crate::filter::FilterSynthesizer;
use crate::models::PriceRecord;
use crate::synth::AnswerSynthesizer;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    PriceData(PriceDataPayload),
    AiResponseChunk(ChunkPayload),
    AiResponseComplete(CompletePayload),
    Error(ErrorPayload),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceDataPayload {
    #[serde(rename = "Items")]
    pub items: Vec<PriceRecord>,
    pub filter: String,
    #[serde(rename = "totalCount")]
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChunkPayload {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletePayload {
    pub content: String,
    #[serde(rename = "Items")]
    pub items: Vec<PriceRecord>,
    pub filter: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorPayload {
    pub message: String,
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::AiResponseComplete(_) | Self::Error(_))
    }
}

/// Destination for coordinator events, independent of transport framing.
#[async_trait]
pub trait EventSink: Send {
    async fn emit(&mut self, event: StreamEvent) -> Result<()>;

    async fn close(&mut self);
}

/// Sink that forwards events over a bounded tokio channel.
pub struct ChannelSink {
    tx: Option<mpsc::Sender<StreamEvent>>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&mut self, event: StreamEvent) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| PriceAgentError::Internal("event sink already closed".to_string()))?;
        tx.send(event)
            .await
            .map_err(|_| PriceAgentError::Internal("event receiver dropped".to_string()))
    }

    async fn close(&mut self) {
        self.tx.take();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Start,
    FilterReady,
    DataReady,
    Streaming,
    Complete,
    Error,
}

#[derive(Clone)]
pub struct StreamCoordinator {
    filter: Arc<dyn FilterSynthesizer>,
    fetcher: Arc<PriceFetcher>,
    synth: Arc<dyn AnswerSynthesizer>,
}

impl StreamCoordinator {
    pub fn new(
        filter: Arc<dyn FilterSynthesizer>,
        fetcher: Arc<PriceFetcher>,
        synth: Arc<dyn AnswerSynthesizer>,
    ) -> Self {
        Self {
            filter,
            fetcher,
            synth,
        }
    }

    /// Runs one request to a terminal event and closes the sink. Returns the final state.
    pub async fn run<S>(&self, prompt: &str, sink: &mut S) -> StreamState
    where
        S: EventSink + ?Sized,
    {
        let mut state = StreamState::Start;
        if let Err(e) = self.drive(prompt, sink, &mut state).await {
            tracing::error!(?state, "Streaming request failed: {}", e);
            state = StreamState::Error;
            let event = StreamEvent::Error(ErrorPayload {
                message: e.to_string(),
            });
            if let Err(emit_err) = sink.emit(event).await {
                tracing::warn!("Could not deliver error event: {}", emit_err);
            }
        }
        sink.close().await;
        state
    }

    async fn drive<S>(&self, prompt: &str, sink: &mut S, state: &mut StreamState) -> Result<()>
    where
        S: EventSink + ?Sized,
    {
        let predicate = self.filter.synthesize(prompt).await?;
        *state = StreamState::FilterReady;

        let records = self.fetcher.fetch_all(&predicate).await?;
        sink.emit(StreamEvent::PriceData(PriceDataPayload {
            total_count: records.len(),
            items: records.clone(),
            filter: predicate.clone(),
        }))
        .await?;
        *state = StreamState::DataReady;

        let mut tokens = self.synth.synth_stream(prompt, &records).await?;
        *state = StreamState::Streaming;

        let mut answer = String::new();
        while let Some(token) = tokens.next().await {
            let token = token?;
            answer.push_str(&token);
            sink.emit(StreamEvent::AiResponseChunk(ChunkPayload { content: token }))
                .await?;
        }

        tracing::info!(
            chars = answer.len(),
            records = records.len(),
            "Streamed answer complete"
        );
        sink.emit(StreamEvent::AiResponseComplete(CompletePayload {
            content: answer,
            items: records,
            filter: predicate,
        }))
        .await?;
        *state = StreamState::Complete;
        Ok(())
    }
}
