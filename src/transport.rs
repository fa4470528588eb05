use async_trait::async_trait;
use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use std::time::Duration;

use crate::config::LlmBackendConfig;
use crate::error::{PriceAgentError, Result};
use crate::models::{ChatChunk, ChatRequest, ChatResponse};

/// Sentinel payload that ends a streamed completion.
const DONE: &str = "[DONE]";

/// Incremental answer tokens from a streamed chat completion.
pub type TokenStream = BoxStream<'static, Result<String>>;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse>;

    /// Opens the completion in streaming mode. The request's `stream` flag is forced on.
    async fn chat_stream(&self, req: &ChatRequest) -> Result<TokenStream>;
}

/// Client for an OpenAI-compatible chat completion endpoint.
pub struct OpenAiTransport {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: Option<String>,
}

impl OpenAiTransport {
    pub fn new(backend: &LlmBackendConfig, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", backend.base_url.trim_end_matches('/')),
            api_key: backend.api_key.clone(),
            api_version: backend.api_version.clone(),
        })
    }

    async fn send(&self, req: &ChatRequest) -> Result<reqwest::Response> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(req);
        if let Some(version) = &self.api_version {
            builder = builder.query(&[("api-version", version.as_str())]);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(PriceAgentError::Internal(format!(
            "Chat completion API returned {status}: {body}"
        )))
    }
}

#[async_trait]
impl Transport for OpenAiTransport {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let response = self.send(req).await?;
        response.json().await.map_err(|e| {
            PriceAgentError::Internal(format!("Failed to parse chat completion response: {e}"))
        })
    }

    async fn chat_stream(&self, req: &ChatRequest) -> Result<TokenStream> {
        let mut req = req.clone();
        req.stream = true;
        let response = self.send(&req).await?;

        let payloads = response
            .bytes_stream()
            .map(Some)
            .chain(stream::once(async { None }))
            .scan(SseDecoder::default(), |decoder, chunk| {
                let items: Vec<Result<String>> = match chunk {
                    Some(Ok(bytes)) => decoder.push(&bytes).into_iter().map(Ok).collect(),
                    Some(Err(e)) => vec![Err(PriceAgentError::Http(e))],
                    None => decoder.finish().into_iter().map(Ok).collect(),
                };
                future::ready(Some(stream::iter(items)))
            })
            .flatten();

        let tokens = payloads
            .take_while(|payload| future::ready(!matches!(payload, Ok(p) if p.as_str() == DONE)))
            .filter_map(|payload| {
                future::ready(payload.and_then(|p| parse_stream_payload(&p)).transpose())
            })
            .boxed();
        Ok(tokens)
    }
}

/// Splits a server-sent event byte stream into `data:` payloads.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feeds raw bytes and returns every complete `data:` payload seen so far.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            payloads.extend(data_payload(&line));
        }
        payloads
    }

    /// Flushes a trailing line left unterminated when the body ends.
    pub fn finish(&mut self) -> Vec<String> {
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line).into_iter().collect()
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\r', '\n']);
    line.strip_prefix("data:")
        .map(|data| data.trim_start().to_string())
}

/// Extracts the content token from one streamed payload. `[DONE]` and empty deltas yield `None`;
/// an in-band `error` object fails the stream.
pub fn parse_stream_payload(payload: &str) -> Result<Option<String>> {
    if payload.is_empty() || payload == DONE {
        return Ok(None);
    }
    let chunk: ChatChunk = serde_json::from_str(payload).map_err(|e| {
        PriceAgentError::Internal(format!("Failed to parse streamed chunk: {e}. Raw: {payload}"))
    })?;
    if let Some(error) = chunk.error {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(PriceAgentError::AnswerSynthesis(format!(
            "Chat completion stream failed: {message}"
        )));
    }
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|content| !content.is_empty()))
}
