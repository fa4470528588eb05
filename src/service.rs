use std::sync::Arc;

use crate::catalog::{HttpCatalog, PriceFetcher};
use crate::config::Config;
use crate::error::{PriceAgentError, Result};
use crate::filter::{FilterSynthesizer, LlmFilter};
use crate::models::PriceQueryResult;
use crate::reference::ReferenceData;
use crate::stream::{EventSink, StreamCoordinator, StreamState};
use crate::synth::{AnswerSynthesizer, LlmSynth};
use crate::transport::{OpenAiTransport, Transport};

/// Answer substituted when the grounded answer call fails on the non-streaming path.
pub const TOO_BROAD_MESSAGE: &str =
    "Your query is too broad. Please ask about a more specific product.";

/// Composes filter synthesis, catalog fetch and answer synthesis for one prompt.
#[derive(Clone)]
pub struct PriceAgentService {
    filter: Arc<dyn FilterSynthesizer>,
    fetcher: Arc<PriceFetcher>,
    synth: Arc<dyn AnswerSynthesizer>,
}

impl PriceAgentService {
    /// Wire the production components from configuration.
    pub fn new(cfg: &Config) -> Result<Self> {
        tracing::info!(
            filter_model = %cfg.filter_llm.model,
            answer_model = %cfg.answer_llm.model,
            catalog = %cfg.catalog.base_url,
            "Initializing price agent service"
        );

        let filter_tx: Arc<dyn Transport> =
            Arc::new(OpenAiTransport::new(&cfg.filter_llm, cfg.connect_timeout())?);
        let answer_tx: Arc<dyn Transport> =
            Arc::new(OpenAiTransport::new(&cfg.answer_llm, cfg.connect_timeout())?);
        let catalog = Arc::new(HttpCatalog::new(cfg.connect_timeout())?);

        Ok(Self::from_parts(
            Arc::new(LlmFilter::new(
                filter_tx,
                cfg.filter_llm.model.clone(),
                ReferenceData::default(),
            )),
            Arc::new(PriceFetcher::new(catalog, &cfg.catalog)),
            Arc::new(LlmSynth::new(answer_tx, cfg.answer_llm.model.clone())),
        ))
    }

    pub fn from_parts(
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

    /// Non-streaming pipeline. A failed answer call degrades to [`TOO_BROAD_MESSAGE`].
    pub async fn query(&self, prompt: &str) -> Result<PriceQueryResult> {
        let prompt = validate_prompt(prompt)?;

        let predicate = self.filter.synthesize(prompt).await?;
        let records = self.fetcher.fetch_all(&predicate).await?;

        let answer = match self.synth.synth(prompt, &records).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(
                    records = records.len(),
                    "Answer synthesis failed, treating query as too broad: {}",
                    e
                );
                TOO_BROAD_MESSAGE.to_string()
            }
        };

        Ok(PriceQueryResult::new(predicate, records, Some(answer)))
    }

    pub fn coordinator(&self) -> StreamCoordinator {
        StreamCoordinator::new(
            Arc::clone(&self.filter),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.synth),
        )
    }

    /// Streaming pipeline. Callers validate the prompt first so a bad request never opens a stream.
    pub async fn query_stream<S>(&self, prompt: &str, sink: &mut S) -> StreamState
    where
        S: EventSink + ?Sized,
    {
        self.coordinator().run(prompt, sink).await
    }
}

/// Rejects missing or blank prompts.
pub fn validate_prompt(prompt: &str) -> Result<&str> {
    let trimmed = prompt.trim();
    if trimmed.is_empty() {
        return Err(PriceAgentError::Validation("Prompt is required".to_string()));
    }
    Ok(trimmed)
}
