use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::error::{PriceAgentError, Result};
use crate::models::{ChatMessage, ChatRequest, FunctionCall, FunctionDefinition, ToolDefinition};
use crate::reference::ReferenceData;
use crate::transport::Transport;

pub const ODATA_QUERY_FUNCTION: &str = "odata_query";

const FILTER_SYSTEM_PROMPT: &str = "You are an Azure retail pricing assistant. Whenever the user asks about the price of an Azure product you must call odata_query before replying. Build the query only from armRegionName and armSkuName, using eq for exact region codes and contains() for fuzzy SKU matches.";

/// Turns a natural-language prompt into a catalog filter predicate.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FilterSynthesizer: Send + Sync {
    async fn synthesize(&self, prompt: &str) -> Result<String>;
}

/// Filter synthesizer backed by a function-calling chat model.
pub struct LlmFilter {
    tx: Arc<dyn Transport>,
    model: String,
    reference: ReferenceData,
}

impl LlmFilter {
    pub fn new(tx: Arc<dyn Transport>, model: String, reference: ReferenceData) -> Self {
        Self {
            tx,
            model,
            reference,
        }
    }

    fn odata_query_tool() -> ToolDefinition {
        ToolDefinition {
            kind: "function".to_string(),
            function: FunctionDefinition {
                name: ODATA_QUERY_FUNCTION.to_string(),
                description: "Fetch records from the Azure retail prices API for an OData filter and return the merged JSON record list. Only use fuzzy matches on armRegionName and armSkuName.".to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "OData filter condition using fuzzy matching, for example: armRegionName eq 'southcentralus' and contains(armSkuName, 'Redis')"
                        }
                    },
                    "required": ["query"]
                }),
            },
        }
    }

    fn build_request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(FILTER_SYSTEM_PROMPT),
                ChatMessage::user(format!(
                    "Azure region mapping: {}",
                    self.reference.regions_json()
                )),
                ChatMessage::user(format!(
                    "Azure virtual machine size context: {}",
                    self.reference.vm_families_json()
                )),
                ChatMessage::user(prompt),
            ],
            temperature: 0.0,
            max_tokens: None,
            tools: Some(vec![Self::odata_query_tool()]),
            tool_choice: Some(serde_json::json!("auto")),
            stream: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OdataQueryArgs {
    #[serde(default)]
    query: Option<String>,
}

/// Pulls the predicate out of an `odata_query` call's JSON arguments.
pub fn predicate_from_call(call: &FunctionCall) -> Result<String> {
    if call.name != ODATA_QUERY_FUNCTION {
        return Err(PriceAgentError::UpstreamProtocol(format!(
            "Model called unexpected function '{}'",
            call.name
        )));
    }
    let args: OdataQueryArgs = serde_json::from_str(&call.arguments).map_err(|e| {
        PriceAgentError::UpstreamProtocol(format!(
            "Failed to parse odata_query arguments: {e}. Raw: {}",
            call.arguments
        ))
    })?;
    args.query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| {
            PriceAgentError::UpstreamProtocol("odata_query returned an empty filter".to_string())
        })
}

#[async_trait]
impl FilterSynthesizer for LlmFilter {
    async fn synthesize(&self, prompt: &str) -> Result<String> {
        tracing::info!("Synthesizing catalog filter for prompt: {}", prompt);

        let request = self.build_request(prompt);
        let response = self.tx.chat(&request).await?;

        let message = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| {
                PriceAgentError::UpstreamProtocol(
                    "Chat API returned empty choices for filter synthesis".to_string(),
                )
            })?;

        let call = message
            .tool_calls
            .and_then(|calls| calls.into_iter().next().map(|c| c.function))
            .or(message.function_call)
            .ok_or_else(|| {
                PriceAgentError::UpstreamProtocol(
                    "Model answered without calling odata_query".to_string(),
                )
            })?;

        let predicate = predicate_from_call(&call)?;
        tracing::info!("Generated OData filter: {}", predicate);
        Ok(predicate)
    }
}
