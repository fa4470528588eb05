use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use crate::error::{PriceAgentError, Result};
use crate::models::{ChatMessage, ChatRequest, PriceRecord};
use crate::transport::{TokenStream, Transport};

const GROUNDING_PROMPT: &str = "You are an Azure retail pricing assistant. Answer the user's question using only the price records supplied as context. Quote prices, units and regions exactly as they appear in the records. If the records do not contain what the user asked about, say so instead of guessing.";

/// Produces a natural-language answer grounded in fetched price records.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn synth(&self, prompt: &str, records: &[PriceRecord]) -> Result<String>;

    async fn synth_stream(&self, prompt: &str, records: &[PriceRecord]) -> Result<TokenStream>;
}

pub struct LlmSynth {
    tx: Arc<dyn Transport>,
    model: String,
}

impl LlmSynth {
    pub fn new(tx: Arc<dyn Transport>, model: String) -> Self {
        Self { tx, model }
    }

    fn build_request(&self, prompt: &str, records: &[PriceRecord]) -> Result<ChatRequest> {
        let context = serde_json::to_string(records)?;
        Ok(ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(GROUNDING_PROMPT),
                ChatMessage::user(format!("Azure retail price records (JSON): {context}")),
                ChatMessage::user(prompt),
            ],
            temperature: 0.7,
            max_tokens: None,
            tools: None,
            tool_choice: None,
            stream: false,
        })
    }
}

#[async_trait]
impl AnswerSynthesizer for LlmSynth {
    async fn synth(&self, prompt: &str, records: &[PriceRecord]) -> Result<String> {
        tracing::info!(records = records.len(), "Synthesizing answer for prompt: {}", prompt);

        let request = self.build_request(prompt, records)?;
        let response = self
            .tx
            .chat(&request)
            .await
            .map_err(|e| PriceAgentError::AnswerSynthesis(e.to_string()))?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }

    async fn synth_stream(&self, prompt: &str, records: &[PriceRecord]) -> Result<TokenStream> {
        tracing::info!(
            records = records.len(),
            "Opening streamed answer for prompt: {}",
            prompt
        );

        let request = self.build_request(prompt, records)?;
        let tokens = self
            .tx
            .chat_stream(&request)
            .await
            .map_err(|e| PriceAgentError::AnswerSynthesis(e.to_string()))?;

        Ok(tokens
            .map(|token| token.map_err(|e| PriceAgentError::AnswerSynthesis(e.to_string())))
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatResponse, Choice};
    use futures::stream;
    use std::sync::Mutex;

    // Mock Transport for testing
    struct MockTransport {
        response: Option<ChatResponse>,
        tokens: Vec<Result<String>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
            self.requests.lock().unwrap().push(req.clone());
            self.response.clone().ok_or_else(|| {
                PriceAgentError::Internal(
                    "Chat completion API returned 400: context_length_exceeded".to_string(),
                )
            })
        }

        async fn chat_stream(&self, req: &ChatRequest) -> Result<TokenStream> {
            self.requests.lock().unwrap().push(req.clone());
            let tokens: Vec<Result<String>> = self
                .tokens
                .iter()
                .map(|t| match t {
                    Ok(s) => Ok(s.clone()),
                    Err(e) => Err(PriceAgentError::Internal(e.to_string())),
                })
                .collect();
            Ok(stream::iter(tokens).boxed())
        }
    }

    fn record(sku: &str, price: f64) -> PriceRecord {
        PriceRecord {
            arm_sku_name: sku.to_string(),
            retail_price: price,
            unit_of_measure: "1 Hour".to_string(),
            arm_region_name: "eastus".to_string(),
            meter_name: sku.to_string(),
            product_name: "Virtual Machines".to_string(),
            price_type: "Consumption".to_string(),
            location: Some("US East".to_string()),
            reservation_term: None,
            savings_plan: None,
        }
    }

    fn transport(response: Option<ChatResponse>, tokens: Vec<Result<String>>) -> Arc<MockTransport> {
        Arc::new(MockTransport {
            response,
            tokens,
            requests: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_synth_grounds_on_records() {
        let tx = transport(
            Some(ChatResponse {
                choices: vec![Choice {
                    message: ChatMessage::assistant("Standard_F2s_v2 costs $0.0846 per hour."),
                }],
            }),
            vec![],
        );
        let synth = LlmSynth::new(tx.clone(), "answer-model".to_string());

        let answer = synth
            .synth("price of F2s v2", &[record("Standard_F2s_v2", 0.0846)])
            .await
            .unwrap();
        assert_eq!(answer, "Standard_F2s_v2 costs $0.0846 per hour.");

        let requests = tx.requests.lock().unwrap();
        let req = &requests[0];
        assert_eq!(req.model, "answer-model");
        assert!(req.tools.is_none());
        assert_eq!(req.messages[0].role, "system");
        let context = req.messages[1].content.as_deref().unwrap();
        assert!(context.contains("\"armSkuName\":\"Standard_F2s_v2\""));
        assert_eq!(req.messages[2].content.as_deref(), Some("price of F2s v2"));
    }

    #[tokio::test]
    async fn test_synth_failure_is_answer_synthesis_error() {
        let synth = LlmSynth::new(transport(None, vec![]), "answer-model".to_string());
        let err = synth.synth("everything", &[]).await.unwrap_err();
        assert!(matches!(err, PriceAgentError::AnswerSynthesis(_)));
    }

    #[tokio::test]
    async fn test_synth_stream_forwards_tokens_in_order() {
        let tx = transport(
            None,
            vec![Ok("The ".to_string()), Ok("cheapest ".to_string()), Ok("is A1.".to_string())],
        );
        let synth = LlmSynth::new(tx.clone(), "answer-model".to_string());

        let tokens: Vec<String> = synth
            .synth_stream("cheapest VM", &[record("Standard_A1_v2", 0.043)])
            .await
            .unwrap()
            .map(|t| t.unwrap())
            .collect()
            .await;
        assert_eq!(tokens, vec!["The ", "cheapest ", "is A1."]);
    }

    #[tokio::test]
    async fn test_synth_stream_maps_mid_stream_errors() {
        let tx = transport(
            None,
            vec![
                Ok("partial".to_string()),
                Err(PriceAgentError::Internal("connection reset".to_string())),
            ],
        );
        let synth = LlmSynth::new(tx, "answer-model".to_string());
        let results: Vec<Result<String>> = synth.synth_stream("q", &[]).await.unwrap().collect().await;
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(PriceAgentError::AnswerSynthesis(_))));
    }
}
