use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::ACCEPT},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use chrono::Utc;
use futures::stream;
use serde::{Deserialize, Serialize};

use crate::error::PriceAgentError;
use crate::service::{PriceAgentService, validate_prompt};
use crate::stream::{ChannelSink, StreamEvent};

/// Events buffered between the coordinator and a slow SSE client.
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Deserialize)]
pub struct PricesRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PricesParams {
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

pub fn router(service: PriceAgentService) -> Router {
    Router::new()
        .route("/prices", post(prices))
        .route("/health", get(|| async { "ok" }))
        .with_state(service)
}

fn wants_stream(headers: &HeaderMap, params: &PricesParams) -> bool {
    params.stream
        || headers
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("text/event-stream"))
}

async fn prices(
    State(service): State<PriceAgentService>,
    Query(params): Query<PricesParams>,
    headers: HeaderMap,
    body: Result<Json<PricesRequest>, JsonRejection>,
) -> Response {
    let prompt = match &body {
        Ok(Json(req)) => req.prompt.as_deref().unwrap_or_default(),
        Err(rejection) => {
            tracing::warn!("Rejected /prices body: {}", rejection.body_text());
            ""
        }
    };
    let prompt = match validate_prompt(prompt) {
        Ok(prompt) => prompt.to_string(),
        Err(e) => return error_response(e),
    };

    if wants_stream(&headers, &params) {
        stream_response(service, prompt)
    } else {
        match service.query(&prompt).await {
            Ok(result) => {
                tracing::info!(
                    items = result.total_count,
                    filter = %result.filter,
                    "Answered price query"
                );
                Json(result).into_response()
            }
            Err(e) => error_response(e),
        }
    }
}

fn stream_response(service: PriceAgentService, prompt: String) -> Response {
    let (mut sink, rx) = ChannelSink::channel(EVENT_BUFFER);
    tokio::spawn(async move {
        let state = service.query_stream(&prompt, &mut sink).await;
        tracing::debug!(?state, "Streaming request finished");
    });

    let events = stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Ok::<Event, Infallible>(sse_event(&event)), rx))
    });

    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// Frames one coordinator event as a `data: <json>` SSE message.
fn sse_event(event: &StreamEvent) -> Event {
    let json = serde_json::to_string(event).unwrap_or_else(|e| {
        tracing::error!("Failed to encode stream event: {}", e);
        r#"{"type":"error","data":{"message":"failed to encode event"}}"#.to_string()
    });
    Event::default().data(json)
}

fn error_response(err: PriceAgentError) -> Response {
    if let PriceAgentError::Validation(msg) = &err {
        let body = ErrorBody {
            error: msg.clone(),
            details: None,
            timestamp: None,
        };
        return (StatusCode::BAD_REQUEST, Json(body)).into_response();
    }

    tracing::error!("Price query failed: {}", err);
    let body = ErrorBody {
        error: "Failed to process request".to_string(),
        details: Some(err.to_string()),
        timestamp: Some(Utc::now().to_rfc3339()),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogTransport, PriceFetcher};
    use crate::config::CatalogConfig;
    use crate::error::Result;
    use crate::filter::MockFilterSynthesizer;
    use crate::models::{CatalogPage, PriceRecord};
    use crate::synth::MockAnswerSynthesizer;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use futures::StreamExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct OnePage;

    #[async_trait]
    impl CatalogTransport for OnePage {
        async fn get_page(&self, _url: &str) -> Result<CatalogPage> {
            Ok(CatalogPage {
                items: vec![PriceRecord {
                    arm_sku_name: "Standard_F16s_v2".to_string(),
                    retail_price: 0.677,
                    unit_of_measure: "1 Hour".to_string(),
                    arm_region_name: "eastus".to_string(),
                    meter_name: "F16s v2".to_string(),
                    product_name: "Virtual Machines FSv2 Series".to_string(),
                    price_type: "Consumption".to_string(),
                    location: Some("US East".to_string()),
                    reservation_term: None,
                    savings_plan: None,
                }],
                next_page_link: None,
            })
        }
    }

    fn app(filter: MockFilterSynthesizer, synth: MockAnswerSynthesizer) -> Router {
        let fetcher = PriceFetcher::new(
            Arc::new(OnePage),
            &CatalogConfig {
                base_url: "https://prices.example.com/api/retail/prices".to_string(),
                api_version: "2023-01-01-preview".to_string(),
            },
        );
        router(PriceAgentService::from_parts(
            Arc::new(filter),
            Arc::new(fetcher),
            Arc::new(synth),
        ))
    }

    fn filter_ok() -> MockFilterSynthesizer {
        let mut filter = MockFilterSynthesizer::new();
        filter.expect_synthesize().returning(|_| {
            Ok("armRegionName eq 'eastus' and contains(armSkuName, 'F16s')".to_string())
        });
        filter
    }

    fn post_prices(uri: &str, body: &str, accept: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(accept) = accept {
            builder = builder.header("accept", accept);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_json_response_shape() {
        let mut synth = MockAnswerSynthesizer::new();
        synth
            .expect_synth()
            .returning(|_, _| Ok("F16s v2 is $0.677/hour in East US.".to_string()));

        let response = app(filter_ok(), synth)
            .oneshot(post_prices("/prices", r#"{"prompt":"F16s v2 East US"}"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["totalCount"], 1);
        assert_eq!(body["Items"][0]["armSkuName"], "Standard_F16s_v2");
        assert_eq!(
            body["filter"],
            "armRegionName eq 'eastus' and contains(armSkuName, 'F16s')"
        );
        assert_eq!(body["aiResponse"], "F16s v2 is $0.677/hour in East US.");
    }

    #[tokio::test]
    async fn test_missing_prompt_is_bad_request() {
        for body in [r#"{}"#, r#"{"prompt":""}"#, "not json"] {
            let mut filter = MockFilterSynthesizer::new();
            filter.expect_synthesize().never();
            let response = app(filter, MockAnswerSynthesizer::new())
                .oneshot(post_prices("/prices", body, Some("text/event-stream")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(json_body(response).await["error"], "Prompt is required");
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_is_500_with_details() {
        let mut filter = MockFilterSynthesizer::new();
        filter.expect_synthesize().returning(|_| {
            Err(PriceAgentError::UpstreamProtocol(
                "Model answered without calling odata_query".to_string(),
            ))
        });

        let response = app(filter, MockAnswerSynthesizer::new())
            .oneshot(post_prices("/prices", r#"{"prompt":"hi"}"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Failed to process request");
        assert!(body["details"].as_str().unwrap().contains("odata_query"));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_streaming_response_frames() {
        let mut synth = MockAnswerSynthesizer::new();
        synth.expect_synth_stream().returning(|_, _| {
            Ok(futures::stream::iter(vec![Ok("F16s v2 ".to_string()), Ok("costs $0.677.".to_string())])
                .boxed())
        });

        let response = app(filter_ok(), synth)
            .oneshot(post_prices("/prices?stream=true", r#"{"prompt":"F16s v2"}"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("text/event-stream")
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let events: Vec<serde_json::Value> = text
            .split("\n\n")
            .filter_map(|frame| frame.strip_prefix("data: "))
            .map(|json| serde_json::from_str(json).unwrap())
            .collect();

        let kinds: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
        assert_eq!(
            kinds,
            vec![
                "price_data",
                "ai_response_chunk",
                "ai_response_chunk",
                "ai_response_complete"
            ]
        );
        assert_eq!(events[0]["data"]["totalCount"], 1);
        assert_eq!(events[3]["data"]["content"], "F16s v2 costs $0.677.");
    }

    #[tokio::test]
    async fn test_streaming_error_frame() {
        let mut filter = MockFilterSynthesizer::new();
        filter.expect_synthesize().returning(|_| {
            Err(PriceAgentError::UpstreamProtocol("no function call".to_string()))
        });

        let response = app(filter, MockAnswerSynthesizer::new())
            .oneshot(post_prices(
                "/prices",
                r#"{"prompt":"hello"}"#,
                Some("text/event-stream"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        let frames: Vec<&str> = text
            .split("\n\n")
            .filter(|f| f.starts_with("data: "))
            .collect();
        assert_eq!(frames.len(), 1);
        let event: serde_json::Value =
            serde_json::from_str(frames[0].trim_start_matches("data: ")).unwrap();
        assert_eq!(event["type"], "error");
        assert!(event["data"]["message"].as_str().unwrap().contains("no function call"));
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(MockFilterSynthesizer::new(), MockAnswerSynthesizer::new())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
