use serde::{Deserialize, Serialize};

/// One savings plan tier attached to a catalog entry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SavingsPlanEntry {
    pub term: String,
    #[serde(rename = "retailPrice")]
    pub retail_price: f64,
}

/// Normalized projection of a retail price catalog entry.
///
/// Deserializing straight into this shape is the allow-list: any catalog field
/// not named here (currency code, meter/product/sku/service ids, effective
/// dates, ...) is dropped at the fetch boundary.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    #[serde(default)]
    pub arm_sku_name: String,
    pub retail_price: f64,
    #[serde(default)]
    pub unit_of_measure: String,
    #[serde(default)]
    pub arm_region_name: String,
    #[serde(default)]
    pub meter_name: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(rename = "type", default)]
    pub price_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings_plan: Option<Vec<SavingsPlanEntry>>,
}

/// One page of the retail price catalog response.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogPage {
    #[serde(rename = "Items", default)]
    pub items: Vec<PriceRecord>,
    #[serde(rename = "NextPageLink", default)]
    pub next_page_link: Option<String>,
}

/// Outcome of the non-streaming pipeline, serialized as the `/prices` JSON body.
#[derive(Debug, Serialize, Clone)]
pub struct PriceQueryResult {
    #[serde(rename = "Items")]
    pub items: Vec<PriceRecord>,
    #[serde(rename = "totalCount")]
    pub total_count: usize,
    pub filter: String,
    #[serde(rename = "aiResponse", skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
}

impl PriceQueryResult {
    pub fn new(filter: String, items: Vec<PriceRecord>, ai_response: Option<String>) -> Self {
        Self {
            total_count: items.len(),
            items,
            filter,
            ai_response,
        }
    }
}

// Chat completion message format
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Legacy single function call, still returned by some deployments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: Some(content.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolCall {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

/// A callable the model may invoke, in the `tools` request form.
#[derive(Debug, Serialize, Clone)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Serialize, Clone)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

// Chat completion request format
#[derive(Debug, Serialize, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

// Chat completion response format
#[derive(Debug, Deserialize, Clone)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Choice {
    pub message: ChatMessage,
}

// Incremental chunk of a streamed chat completion
#[derive(Debug, Deserialize, Clone)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_item_drops_unlisted_fields() {
        let raw = serde_json::json!({
            "currencyCode": "USD",
            "tierMinimumUnits": 0.0,
            "retailPrice": 0.0335,
            "unitPrice": 0.0335,
            "armRegionName": "eastus",
            "location": "US East",
            "effectiveStartDate": "2023-01-01T00:00:00Z",
            "meterId": "000a794b-bdb0-58be-a0cd-0c3a0f222923",
            "meterName": "F2s v2",
            "productId": "DZH318Z0BQPS",
            "skuId": "DZH318Z0BQPS/00TG",
            "productName": "Virtual Machines FSv2 Series",
            "skuName": "F2s v2",
            "serviceName": "Virtual Machines",
            "serviceId": "DZH313Z7MMC8",
            "serviceFamily": "Compute",
            "unitOfMeasure": "1 Hour",
            "type": "Consumption",
            "isPrimaryMeterRegion": true,
            "armSkuName": "Standard_F2s_v2",
            "savingsPlan": [
                { "unitPrice": 0.02, "retailPrice": 0.02, "term": "1 Year" }
            ]
        });

        let record: PriceRecord = serde_json::from_value(raw).unwrap();
        let out = serde_json::to_value(&record).unwrap();
        let keys: Vec<&str> = out.as_object().unwrap().keys().map(|k| k.as_str()).collect();

        for dropped in [
            "currencyCode",
            "unitPrice",
            "meterId",
            "productId",
            "skuId",
            "serviceId",
            "serviceName",
            "serviceFamily",
            "effectiveStartDate",
            "isPrimaryMeterRegion",
            "tierMinimumUnits",
        ] {
            assert!(!keys.contains(&dropped), "{dropped} should be stripped");
        }
        assert_eq!(out["armSkuName"], "Standard_F2s_v2");
        assert_eq!(out["type"], "Consumption");
        assert_eq!(out["savingsPlan"][0], serde_json::json!({"term": "1 Year", "retailPrice": 0.02}));
        assert!(out.get("reservationTerm").is_none());
    }

    #[test]
    fn retail_price_is_not_rounded() {
        let record: PriceRecord =
            serde_json::from_value(serde_json::json!({ "retailPrice": 0.000123456789 })).unwrap();
        assert_eq!(record.retail_price, 0.000123456789);
    }

    #[test]
    fn stream_flag_is_omitted_when_false() {
        let req = ChatRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.0,
            max_tokens: None,
            tools: None,
            tool_choice: None,
            stream: false,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("stream").is_none());
        assert!(json.get("tools").is_none());
    }
}
