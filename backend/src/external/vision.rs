//! Vision Estimator Client
//!
//! Client for a hosted multimodal model that compares a before/after plate
//! pair and answers with a JSON waste estimate, possibly inside a fenced
//! code block.

use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::WasteAnalysis;

use crate::config::EstimatorConfig;
use crate::error::{AppError, AppResult};

/// Fixed analysis instruction sent with every image pair
pub const ANALYSIS_PROMPT: &str = r#"Analyze these two images of a dining plate - the first shows the plate before eating,
the second shows the same plate after eating.

Please provide a detailed JSON response with the following structure:
{
    "food_items": [
        {
            "name": "food item name",
            "initial_portion": "description of initial amount (e.g., 'full serving', '6 oz')",
            "remaining_portion": "description of remaining amount",
            "waste_percentage": <number between 0-100 representing how much was LEFT/WASTED, not eaten>,
            "estimated_weight_oz": <estimated weight of WASTED food in ounces>,
            "category": "entree/side/vegetable/dessert/beverage"
        }
    ],
    "overall_assessment": "brief summary of waste patterns",
    "suggestions": ["actionable tip 1", "actionable tip 2"]
}

IMPORTANT: waste_percentage should represent the percentage of food that was LEFT ON THE PLATE (wasted),
not the percentage that was eaten. For example:
- If someone ate everything: waste_percentage = 0-10%
- If someone ate most of it: waste_percentage = 10-25%
- If someone ate half: waste_percentage = 40-60%
- If someone barely touched it: waste_percentage = 75-100%

Be specific about each distinct food item you can identify. Focus on accuracy and be realistic
about portion sizes typical in college dining halls."#;

/// Raw image handed to the estimator
#[derive(Debug, Clone)]
pub struct EncodedImage<'a> {
    pub bytes: &'a [u8],
    pub mime_type: &'a str,
}

/// Client for the multimodal vision estimator
#[derive(Clone)]
pub struct VisionClient {
    endpoint: String,
    model: String,
    api_key: String,
    http_client: Client,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

/// Response from the generateContent endpoint
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl VisionClient {
    /// Create a new vision estimator client
    pub fn new(config: &EstimatorConfig, api_key: String) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            http_client,
        })
    }

    /// Create a client when the configuration carries an API key
    pub fn from_config(config: &EstimatorConfig) -> AppResult<Option<Self>> {
        match config.api_key.as_deref() {
            Some(key) if config.is_enabled() => Self::new(config, key.trim().to_string()).map(Some),
            _ => Ok(None),
        }
    }

    /// Ask the estimator to compare a before/after pair
    pub async fn analyze_plate(
        &self,
        before: EncodedImage<'_>,
        after: EncodedImage<'_>,
    ) -> AppResult<WasteAnalysis> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let engine = base64::engine::general_purpose::STANDARD;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: ANALYSIS_PROMPT,
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: before.mime_type,
                            data: engine.encode(before.bytes),
                        },
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: after.mime_type,
                            data: engine.encode(after.bytes),
                        },
                    },
                ],
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::EstimatorError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::EstimatorError(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::EstimatorError(format!("Failed to parse response: {}", e)))?;

        let text = result
            .text()
            .ok_or_else(|| AppError::EstimatorError("Response has no text".to_string()))?;

        parse_analysis(&text)
    }
}

/// Strip a markdown code fence around a JSON payload, if present
pub fn strip_code_fence(text: &str) -> &str {
    let (start, marker_len) = match text.find("```json") {
        Some(pos) => (pos, "```json".len()),
        None => match text.find("```") {
            Some(pos) => (pos, "```".len()),
            None => return text.trim(),
        },
    };

    let body = &text[start + marker_len..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Parse the estimator's free-text answer into a normalized analysis
pub fn parse_analysis(text: &str) -> AppResult<WasteAnalysis> {
    let payload = strip_code_fence(text);
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| AppError::EstimatorError(format!("Response is not JSON: {}", e)))?;
    WasteAnalysis::from_json(&value).map_err(|e| AppError::EstimatorError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::FoodCategory;

    #[test]
    fn strips_json_fence() {
        let text = "Here you go:\n```json\n{\"food_items\": []}\n```\nthanks";
        assert_eq!(strip_code_fence(text), "{\"food_items\": []}");
    }

    #[test]
    fn strips_bare_fence() {
        let text = "```\n{\"food_items\": []}\n```";
        assert_eq!(strip_code_fence(text), "{\"food_items\": []}");
    }

    #[test]
    fn unterminated_fence_keeps_remainder() {
        assert_eq!(strip_code_fence("```json {\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn unfenced_text_is_trimmed() {
        assert_eq!(strip_code_fence("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn parses_fenced_analysis() {
        let text = r#"```json
        {
            "food_items": [
                {"name": "Chicken", "waste_percentage": 20, "estimated_weight_oz": 2, "category": "entree"},
                {"name": "Broccoli", "waste_percentage": 60, "estimated_weight_oz": 6, "category": "vegetable"}
            ],
            "overall_assessment": "Vegetables left behind",
            "suggestions": ["Smaller vegetable portions"]
        }
        ```"#;

        let analysis = parse_analysis(text).unwrap();
        assert_eq!(analysis.food_items.len(), 2);
        assert_eq!(analysis.food_items[1].category, FoodCategory::Vegetable);
        assert_eq!(analysis.overall_assessment, "Vegetables left behind");
        assert_eq!(analysis.suggestions, vec!["Smaller vegetable portions"]);
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            parse_analysis("I could not see a plate."),
            Err(AppError::EstimatorError(_))
        ));
    }

    #[test]
    fn rejects_missing_food_items() {
        assert!(matches!(
            parse_analysis(r#"{"overall_assessment": "fine"}"#),
            Err(AppError::EstimatorError(_))
        ));
    }

    #[test]
    fn response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "{\"food"}, {"text": "_items\": []}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"food_items\": []}"));
    }

    #[test]
    fn empty_response_has_no_text() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(response.text().is_none());
    }
}
