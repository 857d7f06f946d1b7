// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Generative-language client for free-text food parsing.
//!
//! Sends the user's meal description to a hosted generative-language model
//! and expects a single JSON object back with the food name and macros.
//! Requests carry a hard 30-second timeout; the model is treated as a black
//! box and failures surface as `AppError::ParserApi`.

use crate::error::AppError;
use serde::Deserialize;
use std::time::Duration;

/// Hard budget for a parse request.
const PARSE_TIMEOUT_SECS: u64 = 30;

/// Fixed instruction prepended to the user's text.
const PARSE_INSTRUCTION: &str = "Parse the following meal description into a single JSON object \
     with keys: name (string), calories (number, kcal), protein_g (number), \
     carbs_g (number), fat_g (number). Respond with only the JSON object.";

/// Generative-language API client.
#[derive(Clone)]
pub struct FoodParserClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

/// A food item parsed from free text.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
pub struct ParsedFood {
    pub name: String,
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl FoodParserClient {
    /// Create a new client with API credentials.
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(PARSE_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key,
            model,
        }
    }

    /// Override the endpoint base URL (for tests against a local server).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Parse a free-text meal description into a structured food item.
    pub async fn parse_food_text(&self, text: &str) -> Result<ParsedFood, AppError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": format!("{}\n\n{}", PARSE_INSTRUCTION, text) }]
            }]
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::ParserApi(AppError::PARSER_TIMEOUT.to_string())
                } else {
                    AppError::ParserApi(e.to_string())
                }
            })?;

        let response: GenerateContentResponse = self.check_response_json(response).await?;

        let raw = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AppError::ParserApi("Empty model response".to_string()))?;

        let parsed: ParsedFood = serde_json::from_str(extract_json(&raw))
            .map_err(|e| AppError::ParserApi(format!("Unparseable model output: {}", e)))?;

        tracing::debug!(food = %parsed.name, calories = parsed.calories, "Parsed food text");
        Ok(parsed)
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                tracing::warn!("Generative-language rate limit hit (429)");
            }

            return Err(AppError::ParserApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ParserApi(format!("JSON parse error: {}", e)))
    }
}

/// Generative-language API response (only the fields we read).
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

/// Strip markdown code fences the model sometimes wraps JSON in.
fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_plain() {
        let raw = r#"{"name": "apple"}"#;
        assert_eq!(extract_json(raw), r#"{"name": "apple"}"#);
    }

    #[test]
    fn test_extract_json_fenced() {
        let raw = "```json\n{\"name\": \"apple\"}\n```";
        assert_eq!(extract_json(raw), "{\"name\": \"apple\"}");
    }

    #[test]
    fn test_extract_json_bare_fence() {
        let raw = "```\n{\"name\": \"apple\"}\n```";
        assert_eq!(extract_json(raw), "{\"name\": \"apple\"}");
    }

    #[test]
    fn test_parsed_food_deserializes() {
        let parsed: ParsedFood = serde_json::from_str(
            r#"{"name": "Chicken sandwich", "calories": 430.0,
                "protein_g": 28.0, "carbs_g": 45.0, "fat_g": 14.0}"#,
        )
        .unwrap();

        assert_eq!(parsed.name, "Chicken sandwich");
        assert_eq!(parsed.calories, 430.0);
    }
}
