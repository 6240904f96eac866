//! Provider-backed enhancer.
//!
//! Each provider call returns the model's raw text; parsing and merging live
//! in [`super::apply`]. Calls fail with a descriptive message for:
//! - Unsupported provider
//! - Network timeouts
//! - Non-2xx responses (body truncated to 1 KiB)
//! - Response wrappers without text content

use std::time::Duration;

use tracing::{error, info};

use crate::engine::{Preferences, Report, VehicleInfo};
use crate::error::{Result, TuneplanError};

use super::apply::{apply_enhancements, parse_custom_suggestions, parse_enhancement, CustomSuggestion};
use super::prompts::{build_custom_prompt, build_enhancement_prompt, SYSTEM_PROMPT};
use super::Enhancer;

pub const SUPPORTED_PROVIDERS: [&str; 4] = ["claude", "openai", "openrouter", "gemini"];

/// Model used when the settings do not name one.
pub fn default_model(provider: &str) -> &'static str {
    match provider {
        "openai" => "gpt-4o",
        "openrouter" => "anthropic/claude-sonnet-4",
        "gemini" => "gemini-2.0-flash",
        _ => "claude-sonnet-4-20250514",
    }
}

/// Enhancer that sends the report to a hosted LLM.
#[derive(Debug, Clone)]
pub struct LlmEnhancer {
    provider: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl LlmEnhancer {
    pub fn new(provider: &str, model: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            timeout,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model for modifications outside the catalog.
    ///
    /// The result is advisory and never merged into an engine report.
    pub async fn suggest_custom(
        &self,
        vehicle: &VehicleInfo,
        prefs: &Preferences,
    ) -> Result<Vec<CustomSuggestion>> {
        let prompt = build_custom_prompt(vehicle, prefs);
        let raw = self.complete(&prompt).await?;
        let suggestions = parse_custom_suggestions(&raw)?;
        info!(
            "Received {} custom suggestions from {}",
            suggestions.len(),
            self.provider
        );
        Ok(suggestions)
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        info!(
            "Calling {} (model: {}) with {} char prompt",
            self.provider,
            self.model,
            prompt.len()
        );
        let call = CallArgs {
            api_key: &self.api_key,
            model: &self.model,
            prompt,
            timeout: self.timeout,
        };
        let result = match self.provider.as_str() {
            "claude" => call_claude(&call).await,
            "openai" => call_openai_compatible(&call, "openai", OPENAI_URL).await,
            "openrouter" => call_openai_compatible(&call, "openrouter", OPENROUTER_URL).await,
            "gemini" => call_gemini(&call).await,
            _ => Err(format!(
                "Unsupported AI provider: '{}'. Supported: {}",
                self.provider,
                SUPPORTED_PROVIDERS.join(", ")
            )),
        };
        result.map_err(TuneplanError::Enhancement)
    }
}

impl Enhancer for LlmEnhancer {
    async fn enhance(&self, report: &Report) -> Result<Report> {
        let prompt = build_enhancement_prompt(report);
        let raw = self.complete(&prompt).await?;
        let response = parse_enhancement(&raw)?;
        info!(
            "Applying {} recommendation enhancements from {}",
            response.enhanced_recommendations.len(),
            self.provider
        );
        Ok(apply_enhancements(report, &response))
    }
}

// =============================================================================
// PROVIDER CALLS
// =============================================================================

const CLAUDE_URL: &str = "https://api.anthropic.com/v1/messages";
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const MAX_TOKENS: u32 = 4096;

struct CallArgs<'a> {
    api_key: &'a str,
    model: &'a str,
    prompt: &'a str,
    timeout: Duration,
}

fn build_api_client(timeout: Duration) -> std::result::Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))
}

fn send_error(e: reqwest::Error, provider: &str, timeout: Duration) -> String {
    let msg = if e.is_timeout() {
        format!(
            "LLM API timeout after {}s for provider '{}'",
            timeout.as_secs(),
            provider
        )
    } else {
        format!("LLM API request failed for {}: {}", provider, e)
    };
    error!("{}", msg);
    msg
}

/// Check the status and read the body text.
async fn handle_api_response(
    response: reqwest::Response,
    provider: &str,
) -> std::result::Result<String, String> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());
        let truncated = match body.char_indices().nth(1024) {
            Some((cut, _)) => format!("{}...", &body[..cut]),
            None => body,
        };
        let msg = format!("LLM API error: {} from {} - {}", status, provider, truncated);
        error!("{}", msg);
        return Err(msg);
    }
    response
        .text()
        .await
        .map_err(|e| format!("Failed to read API response body from {}: {}", provider, e))
}

/// Pull the text at `pointer` out of a provider's JSON wrapper.
fn extract_text(body: &str, pointer: &str, provider: &str) -> std::result::Result<String, String> {
    let json: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        let msg = format!("Failed to parse {} API response wrapper: {}", provider, e);
        error!("{}", msg);
        msg
    })?;
    json.pointer(pointer)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            let msg = format!("No text content in {} API response", provider);
            error!("{}", msg);
            msg
        })
}

async fn call_claude(call: &CallArgs<'_>) -> std::result::Result<String, String> {
    let client = build_api_client(call.timeout)?;
    let body = serde_json::json!({
        "model": call.model,
        "max_tokens": MAX_TOKENS,
        "system": SYSTEM_PROMPT,
        "messages": [
            {"role": "user", "content": call.prompt}
        ]
    });

    let response = client
        .post(CLAUDE_URL)
        .header("x-api-key", call.api_key)
        .header("anthropic-version", "2023-06-01")
        .header("content-type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| send_error(e, "claude", call.timeout))?;

    let text = handle_api_response(response, "claude").await?;
    // { "content": [{"type": "text", "text": "..."}] }
    extract_text(&text, "/content/0/text", "claude")
}

/// OpenAI and OpenRouter share the chat-completions wire format.
async fn call_openai_compatible(
    call: &CallArgs<'_>,
    provider: &str,
    url: &str,
) -> std::result::Result<String, String> {
    let client = build_api_client(call.timeout)?;
    let body = serde_json::json!({
        "model": call.model,
        "max_tokens": MAX_TOKENS,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": call.prompt}
        ],
        "response_format": {
            "type": "json_object"
        }
    });

    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", call.api_key))
        .header("content-type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| send_error(e, provider, call.timeout))?;

    let text = handle_api_response(response, provider).await?;
    // { "choices": [{"message": {"content": "..."}}] }
    extract_text(&text, "/choices/0/message/content", provider)
}

async fn call_gemini(call: &CallArgs<'_>) -> std::result::Result<String, String> {
    let client = build_api_client(call.timeout)?;
    let body = serde_json::json!({
        "systemInstruction": {
            "parts": [{"text": SYSTEM_PROMPT}]
        },
        "contents": [
            {"role": "user", "parts": [{"text": call.prompt}]}
        ],
        "generationConfig": {
            "maxOutputTokens": MAX_TOKENS,
            "responseMimeType": "application/json"
        }
    });

    let response = client
        .post(format!("{}/{}:generateContent", GEMINI_BASE_URL, call.model))
        .header("x-goog-api-key", call.api_key)
        .header("content-type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| send_error(e, "gemini", call.timeout))?;

    let text = handle_api_response(response, "gemini").await?;
    // { "candidates": [{"content": {"parts": [{"text": "..."}]}}] }
    extract_text(&text, "/candidates/0/content/parts/0/text", "gemini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{DrivingGoal, EngineType, ExperienceLevel, RecommendationEngine};
    use crate::knowledge::BudgetRange;

    fn request() -> (VehicleInfo, Preferences) {
        (
            VehicleInfo {
                make: "Toyota".to_string(),
                model: "86".to_string(),
                year: 2020,
                engine_type: EngineType::Petrol,
                current_modifications: vec![],
            },
            Preferences {
                primary_goals: vec![DrivingGoal::TrackUse],
                budget_range: BudgetRange::Moderate,
                experience_level: ExperienceLevel::Intermediate,
                max_budget: None,
            },
        )
    }

    #[tokio::test]
    async fn test_enhance_unsupported_provider() {
        let (vehicle, prefs) = request();
        let report = RecommendationEngine::default()
            .generate(&vehicle, &prefs)
            .unwrap();
        let enhancer = LlmEnhancer::new("invalid_provider", "model", "key", Duration::from_secs(5));

        let err = enhancer.enhance(&report).await.unwrap_err().to_string();
        assert!(
            err.contains("Unsupported AI provider"),
            "Expected unsupported provider error, got: {}",
            err
        );
        assert!(err.contains("invalid_provider"));
    }

    #[tokio::test]
    async fn test_suggest_custom_unsupported_provider() {
        let (vehicle, prefs) = request();
        let enhancer = LlmEnhancer::new("kimi", "model", "key", Duration::from_secs(5));
        let result = enhancer.suggest_custom(&vehicle, &prefs).await;
        assert!(matches!(result, Err(TuneplanError::Enhancement(_))));
    }

    #[test]
    fn test_build_api_client_succeeds() {
        assert!(build_api_client(Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn test_extract_text_pointers() {
        let claude = r#"{"content": [{"type": "text", "text": "{\"ok\": true}"}]}"#;
        assert_eq!(
            extract_text(claude, "/content/0/text", "claude").unwrap(),
            "{\"ok\": true}"
        );

        let gemini = r#"{"candidates": [{"content": {"parts": [{"text": "hi"}]}}]}"#;
        assert_eq!(
            extract_text(gemini, "/candidates/0/content/parts/0/text", "gemini").unwrap(),
            "hi"
        );

        let err = extract_text(r#"{"choices": []}"#, "/choices/0/message/content", "openai")
            .unwrap_err();
        assert!(err.contains("No text content in openai"));
    }

    #[test]
    fn test_default_models() {
        assert_eq!(default_model("openai"), "gpt-4o");
        assert_eq!(default_model("gemini"), "gemini-2.0-flash");
        assert_eq!(default_model("claude"), "claude-sonnet-4-20250514");
    }
}
