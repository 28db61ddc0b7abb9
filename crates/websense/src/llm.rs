//! Structured generation against an OpenAI-compatible chat API.
//!
//! The extractor only needs "prompt + schema in, JSON out"; that seam is the
//! [`StructuredGenerator`] trait. [`OpenAiCompatibleClient`] is the default
//! implementation and works with OpenAI, OpenRouter and local servers that
//! speak the same protocol.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{ExtractedData, SchemaSpec, WebSenseError, WebSenseResult};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.0;

const ENV_API_KEY: &str = "OPENAI_API_KEY";
const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
const ENV_MODEL: &str = "OPENAI_MODEL";
const ENV_TEMPERATURE: &str = "OPENAI_TEMPERATURE";

/// Generation requests can be slow on large pages.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Settings for the generation service. Immutable once built.
#[derive(Clone, PartialEq)]
pub struct ExtractionConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl ExtractionConfig {
    /// Config with default endpoint, model and temperature.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Read `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_MODEL` and
    /// `OPENAI_TEMPERATURE` from the process environment.
    pub fn from_env() -> WebSenseResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> WebSenseResult<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(ENV_API_KEY).ok_or_else(|| {
            WebSenseError::Configuration(format!("{ENV_API_KEY} is not set"))
        })?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = non_empty(ENV_BASE_URL) {
            config = config.with_base_url(base_url);
        }
        if let Some(model) = non_empty(ENV_MODEL) {
            config = config.with_model(model);
        }
        if let Some(raw) = non_empty(ENV_TEMPERATURE) {
            let temperature = raw.trim().parse::<f64>().map_err(|_| {
                WebSenseError::Configuration(format!(
                    "{ENV_TEMPERATURE} must be a number, got '{raw}'"
                ))
            })?;
            config = config.with_temperature(temperature);
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A service that turns a prompt and a schema into matching JSON.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    /// Generate data for `prompt` that conforms to `schema`.
    async fn generate(&self, prompt: &str, schema: &SchemaSpec) -> WebSenseResult<ExtractedData>;
}

/// Client for `POST {base_url}/chat/completions` with a JSON-schema
/// response format.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    config: ExtractionConfig,
}

impl OpenAiCompatibleClient {
    pub fn new(config: ExtractionConfig) -> WebSenseResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(WebSenseError::Configuration(
                "API key for the generation service is empty".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                WebSenseError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn request_body(&self, prompt: &str, schema: &SchemaSpec) -> Value {
        json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "extraction",
                    "schema": schema,
                    "strict": false
                }
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[async_trait]
impl StructuredGenerator for OpenAiCompatibleClient {
    async fn generate(&self, prompt: &str, schema: &SchemaSpec) -> WebSenseResult<ExtractedData> {
        let url = format!("{}/chat/completions", self.config.base_url);
        tracing::debug!(
            "Requesting extraction from {} (model {}, {} prompt chars)",
            url,
            self.config.model,
            prompt.chars().count()
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(prompt, schema))
            .send()
            .await
            .map_err(|e| WebSenseError::ExtractionService(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            WebSenseError::ExtractionService(format!("failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(WebSenseError::ExtractionService(format!(
                "HTTP status {status}: {}",
                body.trim()
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            WebSenseError::ExtractionService(format!("malformed response: {e}"))
        })?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| {
                WebSenseError::ExtractionService("response contained no choices".to_string())
            })?;

        if let Some(refusal) = message.refusal.filter(|r| !r.is_empty()) {
            return Err(WebSenseError::ExtractionService(format!(
                "model refused: {refusal}"
            )));
        }

        let content = message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                WebSenseError::ExtractionService("response message was empty".to_string())
            })?;

        serde_json::from_str(strip_code_fence(&content)).map_err(|e| {
            WebSenseError::ExtractionService(format!("model returned invalid JSON: {e}"))
        })
    }
}

/// Unwrap a ```json fenced block if the model added one.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn chat_reply(content: &str) -> Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    async fn client_for(server: &MockServer) -> OpenAiCompatibleClient {
        OpenAiCompatibleClient::new(
            ExtractionConfig::new("sk-test")
                .with_base_url(server.uri())
                .with_model("test-model")
                .with_temperature(0.5),
        )
        .unwrap()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = ExtractionConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-1")])).unwrap();
        assert_eq!(config.api_key, "sk-1");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ExtractionConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-1"),
            ("OPENAI_BASE_URL", "https://openrouter.ai/api/v1/"),
            ("OPENAI_MODEL", "minimax/minimax-m2"),
            ("OPENAI_TEMPERATURE", "0.5"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.model, "minimax/minimax-m2");
        assert_eq!(config.temperature, 0.5);
    }

    #[test]
    fn test_missing_api_key() {
        let err = ExtractionConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, WebSenseError::Configuration(_)));
        let err = ExtractionConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-1"),
            ("OPENAI_TEMPERATURE", "warm"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OPENAI_TEMPERATURE"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", ExtractionConfig::new("sk-secret"));
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn test_temperature_is_sent_exactly() {
        let config = ExtractionConfig::new("sk-1").with_temperature(0.7);
        let client = OpenAiCompatibleClient::new(config).unwrap();
        let body = client.request_body("p", &json!({ "type": "object" }));
        assert_eq!(body["temperature"], json!(0.7));
        assert_eq!(body["temperature"].to_string(), "0.7");
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_generate_sends_schema_and_parses_content() {
        let server = MockServer::start().await;
        let schema = json!({ "type": "object", "properties": { "title": { "type": "string" } } });

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "temperature": 0.5,
                "response_format": { "json_schema": { "schema": schema.clone() } }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(chat_reply("{\"title\":\"Hello\"}")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let data = client.generate("Extract the title.", &schema).await.unwrap();
        assert_eq!(data, json!({ "title": "Hello" }));
    }

    #[tokio::test]
    async fn test_http_error_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .generate("p", &json!({ "type": "object" }))
            .await
            .unwrap_err();
        match err {
            WebSenseError::ExtractionService(msg) => assert!(msg.contains("401")),
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_content_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("not json")))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .generate("p", &json!({ "type": "object" }))
            .await
            .unwrap_err();
        assert!(matches!(err, WebSenseError::ExtractionService(_)));
    }

    #[tokio::test]
    async fn test_refusal_and_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": null, "refusal": "cannot help" } }]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let schema = json!({ "type": "object" });

        let refusal = client.generate("p", &schema).await.unwrap_err();
        assert!(refusal.to_string().contains("cannot help"));

        let empty = client.generate("p", &schema).await.unwrap_err();
        assert!(empty.to_string().contains("no choices"));
    }
}
