//! Outbound LLM provider client.
//!
//! A single operation: governed context in, raw candidate text out. The
//! [`LlmClient`] trait is the seam the interceptor and orchestrator hold, so
//! tests script responses without a network; [`HttpLlmClient`] speaks the
//! OpenAI-compatible chat-completions wire format over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use crate::taxonomy::ContextPayload;

/// Default request timeout for the provider call.
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);

/// Hard ceiling on the provider call timeout.
pub const MAX_LLM_TIMEOUT: Duration = Duration::from_secs(600);

/// Ceiling on the `max_tokens` option.
pub const MAX_LLM_TOKENS: u32 = 32_768;

/// Default base for the NVIDIA OpenAI-compatible endpoint.
pub const DEFAULT_NVIDIA_API_BASE: &str = "https://integrate.api.nvidia.com/v1";

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// System prompt demanding a strict JSON `{language, code, notes}` response.
pub const SYSTEM_PROMPT: &str = "\
You are an advanced AI software engineer.
You will be provided with context files and a user request context.
Your task is to analyze the context and return a secure, robust code solution.
You MUST format your entire response as a single, valid JSON object containing exactly three keys:
{
  \"language\": \"python\",
  \"code\": \"print('hello')\",
  \"notes\": \"My reasoning and explanation.\"
}
DO NOT wrap the code value inside markdown fences within the JSON property.
Your response must be parseable by standard JSON parsers.";

// ── GatewayError ───────────────────────────────────────────────────────

/// Failure in the provider gateway or the extraction layer.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Caller-supplied options violated the contract ranges.
    #[error("invalid llm options: {reason}")]
    InvalidOptions {
        /// What was out of range.
        reason: String,
    },

    /// The selected provider demands a key and none was resolvable.
    #[error("api key required for provider '{provider}' (set it inline or via {env_var})")]
    MissingApiKey {
        /// Provider name.
        provider: String,
        /// Environment variable consulted as fallback.
        env_var: String,
    },

    /// Transport-level failure talking to the provider.
    #[error("llm gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered but carried no candidate content.
    #[error("llm response carried no candidate content")]
    EmptyCompletion,

    /// An extraction pattern failed to compile.
    #[error("failed to compile extraction pattern: {0}")]
    PatternCompile(#[from] regex::Error),
}

// ── LlmProvider / LlmOptions ───────────────────────────────────────────

/// Supported provider families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// api.openai.com or compatible, strict JSON response format.
    OpenAi,
    /// NVIDIA integrate endpoint; rejects `response_format`, requires a key.
    Nvidia,
    /// Any OpenAI-compatible base the caller points at.
    Custom,
}

impl Default for LlmProvider {
    fn default() -> Self {
        Self::OpenAi
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Nvidia => write!(f, "nvidia"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// Provider call options. Validated once by [`LlmOptions::validated`].
#[derive(Debug, Clone)]
pub struct LlmOptions {
    /// Model identifier sent to the provider.
    pub model_name: String,
    /// Provider family.
    pub provider: LlmProvider,
    /// Override for the API base URL.
    pub api_base: Option<String>,
    /// Inline API key; falls back to provider env vars.
    pub api_key: Option<String>,
    /// Provider-specific extra body entries, merged into the request.
    pub extra_body: Map<String, Value>,
    /// Request timeout.
    pub timeout: Duration,
    /// Completion token cap.
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0-2).
    pub temperature: Option<f32>,
    /// Nucleus sampling mass (0, 1].
    pub top_p: Option<f32>,
}

impl Default for LlmOptions {
    fn default() -> Self {
        Self {
            model_name: "gpt-4o".to_owned(),
            provider: LlmProvider::OpenAi,
            api_base: None,
            api_key: None,
            extra_body: Map::new(),
            timeout: DEFAULT_LLM_TIMEOUT,
            max_tokens: None,
            temperature: None,
            top_p: None,
        }
    }
}

impl LlmOptions {
    /// Validate the contract ranges and return the options unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidOptions`] on any out-of-range field.
    pub fn validated(self) -> Result<Self, GatewayError> {
        if self.timeout.is_zero() || self.timeout > MAX_LLM_TIMEOUT {
            return Err(GatewayError::InvalidOptions {
                reason: format!(
                    "timeout must be in (0, {}s], got {:?}",
                    MAX_LLM_TIMEOUT.as_secs(),
                    self.timeout
                ),
            });
        }
        if let Some(max_tokens) = self.max_tokens
            && (max_tokens == 0 || max_tokens > MAX_LLM_TOKENS)
        {
            return Err(GatewayError::InvalidOptions {
                reason: format!("max_tokens must be in (0, {MAX_LLM_TOKENS}], got {max_tokens}"),
            });
        }
        if let Some(temperature) = self.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(GatewayError::InvalidOptions {
                reason: format!("temperature must be in [0, 2], got {temperature}"),
            });
        }
        if let Some(top_p) = self.top_p
            && !(top_p > 0.0 && top_p <= 1.0)
        {
            return Err(GatewayError::InvalidOptions {
                reason: format!("top_p must be in (0, 1], got {top_p}"),
            });
        }
        Ok(self)
    }
}

// ── LlmClient ──────────────────────────────────────────────────────────

/// The provider contract: governed context in, raw candidate text out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the governed payload and return the raw completion text.
    async fn generate(&self, payload: &ContextPayload) -> Result<String, GatewayError>;
}

// ── HttpLlmClient ──────────────────────────────────────────────────────

/// OpenAI-compatible chat-completions client.
pub struct HttpLlmClient {
    http: reqwest::Client,
    options: LlmOptions,
    api_base: String,
    api_key: Option<String>,
}

impl HttpLlmClient {
    /// Build a client, resolving the API base and key for the provider.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidOptions`] for out-of-range options,
    /// [`GatewayError::MissingApiKey`] when the NVIDIA provider has no key,
    /// or [`GatewayError::Http`] when the reqwest client cannot be built.
    pub fn new(options: LlmOptions) -> Result<Self, GatewayError> {
        let options = options.validated()?;

        let (api_base, api_key) = match options.provider {
            LlmProvider::Nvidia => {
                let base = options
                    .api_base
                    .clone()
                    .or_else(|| std::env::var("NVIDIA_API_BASE").ok())
                    .unwrap_or_else(|| DEFAULT_NVIDIA_API_BASE.to_owned());
                let key = options
                    .api_key
                    .clone()
                    .or_else(|| std::env::var("NVIDIA_API_KEY").ok());
                let Some(key) = key else {
                    return Err(GatewayError::MissingApiKey {
                        provider: options.provider.to_string(),
                        env_var: "NVIDIA_API_KEY".to_owned(),
                    });
                };
                (base, Some(key))
            }
            LlmProvider::OpenAi | LlmProvider::Custom => {
                let base = options
                    .api_base
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_owned());
                (base, options.api_key.clone())
            }
        };

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()?;

        Ok(Self {
            http,
            options,
            api_base,
            api_key,
        })
    }

    fn build_user_prompt(payload: &ContextPayload) -> String {
        let mut prompt = format!("Request ID: {}\n\n", payload.request_id);
        if !payload.files.is_empty() {
            prompt.push_str("CONTEXT FILES:\n");
            prompt.push_str(&payload.files.join(", "));
            prompt.push_str("\n\n");
        }
        prompt.push_str("CONTEXT CONTENT:\n");
        prompt.push_str(&payload.content);
        prompt.trim().to_owned()
    }

    fn build_body(&self, payload: &ContextPayload) -> Value {
        let mut body = Map::new();
        body.insert("model".into(), json!(self.options.model_name));
        body.insert(
            "messages".into(),
            json!([
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": Self::build_user_prompt(payload)},
            ]),
        );
        if let Some(max_tokens) = self.options.max_tokens {
            body.insert("max_tokens".into(), json!(max_tokens));
        }
        if let Some(temperature) = self.options.temperature {
            body.insert("temperature".into(), json!(temperature));
        }
        if let Some(top_p) = self.options.top_p {
            body.insert("top_p".into(), json!(top_p));
        }
        // NVIDIA's endpoint rejects response_format; everywhere else we ask
        // for strict JSON and lean on the extraction fallback otherwise.
        if self.options.provider != LlmProvider::Nvidia {
            body.insert("response_format".into(), json!({"type": "json_object"}));
        }
        for (key, value) in &self.options.extra_body {
            body.insert(key.clone(), value.clone());
        }
        Value::Object(body)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
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
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn generate(&self, payload: &ContextPayload) -> Result<String, GatewayError> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        debug!(request_id = %payload.request_id, model = %self.options.model_name, "dispatching llm request");

        let mut request = self.http.post(&url).json(&self.build_body(payload));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?.error_for_status()?;
        let completion: ChatCompletion = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(GatewayError::EmptyCompletion)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_validate() {
        assert!(LlmOptions::default().validated().is_ok());
    }

    #[test]
    fn oversized_timeout_rejected() {
        let options = LlmOptions {
            timeout: Duration::from_secs(601),
            ..LlmOptions::default()
        };
        assert!(matches!(
            options.validated(),
            Err(GatewayError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn temperature_and_top_p_ranges_enforced() {
        let options = LlmOptions {
            temperature: Some(2.5),
            ..LlmOptions::default()
        };
        assert!(options.validated().is_err());

        let options = LlmOptions {
            top_p: Some(0.0),
            ..LlmOptions::default()
        };
        assert!(options.validated().is_err());
    }

    #[test]
    fn nvidia_without_key_is_rejected() {
        // Isolate from the ambient environment.
        if std::env::var("NVIDIA_API_KEY").is_ok() {
            return;
        }
        let options = LlmOptions {
            provider: LlmProvider::Nvidia,
            ..LlmOptions::default()
        };
        assert!(matches!(
            HttpLlmClient::new(options),
            Err(GatewayError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn body_sets_response_format_except_for_nvidia() {
        let payload = ContextPayload::new("req-llm", 1, vec![], "do a thing").unwrap();

        let client = HttpLlmClient::new(LlmOptions::default()).unwrap();
        let body = client.build_body(&payload);
        assert_eq!(body["response_format"]["type"], "json_object");

        let nvidia = HttpLlmClient::new(LlmOptions {
            provider: LlmProvider::Nvidia,
            api_key: Some("test-key".into()),
            ..LlmOptions::default()
        })
        .unwrap();
        let body = nvidia.build_body(&payload);
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn user_prompt_lists_files() {
        let payload =
            ContextPayload::new("req-llm2", 1, vec!["src/a.py".into(), "src/b.py".into()], "fix")
                .unwrap();
        let prompt = HttpLlmClient::build_user_prompt(&payload);
        assert!(prompt.contains("Request ID: req-llm2"));
        assert!(prompt.contains("src/a.py, src/b.py"));
        assert!(prompt.ends_with("CONTEXT CONTENT:\nfix"));
    }

    #[test]
    fn extra_body_entries_are_merged() {
        let mut extra = Map::new();
        extra.insert("chat_template_kwargs".into(), json!({"thinking": true}));
        let client = HttpLlmClient::new(LlmOptions {
            extra_body: extra,
            ..LlmOptions::default()
        })
        .unwrap();
        let payload = ContextPayload::new("req-llm3", 1, vec![], "x").unwrap();
        let body = client.build_body(&payload);
        assert_eq!(body["chat_template_kwargs"]["thinking"], json!(true));
    }
}
