use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{LlmClient, DEFAULT_SYSTEM_PROMPT};
use crate::config::Config;
use crate::error::{ArchReviewError, LlmError};
use crate::secrets::resolve_secret;

/// Maximum length of a provider error body kept in errors and logs.
const MAX_ERROR_BODY_LENGTH: usize = 200;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for `POST {base_url}/chat/completions`.
pub struct ChatCompletionsClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: SecretString,
    max_tokens: u32,
    temperature: f32,
    max_retries: u32,
    retry_delay: Duration,
}

impl ChatCompletionsClient {
    pub fn from_config(config: &Config) -> Result<Self, ArchReviewError> {
        let llm = &config.llm;
        let api_key = resolve_secret(
            llm.api_key.as_deref(),
            llm.api_key_file.as_deref(),
            llm.api_key_env_var.as_deref(),
        )?;

        let http = Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .build()
            .map_err(|e| LlmError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", llm.base_url.trim_end_matches('/')),
            model: llm.model.clone().unwrap_or_else(|| config.model_name.clone()),
            api_key,
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
            max_retries: llm.max_retries.max(1),
            retry_delay: Duration::from_millis(llm.retry_delay_ms),
        })
    }

    fn send_once(&self, prompt: &str, system_prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .map_err(|e| LlmError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or(LlmError::EmptyResponse)
    }
}

impl LlmClient for ChatCompletionsClient {
    fn complete(&self, prompt: &str, system_prompt: Option<&str>) -> Result<String, LlmError> {
        let system_prompt = system_prompt.unwrap_or(DEFAULT_SYSTEM_PROMPT);
        let _span = tracing::info_span!("llm.complete", model = %self.model).entered();

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send_once(prompt, system_prompt) {
                Ok(text) => {
                    debug!(attempt, chars = text.len(), "LLM call succeeded");
                    return Ok(text);
                }
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    warn!(attempt, error = %e, "LLM call failed, retrying");
                    thread::sleep(self.retry_delay);
                }
                Err(e) if attempt > 1 => {
                    return Err(LlmError::RetriesExhausted {
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Transport failures, rate limits and server errors are worth another try;
/// anything else will fail the same way again.
fn is_retryable(error: &LlmError) -> bool {
    match error {
        LlmError::Request(_) => true,
        LlmError::Status { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
        }
        _ => false,
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_LENGTH {
        let truncated: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        format!("{}... (truncated)", truncated)
    } else {
        body.to_string()
    }
}
