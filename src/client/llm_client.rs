//! Client for OpenAI-compatible chat-completions backends.
//!
//! Covers aggregators (OpenRouter) and on-prem servers (vLLM, Ollama,
//! llama.cpp) through the shared chat-completions schema. Calls carry a
//! per-request timeout and bounded retries with exponential backoff;
//! auth and model-not-found failures are not retried.

use crate::models::{BackendError, DoxaError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Message in a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request payload.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f64,
}

/// Chat completion response.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// API error response (OpenAI-compatible).
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Response from a completion request.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,
    /// Model that answered (may differ from the one requested)
    pub model: String,
    /// Input tokens
    pub input_tokens: u32,
    /// Output tokens
    pub output_tokens: u32,
    /// Request duration
    pub duration: Duration,
}

/// Client for a single OpenAI-compatible endpoint.
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
}

impl LlmClient {
    pub fn new(
        api_key: String,
        base_url: String,
        timeout_secs: u64,
        max_retries: u32,
    ) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(DoxaError::Network)?;

        Ok(Self {
            client,
            api_key,
            base_url,
            timeout,
            max_retries: max_retries.max(1),
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// Complete a single prompt with a bounded output length.
    pub async fn complete(
        &self,
        model: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<CompletionResponse> {
        let start = Instant::now();

        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![Message::user(prompt)],
            max_tokens,
            temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let mut last_error: Option<DoxaError> = None;

        for attempt in 0..self.max_retries {
            let response = self
                .client
                .post(&url)
                .headers(self.headers())
                .json(&request)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(if e.is_timeout() {
                        DoxaError::Timeout(self.timeout)
                    } else {
                        DoxaError::Network(e)
                    });
                    if attempt < self.max_retries - 1 {
                        let backoff = Duration::from_secs(2u64.pow(attempt));
                        debug!(
                            attempt = attempt,
                            backoff_secs = backoff.as_secs(),
                            "Retrying after network error"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                    continue;
                }
            };

            let status = response.status().as_u16();

            if status == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<f64>().ok())
                    .unwrap_or(1.0);

                last_error = Some(DoxaError::Backend(BackendError::Api {
                    status,
                    message: "rate limited".to_string(),
                }));

                if attempt < self.max_retries - 1 {
                    debug!(attempt = attempt, retry_after_secs = retry_after, "Rate limited, waiting");
                    tokio::time::sleep(Duration::from_secs_f64(retry_after)).await;
                }
                continue;
            }

            if !response.status().is_success() {
                let error_body = response.text().await.unwrap_or_default();
                let error = if status == 401 {
                    BackendError::AuthenticationFailed
                } else if status == 404 {
                    BackendError::ModelNotFound(model.to_string())
                } else if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body)
                {
                    BackendError::Api {
                        status,
                        message: api_error.error.message,
                    }
                } else {
                    BackendError::Api {
                        status,
                        message: error_body,
                    }
                };

                last_error = Some(DoxaError::Backend(error));

                // Auth and unknown-model failures won't improve on retry
                if status == 401 || status == 404 {
                    break;
                }

                if attempt < self.max_retries - 1 {
                    tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
                }
                continue;
            }

            let body: ChatCompletionResponse = response
                .json()
                .await
                .map_err(|e| DoxaError::Parse(format!("Failed to parse response: {e}")))?;

            let content = body
                .choices
                .first()
                .map(|c| c.message.content.clone())
                .ok_or_else(|| {
                    DoxaError::Backend(BackendError::InvalidResponse(
                        "no choices in response".to_string(),
                    ))
                })?;

            let usage = body.usage.unwrap_or(ChatUsage {
                prompt_tokens: 0,
                completion_tokens: 0,
            });

            return Ok(CompletionResponse {
                content,
                model: body.model.unwrap_or_else(|| model.to_string()),
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                duration: start.elapsed(),
            });
        }

        // All retries exhausted
        Err(last_error.unwrap_or_else(|| {
            DoxaError::Backend(BackendError::MaxRetriesExceeded {
                attempts: self.max_retries,
                last_error: "unknown error".to_string(),
            })
        }))
    }
}
