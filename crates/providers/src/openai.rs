//! OpenAI-compatible dialogue provider.
//!
//! Sends a system prompt, a bounded rolling history and the new prompt to
//! `/chat/completions`. Works with any endpoint speaking that API.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use brainstem_config::DialogueConfig;
use brainstem_core::{DialogueError, DialogueProvider};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Dialogue backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiDialogue {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
    max_history: usize,
    history: Mutex<VecDeque<ApiMessage>>,
    client: reqwest::Client,
}

impl OpenAiDialogue {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let defaults = DialogueConfig::default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            system_prompt: defaults.system_prompt,
            max_history: defaults.max_history,
            history: Mutex::new(VecDeque::new()),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &DialogueConfig, api_key: &str) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone(),
            max_history: config.max_history,
            ..Self::new(&config.api_url, api_key, &config.model)
        }
    }

    /// System prompt, history, then the new user turn.
    fn build_messages(&self, prompt: &str, context: &str) -> Vec<ApiMessage> {
        let mut messages = vec![ApiMessage::new("system", &self.system_prompt)];
        if let Ok(history) = self.history.lock() {
            messages.extend(history.iter().cloned());
        }
        messages.push(ApiMessage::new("user", &user_content(prompt, context)));
        messages
    }

    fn append_history(&self, message: ApiMessage) {
        if self.max_history == 0 {
            return;
        }
        if let Ok(mut history) = self.history.lock() {
            history.push_back(message);
            while history.len() > self.max_history {
                history.pop_front();
            }
        }
    }

    #[cfg(test)]
    fn history_len(&self) -> usize {
        self.history.lock().map(|h| h.len()).unwrap_or_default()
    }
}

fn user_content(prompt: &str, context: &str) -> String {
    if context.trim().is_empty() {
        prompt.to_string()
    } else {
        format!("{prompt}\n\nContext:\n{context}").trim().to_string()
    }
}

#[async_trait]
impl DialogueProvider for OpenAiDialogue {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, prompt: &str, context: &str) -> Result<String, DialogueError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = ApiRequest {
            model: &self.model,
            messages: self.build_messages(prompt, context),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(model = %self.model, "Sending dialogue request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DialogueError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(DialogueError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(DialogueError::Authentication(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Dialogue provider returned error");
            return Err(DialogueError::Request {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| DialogueError::Request {
            status_code: 200,
            message: format!("Failed to parse response: {e}"),
        })?;

        let text = extract_text(api_response).ok_or(DialogueError::Empty)?;

        self.append_history(ApiMessage::new("user", prompt));
        self.append_history(ApiMessage::new("assistant", &text));
        Ok(text)
    }

    fn observe(&self, note: &str) {
        self.append_history(ApiMessage::new("user", note));
    }
}

/// First non-blank choice, trimmed.
fn extract_text(response: ApiResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .filter_map(|c| c.message.content)
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
}

// --- API types ---

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

impl ApiMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.into(),
            content: Some(content.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}
