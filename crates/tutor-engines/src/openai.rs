use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde_json::{json, Value};

use tutor_core::config::LlmConfig;
use tutor_core::error::ChatError;
use tutor_core::redaction::redact_secrets_in_text;
use tutor_core::traits::ChatClient;

const MAX_ERROR_BODY_CHARS: usize = 300;

/// Chat-completions client for OpenAI-compatible endpoints.
pub struct OpenAiChatClient {
    http: Client,
    config: LlmConfig,
}

impl OpenAiChatClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    pub fn build_payload(&self, prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": self.config.system_prompt },
                { "role": "user", "content": prompt }
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        })
    }
}

/// Pulls `choices[0].message.content` out of a completion body.
pub fn extract_completion(body: &Value) -> Result<String, ChatError> {
    if let Some(error) = body.get("error") {
        return Err(ChatError::MalformedResponse(redact_secrets_in_text(
            &error.to_string(),
        )));
    }

    body.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .filter(|content| !content.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| ChatError::MalformedResponse("no completion content".to_string()))
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    fn is_configured(&self) -> bool {
        self.config.credential().is_some()
    }

    async fn chat(&self, prompt: &str) -> Result<String, ChatError> {
        let api_key = self.config.credential().ok_or(ChatError::MissingCredential)?;
        debug!("Calling chat completions with model {}", self.config.model);

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&self.build_payload(prompt))
            .send()
            .await
            .map_err(|e| ChatError::Transport(redact_secrets_in_text(&e.to_string())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Transport(redact_secrets_in_text(&e.to_string())))?;

        if !status.is_success() {
            let message: String = redact_secrets_in_text(&body)
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            error!("Chat completion returned {}: {}", status, message);
            return Err(ChatError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ChatError::MalformedResponse(e.to_string()))?;
        extract_completion(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: Option<&str>) -> OpenAiChatClient {
        OpenAiChatClient::new(LlmConfig {
            api_key: api_key.map(str::to_string),
            base_url: "http://localhost:9/v1/".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn payload_carries_model_settings() {
        let payload = client(Some("sk-test")).build_payload("Explain fractions");
        assert_eq!(payload["model"], "gpt-3.5-turbo");
        assert_eq!(payload["max_tokens"], 500);
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["content"], "Explain fractions");
    }

    #[test]
    fn endpoint_joins_base_url() {
        assert_eq!(
            client(None).endpoint(),
            "http://localhost:9/v1/chat/completions"
        );
    }

    #[test]
    fn placeholder_key_is_unconfigured() {
        assert!(!client(Some("your-openai-api-key-here")).is_configured());
        assert!(!client(None).is_configured());
        assert!(client(Some("sk-real")).is_configured());
    }

    #[tokio::test]
    async fn chat_without_key_reports_missing_credential() {
        let err = client(None).chat("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::MissingCredential));
    }

    #[test]
    fn extracts_first_choice() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "Hi!"}}]});
        assert_eq!(extract_completion(&body).unwrap(), "Hi!");
    }

    #[test]
    fn empty_or_error_bodies_are_malformed() {
        let empty = json!({"choices": [{"message": {"content": "  "}}]});
        assert!(matches!(
            extract_completion(&empty),
            Err(ChatError::MalformedResponse(_))
        ));
        let error = json!({"error": {"message": "bad"}});
        assert!(matches!(
            extract_completion(&error),
            Err(ChatError::MalformedResponse(_))
        ));
    }
}
