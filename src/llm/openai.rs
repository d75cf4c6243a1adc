//! OpenAI chat completions client.
use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use super::core::{ChatProvider, GenerateOptions, Message, Role, conversational, drain_sse_data};

pub struct OpenAiProvider {
    api_hostname: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_hostname: &str, api_key: &str, model: &str) -> Self {
        Self {
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.api_hostname.trim_end_matches('/')
        )
    }

    fn payload(&self, messages: &[Message]) -> Value {
        let messages: Vec<&Message> = conversational(messages).collect();
        json!({
            "model": self.model,
            "messages": messages,
        })
    }

    pub async fn completion(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<Value, Error> {
        let mut payload = self.payload(messages);
        if let Some(max_tokens) = options.max_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = options.temperature {
            payload["temperature"] = json!(temperature);
        }
        let response = reqwest::Client::new()
            .post(self.url())
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(60))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Delta {
    Content { content: String },

    #[allow(dead_code)]
    Reasoning { reasoning: String },

    Stop {},
}

#[derive(Debug, Deserialize)]
struct CompletionChunkChoice {
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    // The final usage chunk has no choices
    #[serde(default)]
    choices: Vec<CompletionChunkChoice>,
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn stream(
        &self,
        tx: mpsc::UnboundedSender<String>,
        messages: &[Message],
    ) -> Result<String, Error> {
        let mut payload = self.payload(messages);
        payload["stream"] = json!(true);

        let response = reqwest::Client::new()
            .post(self.url())
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(60 * 5))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let mut stream = response.bytes_stream();
        let mut content_buf = String::new();
        let mut buffer: Vec<u8> = Vec::new();

        'outer: while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.extend_from_slice(&chunk);

            for data in drain_sse_data(&mut buffer) {
                if data == "[DONE]" {
                    break 'outer;
                }

                let chunk = serde_json::from_str::<CompletionChunk>(&data).inspect_err(|e| {
                    tracing::error!("Parsing completion chunk failed for {}\nError:{}", data, e)
                })?;
                let Some(choice) = chunk.choices.first() else {
                    continue;
                };

                match &choice.delta {
                    Delta::Content { content } => {
                        content_buf.push_str(content);
                        // Keep consuming even if the receiver went away so
                        // the full text can still be returned
                        let _ = tx.send(content.clone());
                    }
                    Delta::Reasoning { .. } | Delta::Stop {} => {}
                }

                if choice.finish_reason.is_some() {
                    break 'outer;
                }
            }
        }

        Ok(content_buf)
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, Error> {
        let messages = vec![Message::new(Role::User, prompt)];
        let resp = self.completion(&messages, options).await?;
        resp["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or(anyhow!("No message received. Resp:\n\n {}", resp))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
