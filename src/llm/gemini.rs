//! Google Gemini `generateContent` client.
use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use super::core::{ChatProvider, GenerateOptions, Message, Role, conversational, drain_sse_data};

pub struct GeminiProvider {
    api_hostname: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        Some(text)
    }

    fn is_finished(&self) -> bool {
        self.candidates
            .first()
            .is_some_and(|c| c.finish_reason.is_some())
    }
}

impl GeminiProvider {
    pub fn new(api_hostname: &str, api_key: &str, model: &str) -> Self {
        Self {
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    fn url(&self, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.api_hostname.trim_end_matches('/'),
            self.model,
            method
        )
    }

    /// Gemini calls the assistant `model` and takes system prompts
    /// separately from the conversation.
    fn payload(messages: &[Message], options: &GenerateOptions) -> Value {
        let mut system = Vec::new();
        let mut contents = Vec::new();
        for m in conversational(messages) {
            match m.role {
                Role::System => system.push(json!({ "text": m.content })),
                Role::Assistant => contents.push(json!({
                    "role": "model",
                    "parts": [{ "text": m.content }],
                })),
                _ => contents.push(json!({
                    "role": "user",
                    "parts": [{ "text": m.content }],
                })),
            }
        }

        let mut payload = json!({ "contents": contents });
        if !system.is_empty() {
            payload["systemInstruction"] = json!({ "parts": system });
        }

        let mut generation_config = serde_json::Map::new();
        if let Some(max_tokens) = options.max_tokens {
            generation_config.insert("maxOutputTokens".into(), json!(max_tokens));
        }
        if let Some(temperature) = options.temperature {
            generation_config.insert("temperature".into(), json!(temperature));
        }
        if !generation_config.is_empty() {
            payload["generationConfig"] = Value::Object(generation_config);
        }
        payload
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    async fn stream(
        &self,
        tx: mpsc::UnboundedSender<String>,
        messages: &[Message],
    ) -> Result<String, Error> {
        let payload = Self::payload(messages, &GenerateOptions::default());
        let response = reqwest::Client::new()
            .post(self.url("streamGenerateContent"))
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.api_key)
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
                let resp = serde_json::from_str::<GenerateContentResponse>(&data)
                    .inspect_err(|e| {
                        tracing::error!("Parsing gemini chunk failed for {}\nError:{}", data, e)
                    })?;
                if let Some(text) = resp.text().filter(|t| !t.is_empty()) {
                    content_buf.push_str(&text);
                    let _ = tx.send(text);
                }
                if resp.is_finished() {
                    break 'outer;
                }
            }
        }

        Ok(content_buf)
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String, Error> {
        let payload = Self::payload(&[Message::new(Role::User, prompt)], options);
        let resp: Value = reqwest::Client::new()
            .post(self.url("generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .timeout(Duration::from_secs(60))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        serde_json::from_value::<GenerateContentResponse>(resp.clone())?
            .text()
            .ok_or(anyhow!("No content received. Resp:\n\n {}", resp))
    }

    fn provider_name(&self) -> &'static str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_maps_roles() {
        let messages = vec![
            Message::new(Role::System, "Be brief"),
            Message::new(Role::User, "Hi"),
            Message::new(Role::Assistant, "Hello"),
            Message::new(Role::Data, "{}"),
        ];
        let payload = GeminiProvider::payload(&messages, &GenerateOptions::default());

        assert_eq!(payload["systemInstruction"]["parts"][0]["text"], "Be brief");
        let contents = payload["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert!(payload.get("generationConfig").is_none());
    }

    #[test]
    fn test_payload_generation_config() {
        let options = GenerateOptions {
            max_tokens: Some(20),
            temperature: Some(0.5),
        };
        let payload = GeminiProvider::payload(&[Message::new(Role::User, "Hi")], &options);
        assert_eq!(payload["generationConfig"]["maxOutputTokens"], 20);
        assert_eq!(payload["generationConfig"]["temperature"], 0.5);
    }

    #[tokio::test]
    async fn test_generate() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Rust "},{"text":"Ownership"}]},"finishReason":"STOP"}]}"#,
            )
            .create_async()
            .await;

        let provider = GeminiProvider::new(&server.url(), "test-key", "gemini-2.0-flash");
        let result = provider.generate("Title?", &GenerateOptions::default()).await;

        mock.assert_async().await;
        assert_eq!(result.unwrap(), "Rust Ownership");
    }

    #[tokio::test]
    async fn test_stream() {
        let mut server = mockito::Server::new_async().await;
        let sse_response = "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Hel\"}]}}]}\r\n\r\ndata: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"lo\"}]},\"finishReason\":\"STOP\"}]}\r\n\r\n";
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:streamGenerateContent")
            .match_query(mockito::Matcher::UrlEncoded("alt".into(), "sse".into()))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_response)
            .create_async()
            .await;

        let provider = GeminiProvider::new(&server.url(), "test-key", "gemini-2.0-flash");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = provider
            .stream(tx, &[Message::new(Role::User, "Hi")])
            .await;

        mock.assert_async().await;
        assert_eq!(result.unwrap(), "Hello");
        assert_eq!(rx.try_recv().unwrap(), "Hel");
        assert_eq!(rx.try_recv().unwrap(), "lo");
    }
}
