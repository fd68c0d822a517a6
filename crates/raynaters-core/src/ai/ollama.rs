use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::backend::ModelBackend;
use crate::state::{ChatRole, ChatTurn};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaChatMessage,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

#[derive(Deserialize)]
struct OllamaModelsResponse {
    models: Vec<OllamaModel>,
}

/// Ollama's `format` takes standard JSON Schema, whose type names are
/// lowercase (`"object"`, not Gemini's `"OBJECT"`).
fn to_json_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = match (key.as_str(), value) {
                        ("type", Value::String(ty)) => Value::String(ty.to_lowercase()),
                        _ => to_json_schema(value),
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(to_json_schema).collect()),
        other => other.clone(),
    }
}

#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to list models: {}: {}", status, text));
        }

        let models_response: OllamaModelsResponse = response.json().await?;
        Ok(models_response
            .models
            .into_iter()
            .map(|model| model.name)
            .collect())
    }
}

#[async_trait]
impl ModelBackend for OllamaClient {
    async fn generate_structured(&self, model: &str, prompt: &str, schema: &Value) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        debug!(%model, "sending Ollama structured request");

        let request = OllamaGenerateRequest {
            model,
            prompt,
            stream: false,
            format: Some(to_json_schema(schema)),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Ollama request failed with status: {}: {}. Make sure Ollama is running with: ollama serve",
                status,
                text
            ));
        }

        let ollama_response: OllamaGenerateResponse = response.json().await?;
        Ok(ollama_response.response)
    }

    async fn converse(
        &self,
        model: &str,
        persona: &str,
        transcript: &[ChatTurn],
        message: &str,
    ) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(%model, turns = transcript.len(), "sending Ollama chat request");

        let mut messages = Vec::with_capacity(transcript.len() + 2);
        messages.push(OllamaMessage {
            role: "system",
            content: persona,
        });
        messages.extend(transcript.iter().map(|turn| OllamaMessage {
            role: match turn.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content: &turn.content,
        }));
        messages.push(OllamaMessage {
            role: "user",
            content: message,
        });

        let request = OllamaChatRequest {
            model,
            messages,
            stream: false,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Ollama chat failed with status: {}: {}. Make sure Ollama is running with: ollama serve",
                status,
                text
            ));
        }

        let chat_response: OllamaChatResponse = response.json().await?;
        Ok(chat_response.message.content)
    }
}
