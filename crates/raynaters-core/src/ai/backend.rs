use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::state::ChatTurn;

/// A hosted or local text-generation service.
///
/// Each method is exactly one outbound request. Implementations must not
/// retry or cache; failures are returned to the caller as-is.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Ask for a JSON document constrained to `schema` and return its raw text.
    async fn generate_structured(&self, model: &str, prompt: &str, schema: &Value) -> Result<String>;

    /// Continue a conversation under `persona`. `transcript` holds every prior
    /// turn in order; `message` is the new user text.
    async fn converse(
        &self,
        model: &str,
        persona: &str,
        transcript: &[ChatTurn],
        message: &str,
    ) -> Result<String>;
}
