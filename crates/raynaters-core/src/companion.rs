use std::sync::Arc;

use tracing::warn;

use crate::ai::ModelBackend;
use crate::state::ChatTurn;

/// Returned in place of a reply whenever the model call fails.
pub const FALLBACK_REPLY: &str = "My neural link is experiencing interference. Please try again.";

pub const PERSONA: &str = "\
You are Raynaters, the sentient AI navigator for the Raynaters Automation Agency website.
Your personality is: Futuristic, helpful, concise, and professional yet witty.
You are currently chatting with a visitor on the website.

KNOWLEDGE BASE:
1. HERO/PROJECTS: We build Sentient Sales_OS (Revenue Auto), Nexus Support_Bot (CX), Data Core_Link (Infra), Talent Scout_AI (HR), and Market Watch_Pro.
2. SERVICES: Business Automation, Data Intelligence, App Development, AI Consulting, Generative Support.
3. TESTIMONIALS: Clients like Acme Corp and TechFlow love us. We save 40+ hours/week for clients.
4. CONTACT: We offer a free strategy call. We text within 15 minutes.

RULES:
- Keep answers short (under 50 words) unless asked for detail.
- If asked about services, ask which one interests them.
- Always encourage booking a strategy call for specific implementations.
- You can explain the \"Intelligence Archives\" (the portfolio items) in detail.
";

/// The site's chat companion. Stateless: the full transcript is passed in on
/// every call.
#[derive(Clone)]
pub struct CompanionChat {
    backend: Arc<dyn ModelBackend>,
    model: String,
}

impl CompanionChat {
    pub fn new(backend: Arc<dyn ModelBackend>, model: &str) -> Self {
        Self {
            backend,
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Reply to `new_user_text` given everything said before it.
    ///
    /// Never fails: any backend error is logged and replaced with
    /// [`FALLBACK_REPLY`]. The reply is otherwise returned verbatim.
    pub async fn continue_chat(&self, prior_turns: &[ChatTurn], new_user_text: &str) -> String {
        match self
            .backend
            .converse(&self.model, PERSONA, prior_turns, new_user_text)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(model = %self.model, "companion chat failed: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }
}
