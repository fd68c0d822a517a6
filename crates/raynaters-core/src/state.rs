//! UI-agnostic conversation and proposal state
//!
//! These types are owned by whatever host renders the site (terminal, web
//! view, ...). The integration points in [`crate::companion`] and
//! [`crate::proposal`] are stateless request functions; everything that has
//! to survive between two user actions lives here.

use serde::{Deserialize, Serialize};

use crate::companion::CompanionChat;
use crate::proposal::{AutomationProposal, ProposalError, ProposalGenerator};

pub const GREETING: &str =
    "Greetings. I am Raynaters Unit-01, your autonomous guide. How can I assist your scaling operations today?";

/// Shown in place of a reply that came back empty.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "I didn't catch that.";

/// Shown when a proposal request fails for any reason.
pub const PROPOSAL_FAILURE_MESSAGE: &str =
    "Something went wrong while drafting your proposal. Please try again.";

/// The role of a chat turn's speaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single turn in the companion conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only transcript of one visitor's conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    turns: Vec<ChatTurn>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            turns: vec![ChatTurn::assistant(GREETING)],
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Send `text` to the companion and record both sides of the exchange.
    ///
    /// Blank text is ignored and `None` is returned. Otherwise exactly two
    /// turns are appended (the user's and the assistant's) and the assistant
    /// turn is returned.
    pub async fn send(&mut self, chat: &CompanionChat, text: &str) -> Option<&ChatTurn> {
        if text.trim().is_empty() {
            return None;
        }

        let prior_len = self.turns.len();
        self.turns.push(ChatTurn::user(text));

        let reply = chat.continue_chat(&self.turns[..prior_len], text).await;
        let reply = if reply.is_empty() {
            EMPTY_REPLY_PLACEHOLDER.to_string()
        } else {
            reply
        };

        self.turns.push(ChatTurn::assistant(reply));
        self.turns.last()
    }
}

/// Lifecycle of the proposal panel.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ProposalStatus {
    #[default]
    Idle,
    Generating,
    Complete(AutomationProposal),
    Error(String),
}

/// Host-side state for the proposal panel.
///
/// `begin` and `finish` are split so a host can render the `Generating`
/// state while the request is in flight; `submit` runs both for hosts that
/// simply await.
#[derive(Debug, Default)]
pub struct ProposalDesk {
    status: ProposalStatus,
}

impl ProposalDesk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &ProposalStatus {
        &self.status
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.status, ProposalStatus::Generating)
    }

    /// Returns the description to send, or `None` when the input is blank
    /// or a request is already in flight.
    pub fn begin<'a>(&mut self, description: &'a str) -> Option<&'a str> {
        let description = description.trim();
        if self.is_generating() || description.is_empty() {
            return None;
        }
        self.status = ProposalStatus::Generating;
        Some(description)
    }

    pub fn finish(&mut self, result: Result<AutomationProposal, ProposalError>) {
        self.status = match result {
            Ok(proposal) => ProposalStatus::Complete(proposal),
            Err(_) => ProposalStatus::Error(PROPOSAL_FAILURE_MESSAGE.to_string()),
        };
    }

    pub async fn submit(&mut self, generator: &ProposalGenerator, description: &str) -> &ProposalStatus {
        if let Some(description) = self.begin(description) {
            let result = generator.generate_proposal(description).await;
            self.finish(result);
        }
        &self.status
    }
}
