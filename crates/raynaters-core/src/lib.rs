pub mod ai;
pub mod companion;
pub mod config;
pub mod proposal;
pub mod provider;
pub mod state;
pub mod widget;

// Re-export main types for convenience
pub use ai::{GeminiClient, ModelBackend, OllamaClient};
pub use companion::{CompanionChat, FALLBACK_REPLY};
pub use config::{Config, Connection};
pub use proposal::{AutomationProposal, EfficiencyPoint, ProposalError, ProposalGenerator};
pub use provider::Provider;
pub use state::{ChatRole, ChatSession, ChatTurn, ProposalDesk, ProposalStatus};
pub use widget::{CompanionWidget, Section, WidgetView};
