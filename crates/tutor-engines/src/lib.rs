// crates/tutor-engines/src/lib.rs
use std::sync::Arc;

use tutor_core::config::LlmConfig;

pub mod fallback;
pub mod llm;
pub mod openai;
pub mod prompts;
pub mod rule_based;

pub use fallback::FallbackCoordinator;
pub use llm::LlmStrategy;
pub use openai::OpenAiChatClient;
pub use rule_based::RuleBasedStrategy;

/// The OpenAI-backed strategy with the rule-based one as its fallback.
pub fn create_coordinator(config: &LlmConfig) -> FallbackCoordinator {
    let client = Arc::new(OpenAiChatClient::new(config.clone()));
    let primary = LlmStrategy::new(client).with_timeout(config.timeout());
    FallbackCoordinator::new(Arc::new(primary), Arc::new(RuleBasedStrategy))
}
