//! The user-facing side of the client: blocking notices and confirmations

use async_trait::async_trait;
use log::info;

/// Port through which the client talks to whoever is driving it
#[async_trait]
pub trait Prompt: Send + Sync {
    /// Show a notice and wait for it to be acknowledged
    async fn notify(&self, message: &str);

    /// Ask a yes/no question
    async fn confirm(&self, message: &str) -> bool;
}

/// Non-interactive prompt that logs notices and answers every confirmation
/// with a fixed value
#[derive(Debug, Clone, Copy)]
pub struct AutoPrompt {
    answer: bool,
}

impl AutoPrompt {
    /// A prompt that confirms everything
    pub fn accepting() -> Self {
        Self { answer: true }
    }

    /// A prompt that declines everything
    pub fn declining() -> Self {
        Self { answer: false }
    }
}

#[async_trait]
impl Prompt for AutoPrompt {
    async fn notify(&self, message: &str) {
        info!("notice: {}", message);
    }

    async fn confirm(&self, message: &str) -> bool {
        info!("confirm: {} -> {}", message, self.answer);
        self.answer
    }
}
