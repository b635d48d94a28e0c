use async_trait::async_trait;
use tracing::debug;

use crate::application::ChatClient;
use crate::domain::{Completion, DomainError, TokenUsage};

/// Offline chat client that answers by quoting the first context entry of the
/// prompt along with its source line.
///
/// Token usage is approximated by whitespace word counts.
#[derive(Default)]
pub struct MockChatClient;

impl MockChatClient {
    pub fn new() -> Self {
        Self
    }

    fn first_entry(user: &str) -> Option<(&str, &str)> {
        const OPEN: &str = "[1] '";
        const SOURCE: &str = "'\n    Source: ";

        let rest = &user[user.find(OPEN)? + OPEN.len()..];
        let end = rest.find(SOURCE)?;
        let source = rest[end + SOURCE.len()..].lines().next()?;
        Some((&rest[..end], source))
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<Completion, DomainError> {
        let text = match Self::first_entry(user) {
            Some((quote, source)) => format!("{quote} [Source: {source}]"),
            None => crate::domain::NO_EVIDENCE_ANSWER.to_string(),
        };

        let usage = TokenUsage {
            input_tokens: (system.split_whitespace().count() + user.split_whitespace().count())
                as u32,
            output_tokens: text.split_whitespace().count() as u32,
        };
        debug!("Mock completion used {} tokens", usage.total());

        Ok(Completion { text, usage })
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}
