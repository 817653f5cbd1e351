use anyhow::{Context, Result};

use super::planner::non_empty;
use crate::guidelines::AESTHETIC_GUIDELINE;
use crate::llm::client::LlmClient;
use crate::llm::prompts;

/// Polishes a description with concrete colors, shapes and typography taken
/// from the aesthetic guidelines.
pub struct StylistAgent<'a> {
    client: &'a dyn LlmClient,
    guidelines: String,
    custom_prompt: Option<String>,
}

impl<'a> StylistAgent<'a> {
    pub fn new(client: &'a dyn LlmClient) -> Self {
        Self {
            client,
            guidelines: AESTHETIC_GUIDELINE.to_string(),
            custom_prompt: None,
        }
    }

    /// Replace the built-in guidelines. `None` keeps the defaults.
    pub fn with_guidelines(mut self, guidelines: Option<String>) -> Self {
        if let Some(g) = guidelines {
            self.guidelines = g;
        }
        self
    }

    pub fn with_custom_prompt(mut self, custom: Option<String>) -> Self {
        self.custom_prompt = custom;
        self
    }

    pub fn guidelines(&self) -> &str {
        &self.guidelines
    }

    pub async fn refine(&self, description: &str) -> Result<String> {
        let prompt =
            prompts::styling_prompt(description, &self.guidelines, self.custom_prompt.as_deref());
        let styled = self
            .client
            .complete(&prompt)
            .await
            .context("stylist LLM call failed")?;
        non_empty(styled, "stylist")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::MockLlmClient;

    #[test]
    fn test_default_and_custom_guidelines() {
        let client = MockLlmClient::new();
        let stylist = StylistAgent::new(&client);
        assert_eq!(stylist.guidelines(), AESTHETIC_GUIDELINE);

        let stylist = StylistAgent::new(&client).with_guidelines(None);
        assert_eq!(stylist.guidelines(), AESTHETIC_GUIDELINE);

        let stylist = StylistAgent::new(&client).with_guidelines(Some("mono".to_string()));
        assert_eq!(stylist.guidelines(), "mono");
    }

    #[tokio::test]
    async fn test_refine_returns_styled_text() {
        let client = MockLlmClient::new();
        let styled = StylistAgent::new(&client).refine("plain").await.unwrap();
        assert!(styled.contains("#FFF8E7"));
    }
}
