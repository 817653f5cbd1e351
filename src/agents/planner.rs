use anyhow::{bail, Context, Result};

use crate::llm::client::LlmClient;
use crate::llm::prompts;
use crate::reference::ReferenceExample;

/// Turns methodology text into a detailed textual description of the figure,
/// and revises that description when the critic asks for changes.
pub struct PlannerAgent<'a> {
    client: &'a dyn LlmClient,
    custom_prompt: Option<String>,
}

impl<'a> PlannerAgent<'a> {
    pub fn new(client: &'a dyn LlmClient) -> Self {
        Self {
            client,
            custom_prompt: None,
        }
    }

    pub fn with_custom_prompt(mut self, custom: Option<String>) -> Self {
        self.custom_prompt = custom;
        self
    }

    pub async fn plan(
        &self,
        methodology: &str,
        caption: &str,
        references: &[ReferenceExample],
    ) -> Result<String> {
        let prompt = prompts::planning_prompt(
            methodology,
            caption,
            references,
            self.custom_prompt.as_deref(),
        );
        let description = self
            .client
            .complete(&prompt)
            .await
            .context("planner LLM call failed")?;
        non_empty(description, "planner")
    }

    /// Rewrite the description from a refinement prompt built by the critic.
    pub async fn revise(&self, refinement_prompt: &str) -> Result<String> {
        let description = self
            .client
            .complete(refinement_prompt)
            .await
            .context("refinement LLM call failed")?;
        non_empty(description, "refinement")
    }
}

pub(crate) fn non_empty(text: String, stage: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        bail!("{} returned an empty description", stage);
    }
    Ok(trimmed.to_string())
}
