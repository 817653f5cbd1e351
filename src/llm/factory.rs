use anyhow::Result;

use super::client::{ImageClient, LlmClient, MockLlmClient};
use super::client_impl::GeminiClient;
use crate::config::{resolve_api_key, LlmConfig};
use crate::error::PipelineError;

/// Which model and request shape a client is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRole {
    /// Retriever, planner, stylist, critic
    Reasoning,
    /// Visualizer in plot mode
    PlotCode,
    /// Visualizer in diagram mode
    Image,
}

fn build_gemini(llm_config: &LlmConfig, role: ClientRole) -> Result<GeminiClient> {
    let api_key = resolve_api_key(llm_config)?;
    let model = match role {
        ClientRole::Image => llm_config.image_model.clone(),
        ClientRole::Reasoning | ClientRole::PlotCode => llm_config.vlm_model.clone(),
    };
    let max_tokens = llm_config.get_max_tokens();

    let client = match &llm_config.base_url {
        Some(base_url) => GeminiClient::with_base_url(
            api_key,
            model,
            base_url.clone(),
            max_tokens,
            llm_config.timeout_secs,
        )?,
        None => GeminiClient::new(api_key, model, max_tokens, llm_config.timeout_secs)?,
    };

    Ok(match role {
        ClientRole::Reasoning => client.with_thinking_level(&llm_config.thinking_level),
        ClientRole::PlotCode => client.with_thinking_level(&llm_config.plot_thinking_level),
        ClientRole::Image => client.with_image_size(&llm_config.image_size),
    })
}

fn check_provider(llm_config: &LlmConfig) -> Result<()> {
    match llm_config.provider.as_str() {
        "gemini" => Ok(()),
        unknown => Err(PipelineError::UnknownProvider(unknown.to_string()).into()),
    }
}

/// Create a text client for the given role (Reasoning or PlotCode).
pub fn create_text_client(
    llm_config: &LlmConfig,
    role: ClientRole,
    dry_run: bool,
) -> Result<Box<dyn LlmClient>> {
    if dry_run {
        return Ok(Box::new(MockLlmClient::new()));
    }
    check_provider(llm_config)?;
    Ok(Box::new(build_gemini(llm_config, role)?))
}

/// Create the image generation client used by the visualizer.
pub fn create_image_client(llm_config: &LlmConfig, dry_run: bool) -> Result<Box<dyn ImageClient>> {
    if dry_run {
        return Ok(Box::new(MockLlmClient::new()));
    }
    check_provider(llm_config)?;
    Ok(Box::new(build_gemini(llm_config, ClientRole::Image)?))
}
