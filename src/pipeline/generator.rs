use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::history::{DescriptionKind, History};
use crate::agents::{CriticAgent, Mode, PlannerAgent, RetrieverAgent, StylistAgent, VisualizerAgent};
use crate::config::PromptsConfig;
use crate::llm::client::{ImageClient, LlmClient};
use crate::reference::ReferenceExample;
use crate::util::with_suffix;

/// Per-run switches (ablations and plot data).
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub skip_retrieval: bool,
    pub skip_styling: bool,
    pub skip_refinement: bool,
    /// Data handed to the plot-code prompt
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Image (diagram mode) or script (plot mode) from the last round
    pub final_image_path: Option<PathBuf>,
    pub final_description: String,
    /// Number of visualization rounds that ran
    pub iterations: usize,
    pub history: History,
}

impl GenerationResult {
    pub fn save_history<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.history.save(path)
    }
}

pub struct Pipeline {
    client: Box<dyn LlmClient>,
    image_client: Box<dyn ImageClient>,
    code_client: Option<Box<dyn LlmClient>>, // Plot mode; falls back to `client`
    reference_set: Vec<ReferenceExample>,
    guidelines: Option<String>,
    prompts_config: PromptsConfig,
    mode: Mode,
    max_iterations: usize,
    num_references: usize,
}

impl Pipeline {
    pub fn new(client: Box<dyn LlmClient>, image_client: Box<dyn ImageClient>) -> Self {
        Self {
            client,
            image_client,
            code_client: None,
            reference_set: Vec::new(),
            guidelines: None,
            prompts_config: PromptsConfig::default(),
            mode: Mode::Diagram,
            max_iterations: 3,
            num_references: 10,
        }
    }

    pub fn with_code_client(mut self, client: Box<dyn LlmClient>) -> Self {
        self.code_client = Some(client);
        self
    }

    pub fn with_reference_set(mut self, reference_set: Vec<ReferenceExample>) -> Self {
        self.reference_set = reference_set;
        self
    }

    pub fn with_guidelines(mut self, guidelines: Option<String>) -> Self {
        self.guidelines = guidelines;
        self
    }

    pub fn with_prompts_config(mut self, config: PromptsConfig) -> Self {
        self.prompts_config = config;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// At least one visualization round always runs.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        if max_iterations == 0 {
            warn!("max_iterations must be at least 1, using 1");
        }
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_num_references(mut self, n: usize) -> Self {
        self.num_references = n;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    fn visualizer(&self) -> VisualizerAgent<'_> {
        let agent = match self.mode {
            Mode::Diagram => VisualizerAgent::diagram(self.image_client.as_ref()),
            Mode::Plot => VisualizerAgent::plot(
                self.code_client
                    .as_deref()
                    .unwrap_or(self.client.as_ref()),
            ),
        };
        agent.with_custom_prompt(self.prompts_config.visualizer_custom.clone())
    }

    /// Run retrieve → plan → style → (visualize → critique → refine)* for one
    /// methodology/caption pair. Round `i` writes next to `{output_base}_iter{i}`.
    pub async fn generate(
        &self,
        methodology: &str,
        caption: &str,
        output_base: &Path,
        options: &GenerateOptions,
    ) -> Result<GenerationResult> {
        info!("Starting PaperBanana pipeline ({} mode)", self.mode);
        let mut history = History::default();

        let client = self.client.as_ref();
        let planner = PlannerAgent::new(client)
            .with_custom_prompt(self.prompts_config.planner_custom.clone());
        let stylist = StylistAgent::new(client)
            .with_guidelines(self.guidelines.clone())
            .with_custom_prompt(self.prompts_config.stylist_custom.clone());
        let critic = CriticAgent::new(client, self.max_iterations)
            .with_custom_prompt(self.prompts_config.critic_custom.clone());
        let visualizer = self.visualizer();

        // Step 1: Retrieve reference examples
        let references = if options.skip_retrieval {
            info!("[1/5] Retriever Agent: Skipped");
            Vec::new()
        } else if self.reference_set.is_empty() {
            info!("[1/5] Retriever Agent: Skipped (no reference set)");
            Vec::new()
        } else {
            info!("[1/5] Retriever Agent: Finding relevant examples...");
            let retrieved = RetrieverAgent::new(client, &self.reference_set)
                .with_custom_prompt(self.prompts_config.retriever_custom.clone())
                .retrieve(methodology, caption, self.num_references)
                .await?;
            info!("  ✓ Retrieved {} reference examples", retrieved.len());
            retrieved
        };
        history.reference_examples = references.clone();

        // Step 2: Initial planning
        info!("[2/5] Planner Agent: Creating initial description...");
        let mut description = planner.plan(methodology, caption, &references).await?;
        history.record_description(0, &description, DescriptionKind::Initial);
        info!("  ✓ Generated initial description ({} chars)", description.len());

        // Step 3: Aesthetic styling
        if options.skip_styling {
            info!("[3/5] Stylist Agent: Skipped");
        } else {
            info!("[3/5] Stylist Agent: Applying aesthetic guidelines...");
            description = stylist.refine(&description).await?;
            history.record_description(0, &description, DescriptionKind::Styled);
            info!("  ✓ Applied styling ({} chars)", description.len());
        }

        // Steps 4 & 5: visualize, critique, refine
        let mut final_path = None;
        let mut iterations = 0;

        for iteration in 1..=self.max_iterations {
            info!(
                "[4/5] Visualizer Agent: Generating {} (iteration {}/{})...",
                self.mode, iteration, self.max_iterations
            );
            let round_base = with_suffix(output_base, &format!("_iter{}", iteration));
            let path = visualizer
                .visualize(&description, &round_base, options.data.as_ref())
                .await?;
            history.record_image(iteration, &path, &description);
            info!("  ✓ Generated: {}", path.display());
            final_path = Some(path.clone());
            iterations = iteration;

            if options.skip_refinement || iteration >= self.max_iterations {
                break;
            }

            info!("[5/5] Critic Agent: Evaluating result (iteration {})...", iteration);
            let critique = critic
                .critique(methodology, caption, &description, Some(&path), iteration)
                .await?;
            let counts = critique.severity_counts();
            info!(
                "  ✓ Found {} issues ({} critical, {} major, {} minor)",
                critique.issues.len(),
                counts.critical,
                counts.major,
                counts.minor
            );
            for (i, issue) in critique.issues.iter().take(3).enumerate() {
                info!("    {}. {}", i + 1, truncate(issue, 80));
            }
            let should_continue = critique.should_continue;
            let refinement_prompt = critique.refinement_prompt(&description);
            history.critiques.push(critique);

            if !should_continue {
                info!("  ✓ Critic: Quality threshold reached, stopping refinement");
                break;
            }

            info!(
                "[2/5] Planner Agent: Refining description (iteration {})...",
                iteration + 1
            );
            description = planner.revise(&refinement_prompt).await?;
            history.record_description(iteration, &description, DescriptionKind::Refined);
            info!("  ✓ Refined description ({} chars)", description.len());

            if !options.skip_styling {
                info!("[3/5] Stylist Agent: Re-applying aesthetic guidelines...");
                description = stylist.refine(&description).await?;
                history.record_description(iteration, &description, DescriptionKind::RefinedStyled);
                info!("  ✓ Applied styling ({} chars)", description.len());
            }
        }

        info!("Generation complete after {} iteration(s)", iterations);
        if let Some(ref path) = final_path {
            info!("Final output: {}", path.display());
        }
        info!("Total descriptions generated: {}", history.descriptions.len());

        Ok(GenerationResult {
            final_image_path: final_path,
            final_description: description,
            iterations,
            history,
        })
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    }
}
