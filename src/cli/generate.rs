use anyhow::{bail, Context, Result};
use clap::Args;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::agents::Mode;
use crate::config::{Config, DEFAULT_MAX_ITERATIONS};
use crate::guidelines::load_guidelines;
use crate::llm::factory::{self, ClientRole};
use crate::pipeline::{GenerateOptions, GenerationResult, Pipeline};
use crate::presets::{find_preset, PRESETS};
use crate::reference::load_reference_set;

#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// File with the methodology section ("-" reads stdin)
    #[arg(short = 'm', long, conflicts_with = "preset")]
    pub methodology_file: Option<String>,

    /// Use a built-in example input (see `presets`). Its suggested iteration
    /// count applies unless --iterations or a non-default config value is set
    #[arg(long)]
    pub preset: Option<String>,

    /// Figure caption (defaults to the preset's caption)
    #[arg(short = 'c', long)]
    pub caption: Option<String>,

    /// Output base path; rounds write `{output}_iter{n}_{k}.{ext}`
    #[arg(short = 'o', long, default_value = "output/diagram")]
    pub output: String,

    /// diagram or plot (default: from config)
    #[arg(long)]
    pub mode: Option<String>,

    /// Maximum visualize/critique rounds (default: from config)
    #[arg(short = 'n', long)]
    pub iterations: Option<usize>,

    /// Reference set JSON
    #[arg(long)]
    pub references: Option<String>,

    /// Drop references whose image file is missing
    #[arg(long)]
    pub require_reference_images: bool,

    /// Replace the built-in aesthetic guidelines
    #[arg(long)]
    pub guidelines: Option<String>,

    /// JSON data for plot mode
    #[arg(long)]
    pub data: Option<String>,

    #[arg(long)]
    pub skip_retrieval: bool,

    #[arg(long)]
    pub skip_styling: bool,

    #[arg(long)]
    pub skip_refinement: bool,

    /// Write the generation history as JSON
    #[arg(long)]
    pub history: Option<String>,

    /// Path to config file (defaults to ./paperbanana.toml or ~/.config/paperbanana/config.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Override the text/vision model
    #[arg(long)]
    pub model: Option<String>,

    /// Override the image model
    #[arg(long)]
    pub image_model: Option<String>,

    /// Use mock clients instead of calling the API
    #[arg(long)]
    pub dry_run: bool,
}

/// Methodology and caption after resolving `--preset` / `--methodology-file`.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationInput {
    pub methodology: String,
    pub caption: String,
    /// Suggested iteration count from a preset
    pub suggested_iterations: Option<usize>,
}

pub fn resolve_input(args: &GenerateArgs) -> Result<GenerationInput> {
    if let Some(ref name) = args.preset {
        let Some(preset) = find_preset(name) else {
            let names: Vec<_> = PRESETS.iter().map(|p| p.name).collect();
            bail!("Unknown preset '{}'. Available: {}", name, names.join(", "));
        };
        info!("Using preset: {}", preset.name);
        return Ok(GenerationInput {
            methodology: preset.methodology.to_string(),
            caption: args
                .caption
                .clone()
                .unwrap_or_else(|| preset.caption.to_string()),
            suggested_iterations: Some(preset.iterations),
        });
    }

    let Some(ref path) = args.methodology_file else {
        bail!("Provide --methodology-file or --preset");
    };
    let methodology = read_methodology(path)?;
    let Some(ref caption) = args.caption else {
        bail!("--caption is required with --methodology-file");
    };
    Ok(GenerationInput {
        methodology,
        caption: caption.clone(),
        suggested_iterations: None,
    })
}

fn read_methodology(path: &str) -> Result<String> {
    let text = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read methodology from stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?
    };
    if text.trim().is_empty() {
        bail!("methodology text is empty");
    }
    Ok(text)
}

fn read_data(path: &str) -> Result<serde_json::Value> {
    let content = fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse JSON in {}", path))
}

/// Fold CLI flags into the loaded config, logging each override.
pub fn apply_overrides(config: &mut Config, args: &GenerateArgs) {
    if let Some(ref mode) = args.mode {
        info!("CLI override: mode = {}", mode);
        config.generation.mode = mode.clone();
    }
    if let Some(n) = args.iterations {
        info!("CLI override: max_iterations = {}", n);
        config.generation.max_iterations = n;
    }
    if let Some(ref path) = args.references {
        info!("CLI override: reference_set = {}", path);
        config.generation.reference_set = Some(path.clone());
    }
    if args.require_reference_images {
        info!("CLI override: require_reference_images = true");
        config.generation.require_reference_images = true;
    }
    if let Some(ref path) = args.guidelines {
        info!("CLI override: guidelines_file = {}", path);
        config.prompts.guidelines_file = Some(path.clone());
    }
    if let Some(ref model) = args.model {
        info!("CLI override: vlm_model = {}", model);
        config.llm.vlm_model = model.clone();
    }
    if let Some(ref model) = args.image_model {
        info!("CLI override: image_model = {}", model);
        config.llm.image_model = model.clone();
    }
}

/// Use the preset's suggested iteration count unless `--iterations` was given
/// or the config already moved `max_iterations` off its default.
pub fn apply_preset_iterations(config: &mut Config, args: &GenerateArgs, input: &GenerationInput) {
    let Some(n) = input.suggested_iterations else {
        return;
    };
    if args.iterations.is_some() || config.generation.max_iterations != DEFAULT_MAX_ITERATIONS {
        debug!(
            "Keeping max_iterations = {} over preset suggestion {}",
            config.generation.max_iterations, n
        );
        return;
    }
    info!("Using preset iteration count: {}", n);
    config.generation.max_iterations = n;
}

/// Assemble a pipeline from config. Mock clients are used for `dry_run`.
pub fn build_pipeline(config: &Config, dry_run: bool) -> Result<Pipeline> {
    let mode = config.generation.get_mode()?;

    let client = factory::create_text_client(&config.llm, ClientRole::Reasoning, dry_run)?;
    let image_client = factory::create_image_client(&config.llm, dry_run)?;

    let reference_set = match config.generation.reference_set {
        Some(ref path) => {
            load_reference_set(path, config.generation.require_reference_images)?
        }
        None => Vec::new(),
    };

    let guidelines = match config.prompts.guidelines_file {
        Some(ref path) => Some(load_guidelines(path)?),
        None => None,
    };

    let mut pipeline = Pipeline::new(client, image_client)
        .with_mode(mode)
        .with_max_iterations(config.generation.max_iterations)
        .with_num_references(config.generation.num_reference_examples)
        .with_reference_set(reference_set)
        .with_guidelines(guidelines)
        .with_prompts_config(config.prompts.clone());

    if mode == Mode::Plot {
        pipeline = pipeline.with_code_client(factory::create_text_client(
            &config.llm,
            ClientRole::PlotCode,
            dry_run,
        )?);
    }

    Ok(pipeline)
}

pub async fn run(args: GenerateArgs) -> Result<GenerationResult> {
    let mut config = Config::load_with_path(args.config.clone())?;
    apply_overrides(&mut config, &args);

    let input = resolve_input(&args)?;
    apply_preset_iterations(&mut config, &args, &input);

    let data = match args.data {
        Some(ref path) => Some(read_data(path)?),
        None => None,
    };

    let pipeline = build_pipeline(&config, args.dry_run)?;
    if data.is_some() && config.generation.get_mode()? == Mode::Diagram {
        warn!("--data is only used in plot mode; ignoring");
    }

    info!("Output: {}", args.output);
    info!("Dry run: {}", args.dry_run);

    let options = GenerateOptions {
        skip_retrieval: args.skip_retrieval,
        skip_styling: args.skip_styling,
        skip_refinement: args.skip_refinement,
        data,
    };
    let result = pipeline
        .generate(
            &input.methodology,
            &input.caption,
            Path::new(&args.output),
            &options,
        )
        .await?;

    if let Some(ref path) = args.history {
        result.save_history(PathBuf::from(path))?;
    }

    print_summary(&result);
    Ok(result)
}

fn print_summary(result: &GenerationResult) {
    println!();
    match result.final_image_path {
        Some(ref path) => println!("  \u{2713} Final output: {}", path.display()),
        None => println!("  \u{2717} No output produced"),
    }
    println!("  Iterations: {}", result.iterations);
    println!("  Critiques: {}", result.history.critiques.len());
}
