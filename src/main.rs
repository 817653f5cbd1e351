use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use paperbanana::cli;
use paperbanana::cli::generate::GenerateArgs;

#[derive(Parser)]
#[command(name = "paperbanana", version)]
#[command(about = "Generate academic illustrations from methodology text", long_about = None)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a diagram (or plot code) for a methodology section
    Generate(GenerateArgs),

    /// Show statistics for a reference-set JSON file
    References {
        path: String,

        /// Count only entries whose image file exists
        #[arg(long)]
        require_images: bool,
    },

    /// List built-in example inputs
    Presets,

    /// Check config, API key and referenced files
    ConfigCheck {
        #[arg(long)]
        config: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => return Err(e.into()),
    }

    match cli.command {
        Commands::Generate(args) => {
            cli::generate::run(args).await?;
        }
        Commands::References {
            path,
            require_images,
        } => {
            cli::references::run(&path, require_images)?;
        }
        Commands::Presets => cli::presets::run(),
        Commands::ConfigCheck { config } => cli::config_check::run(config)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_generate_defaults() {
        let cli = Cli::try_parse_from(["paperbanana", "generate", "--preset", "ResNet"]).unwrap();
        assert!(!cli.verbose);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.preset.unwrap(), "ResNet");
                assert_eq!(args.output, "output/diagram");
                assert!(args.iterations.is_none());
                assert!(!args.dry_run);
                assert!(!args.skip_refinement);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_parse_generate_with_all_args() {
        let cli = Cli::try_parse_from([
            "paperbanana",
            "generate",
            "--methodology-file",
            "method.txt",
            "--caption",
            "Fig. 2",
            "--output",
            "out/fig2",
            "--mode",
            "plot",
            "--iterations",
            "4",
            "--references",
            "refs.json",
            "--data",
            "data.json",
            "--skip-retrieval",
            "--skip-styling",
            "--history",
            "h.json",
            "--model",
            "gemini-x",
            "--image-model",
            "gemini-img",
            "--dry-run",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.methodology_file.unwrap(), "method.txt");
                assert_eq!(args.caption.unwrap(), "Fig. 2");
                assert_eq!(args.output, "out/fig2");
                assert_eq!(args.mode.unwrap(), "plot");
                assert_eq!(args.iterations, Some(4));
                assert_eq!(args.references.unwrap(), "refs.json");
                assert_eq!(args.data.unwrap(), "data.json");
                assert!(args.skip_retrieval);
                assert!(args.skip_styling);
                assert!(!args.skip_refinement);
                assert_eq!(args.history.unwrap(), "h.json");
                assert_eq!(args.model.unwrap(), "gemini-x");
                assert_eq!(args.image_model.unwrap(), "gemini-img");
                assert!(args.dry_run);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_parse_preset_conflicts_with_file() {
        let result = Cli::try_parse_from([
            "paperbanana",
            "generate",
            "--preset",
            "DDPM",
            "--methodology-file",
            "m.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_references() {
        let cli =
            Cli::try_parse_from(["paperbanana", "references", "refs.json", "--require-images"])
                .unwrap();
        match cli.command {
            Commands::References {
                path,
                require_images,
            } => {
                assert_eq!(path, "refs.json");
                assert!(require_images);
            }
            _ => panic!("expected references"),
        }
    }

    #[test]
    fn test_parse_config_check() {
        let cli =
            Cli::try_parse_from(["paperbanana", "config-check", "--config", "x.toml"]).unwrap();
        match cli.command {
            Commands::ConfigCheck { config } => assert_eq!(config.unwrap(), "x.toml"),
            _ => panic!("expected config-check"),
        }
    }

    #[test]
    fn test_parse_missing_subcommand() {
        assert!(Cli::try_parse_from(["paperbanana"]).is_err());
    }

    #[test]
    fn test_parse_unknown_subcommand() {
        assert!(Cli::try_parse_from(["paperbanana", "foobar"]).is_err());
    }
}
