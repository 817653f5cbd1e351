use anyhow::Result;
use std::env;
use std::path::Path;

use crate::config::{Config, LlmConfig};
use crate::guidelines::load_guidelines;
use crate::reference::load_reference_set;

const THINKING_LEVELS: &[&str] = &["MINIMAL", "LOW", "MEDIUM", "HIGH"];
const IMAGE_SIZES: &[&str] = &["1K", "2K", "4K"];

#[derive(Debug, Default)]
pub struct CheckResult {
    pub passed: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl CheckResult {
    fn pass(&mut self, msg: impl Into<String>) {
        self.passed.push(msg.into());
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }
}

pub fn run(config_path: Option<String>) -> Result<()> {
    let results = check(config_path);
    // Problems are reported, not propagated
    print_results(&results);
    Ok(())
}

pub fn check(config_path: Option<String>) -> CheckResult {
    let mut results = CheckResult::default();

    let config = match Config::load_with_path(config_path.clone()) {
        Ok(config) => {
            let source = config_path.as_deref().unwrap_or("default search path");
            results.pass(format!("Config loaded from {}", source));
            config
        }
        Err(e) => {
            results.error(format!("Failed to load config: {:#}", e));
            return results;
        }
    };

    check_llm(&config.llm, &mut results);

    match config.generation.get_mode() {
        Ok(mode) => results.pass(format!(
            "Generation: mode={}, max_iterations={}, num_reference_examples={}",
            mode, config.generation.max_iterations, config.generation.num_reference_examples
        )),
        Err(e) => results.error(e.to_string()),
    }
    if config.generation.max_iterations == 0 {
        results.warn("max_iterations = 0 will be raised to 1");
    }

    match config.generation.reference_set {
        Some(ref path) if !Path::new(path).exists() => {
            results.warn(format!("Reference set {} not found; retrieval will be skipped", path));
        }
        Some(ref path) => {
            match load_reference_set(path, config.generation.require_reference_images) {
                Ok(set) if set.is_empty() => {
                    results.warn(format!("Reference set {} has no usable entries", path))
                }
                Ok(set) => results.pass(format!("Reference set: {} examples from {}", set.len(), path)),
                Err(e) => results.error(format!("Reference set {}: {:#}", path, e)),
            }
        }
        None => results.pass("No reference set configured; retrieval will be skipped"),
    }

    if let Some(ref path) = config.prompts.guidelines_file {
        match load_guidelines(path) {
            Ok(_) => results.pass(format!("Custom guidelines: {}", path)),
            Err(e) => results.error(format!("{:#}", e)),
        }
    }

    results
}

fn check_llm(llm: &LlmConfig, results: &mut CheckResult) {
    if llm.provider == "gemini" {
        results.pass(format!(
            "LLM provider: {} (vlm: {}, image: {})",
            llm.provider, llm.vlm_model, llm.image_model
        ));
    } else {
        results.error(format!("Unknown LLM provider: {} (supported: gemini)", llm.provider));
    }

    check_api_key(&llm.api_key_env, results);

    if let Some(ref base_url) = llm.base_url {
        results.pass(format!("Custom base URL: {}", base_url));
    }

    for (name, level) in [
        ("thinking_level", &llm.thinking_level),
        ("plot_thinking_level", &llm.plot_thinking_level),
    ] {
        if !THINKING_LEVELS.contains(&level.to_uppercase().as_str()) {
            results.warn(format!(
                "{} = {:?} is not one of {}",
                name,
                level,
                THINKING_LEVELS.join(", ")
            ));
        }
    }
    if !IMAGE_SIZES.contains(&llm.image_size.to_uppercase().as_str()) {
        results.warn(format!(
            "image_size = {:?} is not one of {}",
            llm.image_size,
            IMAGE_SIZES.join(", ")
        ));
    }
}

fn check_api_key(api_key_env: &Option<String>, results: &mut CheckResult) {
    match api_key_env {
        Some(env_var) if env_var.eq_ignore_ascii_case("none") => {
            results.pass("API key: not required");
        }
        Some(env_var) => match env::var(env_var) {
            Ok(v) if !v.trim().is_empty() => results.pass(format!("API key: {} is set", env_var)),
            Ok(_) => results.error(format!("API key: {} is set but empty", env_var)),
            Err(_) => results.error(format!("API key: {} is not set", env_var)),
        },
        None => results.warn("API key: no api_key_env configured; requests are unauthenticated"),
    }
}

fn print_results(results: &CheckResult) {
    println!();
    for msg in &results.passed {
        println!("  \u{2713} {}", msg);
    }
    for msg in &results.warnings {
        println!("  ! {}", msg);
    }
    for msg in &results.errors {
        println!("  \u{2717} {}", msg);
    }
    println!();
    println!(
        "{} passed, {} warnings, {} errors",
        results.passed.len(),
        results.warnings.len(),
        results.errors.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    fn write_config(dir: &Path, body: &str) -> String {
        let path = dir.join("config.toml");
        fs::write(&path, body).unwrap();
        path.display().to_string()
    }

    const BASE: &str = r#"
[llm]
provider = "gemini"
vlm_model = "gemini-3-pro-preview"
image_model = "gemini-3-pro-image-preview"
api_key_env = "PAPERBANANA_CHECK_KEY"

[generation]
"#;

    #[test]
    #[serial]
    fn test_key_set_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), BASE);
        env::set_var("PAPERBANANA_CHECK_KEY", "abc");
        let results = check(Some(path));
        env::remove_var("PAPERBANANA_CHECK_KEY");

        assert!(results.errors.is_empty(), "{:?}", results.errors);
        assert!(results
            .passed
            .iter()
            .any(|m| m.contains("PAPERBANANA_CHECK_KEY is set")));
    }

    #[test]
    #[serial]
    fn test_missing_key_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), BASE);
        env::remove_var("PAPERBANANA_CHECK_KEY");
        let results = check(Some(path));
        assert!(results.errors.iter().any(|m| m.contains("is not set")));
    }

    #[test]
    #[serial]
    fn test_empty_key_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), BASE);
        env::set_var("PAPERBANANA_CHECK_KEY", "  ");
        let results = check(Some(path));
        env::remove_var("PAPERBANANA_CHECK_KEY");
        assert!(results.errors.iter().any(|m| m.contains("set but empty")));
    }

    #[test]
    fn test_bad_values_reported() {
        let dir = tempfile::tempdir().unwrap();
        let body = r#"
[llm]
provider = "openai"
vlm_model = "m"
image_model = "i"
api_key_env = "none"
thinking_level = "EXTREME"
image_size = "8K"

[generation]
mode = "chart"
max_iterations = 0
reference_set = "/nonexistent/refs.json"
"#;
        let results = check(Some(write_config(dir.path(), body)));
        assert!(results.errors.iter().any(|m| m.contains("Unknown LLM provider")));
        assert!(results.errors.iter().any(|m| m.contains("Invalid mode")));
        assert!(results.warnings.iter().any(|m| m.contains("thinking_level")));
        assert!(results.warnings.iter().any(|m| m.contains("image_size")));
        assert!(results.warnings.iter().any(|m| m.contains("raised to 1")));
        assert!(results.warnings.iter().any(|m| m.contains("not found")));
    }

    #[test]
    fn test_unreadable_config_stops_early() {
        let results = check(Some("/nonexistent/paperbanana.toml".to_string()));
        assert_eq!(results.errors.len(), 1);
        assert!(results.passed.is_empty());
    }

    #[test]
    fn test_reference_set_counted() {
        let dir = tempfile::tempdir().unwrap();
        let refs = dir.path().join("refs.json");
        fs::write(&refs, r#"[{"id": "a"}, {"id": "b"}]"#).unwrap();
        let body = format!(
            "[llm]\nprovider = \"gemini\"\nvlm_model = \"m\"\nimage_model = \"i\"\napi_key_env = \"none\"\n\n[generation]\nreference_set = {:?}\n",
            refs.display().to_string()
        );
        let results = check(Some(write_config(dir.path(), &body)));
        assert!(results.passed.iter().any(|m| m.contains("2 examples")));
    }
}
