use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

use crate::llm::client::LlmClient;
use crate::llm::prompts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

static SEVERITY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\[?\s*(critical|major|minor)\b\s*\]?").expect("valid severity regex")
});

impl Severity {
    /// Severity from a leading `[MAJOR]`-style tag on an issue line.
    pub fn from_issue(issue: &str) -> Option<Self> {
        let caps = SEVERITY_TAG.captures(issue)?;
        match caps[1].to_ascii_uppercase().as_str() {
            "CRITICAL" => Some(Severity::Critical),
            "MAJOR" => Some(Severity::Major),
            "MINOR" => Some(Severity::Minor),
            _ => None,
        }
    }
}

/// Structured result of one critique round.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    pub iteration: usize,
    /// Raw model output
    pub feedback: String,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub should_continue: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub critical: usize,
    pub major: usize,
    pub minor: usize,
    pub untagged: usize,
}

impl Critique {
    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for issue in &self.issues {
            match Severity::from_issue(issue) {
                Some(Severity::Critical) => counts.critical += 1,
                Some(Severity::Major) => counts.major += 1,
                Some(Severity::Minor) => counts.minor += 1,
                None => counts.untagged += 1,
            }
        }
        counts
    }

    /// Prompt asking the planner to fix what this critique found.
    pub fn refinement_prompt(&self, description: &str) -> String {
        prompts::refinement_prompt(description, &self.issues, &self.suggestions)
    }
}

/// Reviews the current description against the methodology and decides
/// whether another refinement round is worthwhile.
pub struct CriticAgent<'a> {
    client: &'a dyn LlmClient,
    max_iterations: usize,
    custom_prompt: Option<String>,
}

impl<'a> CriticAgent<'a> {
    pub fn new(client: &'a dyn LlmClient, max_iterations: usize) -> Self {
        Self {
            client,
            max_iterations,
            custom_prompt: None,
        }
    }

    pub fn with_custom_prompt(mut self, custom: Option<String>) -> Self {
        self.custom_prompt = custom;
        self
    }

    /// The critique reads the description only; `image_path` is logged for
    /// traceability.
    pub async fn critique(
        &self,
        methodology: &str,
        caption: &str,
        description: &str,
        image_path: Option<&Path>,
        iteration: usize,
    ) -> Result<Critique> {
        if let Some(path) = image_path {
            debug!("Critiquing description behind {}", path.display());
        }
        let prompt = prompts::critique_prompt(
            methodology,
            caption,
            description,
            iteration,
            self.max_iterations,
            self.custom_prompt.as_deref(),
        );
        let response = self
            .client
            .complete(&prompt)
            .await
            .context("critic LLM call failed")?;

        Ok(parse_critique(&response, iteration, self.max_iterations))
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Issues,
    Suggestions,
    Decision,
    Reasoning,
}

/// Upper-cased header text with markdown heading, bold and italic marks
/// removed, so `**Decision**: READY` and `## Issues` read as headers. `None`
/// for list items, which are never headers.
fn header_text(line: &str) -> Option<String> {
    let line = line.trim();
    if line.starts_with(['-', '•']) || line.starts_with("* ") {
        return None;
    }
    Some(
        line.trim_start_matches('#')
            .replace(['*', '_'], "")
            .trim()
            .to_uppercase(),
    )
}

/// Item text of a bullet (`- `, `* `, `•`) or numbered (`1.`, `**2.**`) line.
fn list_item(line: &str) -> Option<String> {
    let line = line.trim();
    if line.chars().all(|c| matches!(c, '-' | '*' | '_')) {
        return None;
    }
    let rest = if let Some(rest) = line
        .strip_prefix('-')
        .or_else(|| line.strip_prefix('•'))
        .or_else(|| line.strip_prefix("* "))
    {
        rest
    } else {
        let unbolded = line.trim_start_matches("**");
        if !unbolded.starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        unbolded
            .trim_start_matches(|c: char| c.is_ascii_digit())
            .trim_start_matches(['.', ')'])
    };
    let item = rest.trim_start().trim_start_matches("**").trim();
    (!item.is_empty()).then(|| item.to_string())
}

fn after_colon(line: &str) -> &str {
    line.split_once(':').map(|(_, rest)| rest).unwrap_or("").trim()
}

/// Parse the critic's free text into issues, suggestions and a stop decision.
pub fn parse_critique(text: &str, iteration: usize, max_iterations: usize) -> Critique {
    let mut issues = Vec::new();
    let mut suggestions = Vec::new();
    let mut reasoning: Option<String> = None;
    let mut should_continue = true;
    let mut section: Option<Section> = None;

    for raw in text.lines() {
        if let Some(header) = header_text(raw) {
            if header.starts_with("ISSUES") {
                section = Some(Section::Issues);
                continue;
            } else if header.starts_with("SUGGESTION") {
                section = Some(Section::Suggestions);
                continue;
            } else if header.starts_with("DECISION:") {
                section = Some(Section::Decision);
                // Underscores are already stripped from the header
                if header.contains("READY")
                    && !header.contains("NEEDSREFINEMENT")
                    && !header.contains("NEEDS REFINEMENT")
                {
                    should_continue = false;
                }
                continue;
            } else if header.starts_with("REASONING:") {
                section = Some(Section::Reasoning);
                let rest = after_colon(raw).trim_matches(['*', ' ']).trim();
                if !rest.is_empty() {
                    reasoning = Some(rest.to_string());
                }
                continue;
            }
        }

        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match section {
            Some(Section::Issues) => issues.extend(list_item(line)),
            Some(Section::Suggestions) => suggestions.extend(list_item(line)),
            Some(Section::Reasoning) => {
                let r = reasoning.get_or_insert_with(String::new);
                if !r.is_empty() {
                    r.push(' ');
                }
                r.push_str(line);
            }
            _ => {}
        }
    }

    if iteration >= max_iterations {
        should_continue = false;
    }

    Critique {
        iteration,
        feedback: text.to_string(),
        issues,
        suggestions,
        reasoning,
        should_continue,
    }
}
