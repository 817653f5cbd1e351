//! Reference set: previously published figures the retriever can point the
//! planner at.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceExample {
    pub id: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub diagram_type: String,
    /// Figure caption or summary
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_idx: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
}

impl ReferenceExample {
    fn has_image_on_disk(&self) -> bool {
        self.image_path
            .as_deref()
            .map(|p| !p.is_empty() && Path::new(p).exists())
            .unwrap_or(false)
    }
}

/// Load a reference set from JSON.
///
/// A missing file yields an empty set (retrieval is then skipped). With
/// `require_images`, entries whose `image_path` does not exist are dropped.
/// Relative image paths are resolved against the working directory.
pub fn load_reference_set<P: AsRef<Path>>(
    path: P,
    require_images: bool,
) -> Result<Vec<ReferenceExample>> {
    let path = path.as_ref();
    if !path.exists() {
        warn!("Reference set not found at {}", path.display());
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read reference set {}", path.display()))?;
    let reference_set: Vec<ReferenceExample> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse reference set {}", path.display()))?;

    let reference_set = if require_images {
        let total = reference_set.len();
        let valid: Vec<_> = reference_set
            .into_iter()
            .filter(ReferenceExample::has_image_on_disk)
            .collect();
        let missing = total - valid.len();
        if missing > 0 {
            warn!(
                "{}/{} reference images not found on disk",
                missing, total
            );
        }
        valid
    } else {
        reference_set
    };

    info!(
        "Loaded {} reference examples from {}",
        reference_set.len(),
        path.display()
    );
    Ok(reference_set)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceStats {
    pub total_references: usize,
    pub unique_papers: usize,
    /// (domain, count), most common first
    pub domains: Vec<(String, usize)>,
    /// (diagram type, count), most common first
    pub diagram_types: Vec<(String, usize)>,
}

fn label_or_unknown(s: &str) -> String {
    if s.trim().is_empty() {
        "Unknown".to_string()
    } else {
        s.to_string()
    }
}

fn sorted_counts(counts: HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

pub fn reference_set_stats(reference_set: &[ReferenceExample]) -> ReferenceStats {
    let mut domains: HashMap<String, usize> = HashMap::new();
    let mut diagram_types: HashMap<String, usize> = HashMap::new();
    let mut papers: HashSet<String> = HashSet::new();

    for r in reference_set {
        *domains.entry(label_or_unknown(&r.domain)).or_default() += 1;
        *diagram_types
            .entry(label_or_unknown(&r.diagram_type))
            .or_default() += 1;
        papers.insert(label_or_unknown(r.source_file.as_deref().unwrap_or("")));
    }

    ReferenceStats {
        total_references: reference_set.len(),
        unique_papers: papers.len(),
        domains: sorted_counts(domains),
        diagram_types: sorted_counts(diagram_types),
    }
}

impl fmt::Display for ReferenceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reference Set Statistics:")?;
        writeln!(f, "  Total references: {}", self.total_references)?;
        writeln!(f, "  Unique papers: {}", self.unique_papers)?;
        writeln!(f, "  Domains:")?;
        for (domain, count) in &self.domains {
            writeln!(f, "    {}: {}", domain, count)?;
        }
        writeln!(f, "  Diagram Types:")?;
        for (diagram_type, count) in &self.diagram_types {
            writeln!(f, "    {}: {}", diagram_type, count)?;
        }
        Ok(())
    }
}
