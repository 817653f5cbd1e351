use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::agents::critic::Critique;
use crate::reference::ReferenceExample;
use crate::util::ensure_parent_dir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionKind {
    Initial,
    Styled,
    Refined,
    RefinedStyled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionRecord {
    pub iteration: usize,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: DescriptionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub iteration: usize,
    pub path: PathBuf,
    /// Description the image was rendered from
    pub description: String,
}

/// Every intermediate artifact of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub reference_examples: Vec<ReferenceExample>,
    pub descriptions: Vec<DescriptionRecord>,
    pub critiques: Vec<Critique>,
    pub images: Vec<ImageRecord>,
}

impl History {
    pub fn record_description(&mut self, iteration: usize, description: &str, kind: DescriptionKind) {
        self.descriptions.push(DescriptionRecord {
            iteration,
            description: description.to_string(),
            kind,
        });
    }

    pub fn record_image(&mut self, iteration: usize, path: &Path, description: &str) {
        self.images.push(ImageRecord {
            iteration,
            path: path.to_path_buf(),
            description: description.to_string(),
        });
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;
        let json = serde_json::to_string_pretty(self).context("failed to serialize history")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        info!("History saved to: {}", path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}
