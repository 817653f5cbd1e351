//! Shared helpers: secret masking, output files, model-output cleanup.

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A string wrapper that masks its contents in Debug/Display output.
/// Keeps API keys out of logs and panic messages.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Access the raw secret (request headers only).
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<&str> for SecretString {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// File extension (with leading dot) for an image MIME type, or `None` if we
/// don't know how to name it.
pub fn extension_for_mime(mime_type: &str) -> Option<&'static str> {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/png" => Some(".png"),
        "image/jpeg" | "image/jpg" => Some(".jpg"),
        "image/webp" => Some(".webp"),
        "image/gif" => Some(".gif"),
        "image/svg+xml" => Some(".svg"),
        _ => None,
    }
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Write binary data to `path`, creating parent directories as needed.
pub fn save_binary_file(path: &Path, data: &[u8]) -> Result<PathBuf> {
    ensure_parent_dir(path)?;
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
    info!("File saved to: {}", path.display());
    Ok(path.to_path_buf())
}

/// Append a suffix to the final component of a path (`out/diagram` + `_iter1`).
pub fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Strip a single wrapping markdown code fence (```lang ... ```), if present.
pub fn strip_markdown_fences(content: &str) -> String {
    let trimmed = content.trim();

    if trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6 {
        let inner = &trimmed[3..trimmed.len() - 3];
        // Drop the language tag on the opening line
        let body = match inner.find('\n') {
            Some(pos) if !inner[..pos].trim().contains(' ') => &inner[pos + 1..],
            _ => inner,
        };
        return body.trim().to_string();
    }

    trimmed.to_string()
}
