use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::llm::client::{ImageClient, LlmClient};
use crate::llm::prompts;
use crate::util::{ensure_parent_dir, extension_for_mime, save_binary_file, strip_markdown_fences, with_suffix};

/// What the visualizer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Rendered image from the image model
    #[default]
    Diagram,
    /// Matplotlib script from the text model
    Plot,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Diagram => "diagram",
            Mode::Plot => "plot",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "diagram" => Ok(Mode::Diagram),
            "plot" => Ok(Mode::Plot),
            other => Err(PipelineError::InvalidMode(other.to_string()).into()),
        }
    }
}

enum Backend<'a> {
    Image(&'a dyn ImageClient),
    Code(&'a dyn LlmClient),
}

pub struct VisualizerAgent<'a> {
    backend: Backend<'a>,
    custom_prompt: Option<String>,
}

impl<'a> VisualizerAgent<'a> {
    pub fn diagram(client: &'a dyn ImageClient) -> Self {
        Self {
            backend: Backend::Image(client),
            custom_prompt: None,
        }
    }

    pub fn plot(client: &'a dyn LlmClient) -> Self {
        Self {
            backend: Backend::Code(client),
            custom_prompt: None,
        }
    }

    pub fn with_custom_prompt(mut self, custom: Option<String>) -> Self {
        self.custom_prompt = custom;
        self
    }

    pub fn mode(&self) -> Mode {
        match self.backend {
            Backend::Image(_) => Mode::Diagram,
            Backend::Code(_) => Mode::Plot,
        }
    }

    /// Render `description` next to `output_base` (a path without extension).
    /// Returns the image path in diagram mode, the `.py` script in plot mode.
    pub async fn visualize(
        &self,
        description: &str,
        output_base: &Path,
        data: Option<&serde_json::Value>,
    ) -> Result<PathBuf> {
        match self.backend {
            Backend::Image(client) => self.generate_diagram(client, description, output_base).await,
            Backend::Code(client) => {
                self.generate_plot(client, description, output_base, data)
                    .await
            }
        }
    }

    async fn generate_diagram(
        &self,
        client: &dyn ImageClient,
        description: &str,
        output_base: &Path,
    ) -> Result<PathBuf> {
        let prompt = prompts::diagram_prompt(description, self.custom_prompt.as_deref());
        let response = client
            .generate_image(&prompt)
            .await
            .context("image generation call failed")?;

        if !response.text.trim().is_empty() {
            info!("Visualizer: {}", response.text.trim());
        }

        let mut saved = None;
        let mut file_index = 0;
        for image in &response.images {
            let Some(extension) = extension_for_mime(&image.mime_type) else {
                warn!("Skipping image with unsupported MIME type {}", image.mime_type);
                continue;
            };
            let path = with_suffix(output_base, &format!("_{}{}", file_index, extension));
            saved = Some(save_binary_file(&path, &image.data)?);
            file_index += 1;
        }

        saved.ok_or_else(|| PipelineError::NoImage(output_base.display().to_string()).into())
    }

    async fn generate_plot(
        &self,
        client: &dyn LlmClient,
        description: &str,
        output_base: &Path,
        data: Option<&serde_json::Value>,
    ) -> Result<PathBuf> {
        let prompt = prompts::plot_prompt(description, data, self.custom_prompt.as_deref());
        let code = client
            .complete(&prompt)
            .await
            .context("plot code generation call failed")?;
        let code = strip_markdown_fences(&code);

        let code_file = with_suffix(output_base, ".py");
        ensure_parent_dir(&code_file)?;
        fs::write(&code_file, format!("{}\n", code))
            .with_context(|| format!("failed to write {}", code_file.display()))?;

        info!("Plot code saved to: {}", code_file.display());
        info!("Run the code to generate the plot image.");
        Ok(code_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::{ImageResponse, InlineImage, MockLlmClient};
    use async_trait::async_trait;

    struct FixedImages(Vec<InlineImage>);

    #[async_trait]
    impl ImageClient for FixedImages {
        async fn generate_image(&self, _prompt: &str) -> Result<ImageResponse> {
            Ok(ImageResponse {
                images: self.0.clone(),
                text: String::new(),
            })
        }
    }

    fn image(mime: &str, data: &[u8]) -> InlineImage {
        InlineImage {
            mime_type: mime.to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("diagram".parse::<Mode>().unwrap(), Mode::Diagram);
        assert_eq!(" PLOT ".parse::<Mode>().unwrap(), Mode::Plot);
        assert!("chart".parse::<Mode>().is_err());
        assert_eq!(Mode::Plot.to_string(), "plot");
    }

    #[tokio::test]
    async fn test_diagram_writes_numbered_files() {
        let dir = tempfile::tempdir().unwrap();
        let client = FixedImages(vec![
            image("image/png", b"first"),
            image("application/x-unknown", b"skip"),
            image("image/jpeg", b"second"),
        ]);
        let base = dir.path().join("out/iter1");
        let path = VisualizerAgent::diagram(&client)
            .visualize("desc", &base, None)
            .await
            .unwrap();

        // Last saved image wins; unknown MIME types do not consume an index
        assert_eq!(path, dir.path().join("out/iter1_1.jpg"));
        assert_eq!(fs::read(dir.path().join("out/iter1_0.png")).unwrap(), b"first");
        assert_eq!(fs::read(&path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_diagram_without_image_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = FixedImages(vec![]);
        let err = VisualizerAgent::diagram(&client)
            .visualize("desc", &dir.path().join("x"), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::NoImage(_))
        ));
    }

    #[tokio::test]
    async fn test_plot_writes_unfenced_script() {
        let dir = tempfile::tempdir().unwrap();
        let client = MockLlmClient::new();
        let agent = VisualizerAgent::plot(&client);
        assert_eq!(agent.mode(), Mode::Plot);

        let data = serde_json::json!({"acc": [0.61, 0.74]});
        let path = agent
            .visualize("accuracy", &dir.path().join("plot"), Some(&data))
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("plot.py"));
        let code = fs::read_to_string(&path).unwrap();
        assert!(code.starts_with("import matplotlib.pyplot as plt"));
        assert!(!code.contains("```"));
    }
}
