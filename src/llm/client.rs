use anyhow::Result;
use async_trait::async_trait;

/// Text generation (retriever, planner, stylist, critic, plot code).
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Image generation (visualizer, diagram mode).
#[async_trait]
pub trait ImageClient: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<ImageResponse>;
}

/// A decoded image returned inline by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageResponse {
    pub images: Vec<InlineImage>,
    /// Any text the model emitted alongside the images
    pub text: String,
}

/// Smallest valid PNG (1x1 transparent pixel).
pub const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

/// Offline client for `--dry-run` and tests. Answers each agent with a canned
/// response chosen by a marker phrase in its prompt.
pub struct MockLlmClient;

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if prompt.contains("AVAILABLE REFERENCE EXAMPLES") {
            // Retriever: echo the first few IDs it was offered
            let ids: Vec<&str> = prompt
                .lines()
                .filter_map(|l| l.strip_prefix("ID: "))
                .take(3)
                .collect();
            Ok(ids.join("\n"))
        } else if prompt.contains("expert at designing academic methodology diagrams") {
            // Planner
            Ok(r#"
The diagram flows left to right in three stages. On the left, a parallelogram labeled
"Input Images" feeds a rounded box "ResNet-50 Backbone". An arrow carries feature maps to a
central container titled "Multi-Head Self-Attention (h = 8)" holding eight thin stacked
rectangles. A final box "MLP Head (ReLU, Dropout p = 0.5)" produces "Softmax Output" on the
right. A dashed arrow beneath the pipeline is labeled "Cross-Entropy Loss, Adam".
"#
            .to_string())
        } else if prompt.contains("expert design consultant") {
            // Stylist
            Ok(r#"
On a cream (#FFF8E7) background, the diagram flows left to right. A soft blue (#64B5F6)
parallelogram "Input Images" connects with a 2pt straight arrow to a rounded rectangle
(10px radius, subtle shadow) "ResNet-50 Backbone". The central pale blue (#E3F2FD) container
"Multi-Head Self-Attention ($h=8$)" holds eight stacked soft purple (#9575CD) rectangles.
A soft green (#81C784) box "MLP Head" ends in "Softmax Output". Labels use 12pt Helvetica;
variables are set in serif italic.
"#
            .to_string())
        } else if prompt.contains("expert reviewer of academic illustrations") {
            // Critic
            Ok(r#"ISSUES:
1. [MINOR] The pooling step between backbone and attention is not shown
2. [MINOR] Loss annotation is visually detached from the output

SUGGESTIONS:
1. Add a small "Adaptive Avg Pool" box after the backbone
2. Attach the loss arrow to the softmax output

DECISION: READY
REASONING: Remaining issues are cosmetic."#
                .to_string())
        } else if prompt.contains("Please revise the description") {
            // Planner refinement
            Ok("The diagram flows left to right with an Adaptive Avg Pool box after the backbone and the loss arrow attached to the softmax output.".to_string())
        } else if prompt.contains("publication-quality statistical plots") {
            // Visualizer, plot mode
            Ok(r#"```python
import matplotlib.pyplot as plt

fig, ax = plt.subplots(figsize=(6, 4))
ax.plot([1, 2, 3], [0.61, 0.74, 0.82], marker="o", label="Ours")
ax.set_xlabel("Epoch")
ax.set_ylabel("Accuracy")
ax.legend()
plt.savefig("plot.png", dpi=300)
```"#
                .to_string())
        } else {
            Ok("mock response".to_string())
        }
    }
}

#[async_trait]
impl ImageClient for MockLlmClient {
    async fn generate_image(&self, _prompt: &str) -> Result<ImageResponse> {
        Ok(ImageResponse {
            images: vec![InlineImage {
                mime_type: "image/png".to_string(),
                data: PLACEHOLDER_PNG.to_vec(),
            }],
            text: "Here is the generated diagram.".to_string(),
        })
    }
}
