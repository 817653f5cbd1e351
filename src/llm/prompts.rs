//! Prompt templates for the five agents.
//!
//! Every builder takes an optional `custom` string which is appended under an
//! `ADDITIONAL INSTRUCTIONS` heading.

use crate::reference::ReferenceExample;

/// How many retrieved references the planner sees.
pub const PLANNER_REFERENCE_LIMIT: usize = 3;

fn append_custom(mut prompt: String, custom: Option<&str>) -> String {
    if let Some(custom) = custom.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str("\nADDITIONAL INSTRUCTIONS:\n");
        prompt.push_str(custom);
        prompt.push('\n');
    }
    prompt
}

pub fn retrieval_prompt(
    methodology: &str,
    caption: &str,
    references: &[ReferenceExample],
    n: usize,
    custom: Option<&str>,
) -> String {
    let reference_summary: String = references
        .iter()
        .map(|r| {
            format!(
                "ID: {}\nDomain: {}\nType: {}\nDescription: {}\n",
                r.id, r.domain, r.diagram_type, r.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        r#"You are an expert at identifying relevant academic illustration examples.

Given a methodology description and diagram caption, select the {n} most relevant reference examples
from the provided set. Consider:
1. Research domain similarity (e.g., NLP, Computer Vision, Reinforcement Learning)
2. Diagram type similarity (e.g., architecture diagram, flowchart, pipeline)
3. Conceptual similarity in the methodology

METHODOLOGY:
{methodology}

TARGET CAPTION:
{caption}

AVAILABLE REFERENCE EXAMPLES:
{reference_summary}

OUTPUT FORMAT:
Return only the IDs of the {n} most relevant examples, one per line, ranked from most to least relevant.
Example output:
ref_001
ref_005
ref_012
"#
    );
    append_custom(prompt, custom)
}

pub fn planning_prompt(
    methodology: &str,
    caption: &str,
    references: &[ReferenceExample],
    custom: Option<&str>,
) -> String {
    let mut reference_context = String::new();
    if !references.is_empty() {
        reference_context.push_str("\n\nREFERENCE EXAMPLES (for inspiration):\n");
        for (i, r) in references.iter().take(PLANNER_REFERENCE_LIMIT).enumerate() {
            reference_context.push_str(&format!(
                "\nExample {}:\nDomain: {}\nType: {}\nDescription: {}\n",
                i + 1,
                or_na(&r.domain),
                or_na(&r.diagram_type),
                or_na(&r.description),
            ));
        }
    }

    let prompt = format!(
        r#"You are an expert at designing academic methodology diagrams for scientific publications.

Your task is to create a COMPREHENSIVE and DETAILED textual description of an illustration that would
effectively visualize the given methodology. This description will be used to generate the actual diagram.

METHODOLOGY TO VISUALIZE:
{methodology}

TARGET DIAGRAM CAPTION:
{caption}
{reference_context}

REQUIREMENTS:
1. **Layout Structure**: Specify the overall layout (left-to-right, top-to-bottom, circular, etc.)
2. **Components**: List all visual elements needed (boxes, arrows, icons, labels, etc.)
3. **Content**: What text/symbols should appear in each component
4. **Connections**: How components connect (arrows, lines, groupings)
5. **Hierarchy**: Which elements are primary vs secondary
6. **Grouping**: How to group related components (containers, background colors)
7. **Flow**: The logical flow of information through the diagram
8. **Key Details**: Important technical details, equations, or annotations

IMPORTANT GUIDELINES:
- Be specific about spatial relationships and positioning
- Describe the logical flow clearly (input → process → output)
- Include any mathematical notation or technical terminology
- Consider the target audience (academic researchers)
- Focus on clarity and information density
- Think about how this supports the paper's narrative

OUTPUT FORMAT:
Provide a detailed paragraph-form description that covers all aspects above.
Be thorough - this description should be sufficient for someone to create the diagram without seeing the original methodology.
"#
    );
    append_custom(prompt, custom)
}

fn or_na(s: &str) -> &str {
    if s.trim().is_empty() {
        "N/A"
    } else {
        s
    }
}

pub fn styling_prompt(description: &str, guidelines: &str, custom: Option<&str>) -> String {
    let prompt = format!(
        r#"You are an expert design consultant specializing in academic publication illustrations.

Your task is to take an initial diagram description and enhance it with specific aesthetic and design details
to create a polished, publication-ready illustration that follows academic standards.

INITIAL DESCRIPTION:
{description}

AESTHETIC GUIDELINES TO FOLLOW:
{guidelines}

YOUR TASK:
Refine the initial description by adding specific visual design details:

1. **Color Specifications**: Add specific color choices from the palette (e.g., "soft blue #64B5F6 for the main process boxes")
2. **Shape Details**: Specify exact shapes and their styling (e.g., "rounded rectangles with 10px radius and subtle shadow")
3. **Typography**: Define font choices for different text elements
4. **Visual Hierarchy**: Enhance descriptions of size, weight, and emphasis relationships
5. **Spacing & Layout**: Add details about padding, margins, and alignment
6. **Professional Polish**: Include finishing touches like shadows, borders, gradients

IMPORTANT:
- Preserve ALL content and structural information from the initial description
- Add aesthetic details WITHOUT changing the fundamental design or information flow
- Be specific with measurements, colors (hex codes), and styling parameters
- Ensure the result maintains academic professionalism and clarity
- The output should be suitable for direct input to an image generation model

OUTPUT FORMAT:
Provide the enhanced description as a detailed, flowing paragraph that seamlessly integrates
the original content with the aesthetic specifications. Make it vivid and precise enough that
an image generation model can render it accurately.
"#
    );
    append_custom(prompt, custom)
}

pub fn diagram_prompt(description: &str, custom: Option<&str>) -> String {
    let prompt = format!(
        r#"Generate a high-quality academic methodology diagram with the following specifications:

{description}

Requirements:
- Professional academic publication quality
- Clear, readable text and labels
- Consistent styling throughout
- Appropriate use of colors and shapes
- Publication-ready resolution
"#
    );
    append_custom(prompt, custom)
}

pub fn plot_prompt(description: &str, data: Option<&serde_json::Value>, custom: Option<&str>) -> String {
    let data_context = data
        .map(|d| {
            let rendered = serde_json::to_string_pretty(d).unwrap_or_else(|_| d.to_string());
            format!("\n\nDATA PROVIDED:\n{}\n", rendered)
        })
        .unwrap_or_default();

    let prompt = format!(
        r#"You are an expert at creating publication-quality statistical plots using Matplotlib.

Generate complete, executable Python code using Matplotlib to create the following plot:

{description}
{data_context}

Requirements:
1. Use professional academic styling (seaborn-paper style or similar)
2. Include clear axis labels with units
3. Add legend if multiple series
4. Use appropriate colors and markers
5. Set figure size for publication (e.g., 6x4 inches)
6. Save as high-resolution PNG (300 dpi minimum)
7. Include error bars if applicable
8. Follow best practices for data visualization

OUTPUT FORMAT:
Provide ONLY the complete Python code, ready to execute.
Start with necessary imports and end with plt.savefig().
Do not include any explanations outside the code comments.
"#
    );
    append_custom(prompt, custom)
}

pub fn critique_prompt(
    methodology: &str,
    caption: &str,
    description: &str,
    iteration: usize,
    max_iterations: usize,
    custom: Option<&str>,
) -> String {
    let prompt = format!(
        r#"You are an expert reviewer of academic illustrations, specializing in methodology diagrams.

Your task is to critically evaluate a textual description for an academic diagram and provide constructive feedback.

ORIGINAL METHODOLOGY:
{methodology}

TARGET CAPTION:
{caption}

CURRENT ILLUSTRATION DESCRIPTION (Iteration {iteration}):
{description}

EVALUATION CRITERIA:

1. **Faithfulness**: Does the description accurately represent all key aspects of the methodology?
   - Are all important components mentioned?
   - Is the flow/logic correctly represented?
   - Are there any factual errors or misrepresentations?

2. **Conciseness**: Is the description appropriately detailed without being cluttered?
   - Is information density appropriate?
   - Are there redundant elements?
   - Is anything unnecessarily complex?

3. **Readability**: Will the resulting diagram be easy to understand?
   - Is the layout logical?
   - Are labels clear and informative?
   - Is visual hierarchy appropriate?

4. **Aesthetics**: Does the description specify professional visual design?
   - Are colors, shapes, and typography well-defined?
   - Is there visual consistency?
   - Does it match academic publication standards?

YOUR TASK:
Provide a structured critique covering:

ISSUES FOUND:
- List specific problems (e.g., "Missing connection between X and Y")
- Rate severity: CRITICAL, MAJOR, or MINOR

SUGGESTIONS FOR IMPROVEMENT:
- Provide concrete, actionable suggestions
- Prioritize by impact

OVERALL ASSESSMENT:
- Is this ready for visualization, or does it need refinement?
- If iteration {iteration} < {max_iterations}, should we continue refining?

OUTPUT FORMAT:
Structure your response as:

ISSUES:
1. [SEVERITY] Issue description
2. [SEVERITY] Issue description
...

SUGGESTIONS:
1. Specific suggestion
2. Specific suggestion
...

DECISION: [READY / NEEDS_REFINEMENT]
REASONING: Brief explanation of the decision
"#
    );
    append_custom(prompt, custom)
}

pub fn refinement_prompt(description: &str, issues: &[String], suggestions: &[String]) -> String {
    let bullets = |items: &[String]| {
        items
            .iter()
            .map(|i| format!("- {}", i))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"CURRENT DESCRIPTION:
{description}

IDENTIFIED ISSUES:
{issues}

SUGGESTIONS FOR IMPROVEMENT:
{suggestions}

Please revise the description to address these issues and incorporate the suggestions.
Maintain all correct elements while fixing the identified problems.
"#,
        issues = bullets(issues),
        suggestions = bullets(suggestions),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(id: &str) -> ReferenceExample {
        ReferenceExample {
            id: id.to_string(),
            domain: "Computer Vision".to_string(),
            diagram_type: "Architecture Diagram".to_string(),
            description: format!("description of {}", id),
            ..Default::default()
        }
    }

    #[test]
    fn test_retrieval_prompt_lists_every_reference() {
        let refs: Vec<_> = (1..=5).map(|i| reference(&format!("ref_{:03}", i))).collect();
        let prompt = retrieval_prompt("method", "caption", &refs, 2, None);
        for r in &refs {
            assert!(prompt.contains(&format!("ID: {}", r.id)));
        }
        assert!(prompt.contains("select the 2 most relevant"));
        assert!(prompt.contains("Return only the IDs of the 2 most relevant"));
    }

    #[test]
    fn test_planning_prompt_uses_top_three_references() {
        let refs: Vec<_> = (1..=5).map(|i| reference(&format!("ref_{:03}", i))).collect();
        let prompt = planning_prompt("method", "caption", &refs, None);
        assert!(prompt.contains("REFERENCE EXAMPLES (for inspiration)"));
        assert!(prompt.contains("Example 3:"));
        assert!(!prompt.contains("Example 4:"));
        assert!(prompt.contains("description of ref_003"));
        assert!(!prompt.contains("description of ref_004"));
    }

    #[test]
    fn test_planning_prompt_without_references() {
        let prompt = planning_prompt("method", "caption", &[], None);
        assert!(!prompt.contains("REFERENCE EXAMPLES"));
        assert!(prompt.contains("METHODOLOGY TO VISUALIZE:\nmethod"));
    }

    #[test]
    fn test_planning_prompt_marks_missing_fields() {
        let refs = vec![ReferenceExample {
            id: "ref_x".to_string(),
            ..Default::default()
        }];
        let prompt = planning_prompt("m", "c", &refs, None);
        assert!(prompt.contains("Domain: N/A"));
    }

    #[test]
    fn test_custom_instructions_appended() {
        let prompt = styling_prompt("desc", "guide", Some("Use a dark theme"));
        assert!(prompt.ends_with("ADDITIONAL INSTRUCTIONS:\nUse a dark theme\n"));

        let untouched = styling_prompt("desc", "guide", Some("   "));
        assert!(!untouched.contains("ADDITIONAL INSTRUCTIONS"));
    }

    #[test]
    fn test_plot_prompt_includes_data() {
        let data = serde_json::json!({"epochs": [1, 2, 3]});
        let prompt = plot_prompt("accuracy curve", Some(&data), None);
        assert!(prompt.contains("DATA PROVIDED:"));
        assert!(prompt.contains("\"epochs\""));

        let without = plot_prompt("accuracy curve", None, None);
        assert!(!without.contains("DATA PROVIDED"));
    }

    #[test]
    fn test_critique_prompt_mentions_iteration_bound() {
        let prompt = critique_prompt("m", "c", "d", 2, 4, None);
        assert!(prompt.contains("(Iteration 2)"));
        assert!(prompt.contains("If iteration 2 < 4"));
        assert!(prompt.contains("DECISION: [READY / NEEDS_REFINEMENT]"));
    }

    #[test]
    fn test_refinement_prompt_bullets() {
        let prompt = refinement_prompt(
            "old",
            &["[MAJOR] missing arrow".to_string()],
            &["add arrow".to_string(), "recolor".to_string()],
        );
        assert!(prompt.contains("CURRENT DESCRIPTION:\nold"));
        assert!(prompt.contains("IDENTIFIED ISSUES:\n- [MAJOR] missing arrow\n"));
        assert!(prompt.contains("SUGGESTIONS FOR IMPROVEMENT:\n- add arrow\n- recolor\n"));
    }
}
