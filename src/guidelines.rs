//! Aesthetic guidelines handed to the stylist.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// NeurIPS-style academic illustration guide used when no custom file is given.
pub const AESTHETIC_GUIDELINE: &str = r#"
# Academic Illustration Style Guide (NeurIPS Style)

## Color Palette
- **Overall Aesthetic:** Soft Tech & Scientific Pastels ("NeurIPS Look")
- **Background Colors:** Cream (#FFF8E7), Pale Blue (#E3F2FD), Mint (#E8F5E9)
- **Accent Colors:**
  - Soft Blue (#64B5F6) for primary processes
  - Soft Orange (#FFB74D) for secondary/iterative processes
  - Soft Purple (#9575CD) for highlighting key components
  - Soft Green (#81C784) for success/outputs
- **Use color to group logical components**

## Shapes and Components
- **Process Boxes:** Rounded rectangles with subtle shadows
- **Data/Tensors:** 3D stacks or layered rectangles
- **Databases/Storage:** Cylinders or drum shapes
- **Agents/Models:** Robot or brain icons with labels
- **Inputs/Outputs:** Parallelograms or cloud shapes

## Lines and Arrows
- **Network/Architecture Diagrams:** Orthogonal/Elbow connectors
- **Logic Flow:** Curved arrows for feedback loops
- **Data Flow:** Straight arrows with clear directionality
- **Arrow Styles:** Solid for primary flow, dashed for optional/conditional

## Typography
- **Labels:** Sans-serif fonts (Arial, Roboto, Helvetica)
- **Mathematical Variables:** Serif Italic (Times New Roman) - use LaTeX notation (e.g., $P$, $P^*$)
- **Font Sizes:**
  - Main labels: 12-14pt
  - Subscript/technical: 10pt
  - Section headers: 16pt bold

## Layout Principles
- **Hierarchy:** Left-to-right or top-to-bottom flow
- **Grouping:** Use containers/boxes with subtle backgrounds to group related components
- **Spacing:** Generous whitespace, consistent padding
- **Alignment:** Grid-based layout, aligned elements
- **Balance:** Visual weight distributed evenly

## Technical Details
- **Line Weight:** 1.5-2pt for main elements, 1pt for details
- **Corner Radius:** 8-12px for rounded rectangles
- **Shadow:** Subtle drop shadow (opacity 10-20%)
- **Icons:** Simple, consistent style throughout

## Diagram-Specific Guidelines
### Architecture Diagrams
- Show clear input → process → output flow
- Use containers to separate phases/stages
- Include feedback loops where applicable

### Methodology Diagrams
- Emphasize the pipeline structure
- Show agent interactions clearly
- Use consistent icons for similar components
- Annotate with mathematical notation where relevant
"#;

/// Read a custom guideline file. Empty files are rejected rather than
/// silently producing an unstyled prompt.
pub fn load_guidelines<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read guidelines {}", path.display()))?;
    if content.trim().is_empty() {
        bail!("guidelines file {} is empty", path.display());
    }
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_guideline_sections() {
        for section in [
            "## Color Palette",
            "## Typography",
            "## Layout Principles",
            "### Methodology Diagrams",
        ] {
            assert!(AESTHETIC_GUIDELINE.contains(section), "missing {section}");
        }
        assert!(AESTHETIC_GUIDELINE.contains("#64B5F6"));
    }

    #[test]
    fn test_load_guidelines_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.md");
        fs::write(&path, "# Dark theme\n- black background").unwrap();
        assert!(load_guidelines(&path).unwrap().contains("Dark theme"));
    }

    #[test]
    fn test_load_guidelines_rejects_empty_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.md");
        fs::write(&path, "  \n").unwrap();
        assert!(load_guidelines(&path).is_err());
        assert!(load_guidelines(dir.path().join("missing.md")).is_err());
    }
}
