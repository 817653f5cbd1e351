use anyhow::Result;

use crate::reference::{load_reference_set, reference_set_stats, ReferenceStats};

/// Print statistics for a reference-set JSON file.
pub fn run(path: &str, require_images: bool) -> Result<ReferenceStats> {
    let reference_set = load_reference_set(path, require_images)?;
    let stats = reference_set_stats(&reference_set);
    println!("{}", stats);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_run_reports_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refs.json");
        fs::write(
            &path,
            r#"[
  {"id": "a", "domain": "Vision", "diagram_type": "Architecture", "source_file": "p1.pdf"},
  {"id": "b", "domain": "Vision", "diagram_type": "Pipeline", "source_file": "p1.pdf"},
  {"id": "c", "domain": "NLP", "diagram_type": "Architecture", "source_file": "p2.pdf"}
]"#,
        )
        .unwrap();

        let stats = run(&path.display().to_string(), false).unwrap();
        assert_eq!(stats.total_references, 3);
        assert_eq!(stats.unique_papers, 2);
        assert_eq!(stats.domains[0], ("Vision".to_string(), 2));
    }

    #[test]
    fn test_missing_file_is_empty_set() {
        let stats = run("/nonexistent/refs.json", false).unwrap();
        assert_eq!(stats.total_references, 0);
    }
}
