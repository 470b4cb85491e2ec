use crate::types::FileChange;

/// Returned verbatim when a review request carries no file records.
pub const NO_FILES_PLACEHOLDER: &str = "No file list provided.";

const FILES_HEADER: &str = "Files changed:";
const UNKNOWN_FILENAME: &str = "<unknown>";

/// Renders the changed-file list as a short text block for prompt
/// consumption: a header line followed by one bullet per record, in input
/// order. An empty list yields the fixed placeholder instead. Records with
/// a missing filename render as `<unknown>`; missing counters render as 0.
pub fn format_files_summary(files: &[FileChange]) -> String {
    if files.is_empty() {
        return NO_FILES_PLACEHOLDER.to_string();
    }

    let mut lines = Vec::with_capacity(files.len() + 1);
    lines.push(FILES_HEADER.to_string());
    for file in files {
        let filename = if file.filename.is_empty() {
            UNKNOWN_FILENAME
        } else {
            file.filename.as_str()
        };
        lines.push(format!(
            "- {} (+{}/-{})",
            filename, file.additions, file.deletions
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_returns_placeholder() {
        assert_eq!(format_files_summary(&[]), NO_FILES_PLACEHOLDER);
    }

    #[test]
    fn one_line_per_record_plus_header() {
        let files = vec![
            FileChange::new("src/auth.rs", 10, 2),
            FileChange::new("src/db.rs", 4, 4),
            FileChange::new("src/main.rs", 1, 0),
            FileChange::new("Cargo.toml", 2, 1),
            FileChange::new("README.md", 30, 12),
        ];

        let summary = format_files_summary(&files);
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "Files changed:");
        assert_eq!(lines[1], "- src/auth.rs (+10/-2)");
        assert_eq!(lines[5], "- README.md (+30/-12)");
    }

    #[test]
    fn preserves_input_order() {
        let files = vec![
            FileChange::new("zebra.rs", 1, 1),
            FileChange::new("alpha.rs", 1, 1),
        ];

        let summary = format_files_summary(&files);
        let zebra = summary.find("zebra.rs").unwrap();
        let alpha = summary.find("alpha.rs").unwrap();
        assert!(zebra < alpha);
    }

    #[test]
    fn missing_fields_default_to_unknown_and_zero() {
        let bare: FileChange = serde_json::from_str("{}").unwrap();
        let summary = format_files_summary(&[bare]);
        assert_eq!(summary, "Files changed:\n- <unknown> (+0/-0)");

        let partial: FileChange =
            serde_json::from_str(r#"{"filename": "src/handlers/upload.rs"}"#).unwrap();
        let summary = format_files_summary(&[partial]);
        assert!(summary.contains("- src/handlers/upload.rs (+0/-0)"));
    }
}
