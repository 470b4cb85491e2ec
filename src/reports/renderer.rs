use crate::types::SessionState;

pub const SUMMARY_HEADING: &str = "## Summary";
pub const DETAILS_LABEL: &str = "Click to view full agent results";
pub const STYLE_HEADING: &str = "### Style Agent Result";
pub const REVIEWER_HEADING: &str = "### Reviewer Agent Result";
pub const SECURITY_HEADING: &str = "### Security Agent Result";

/// Renders the final review document. The structure is owned by this
/// template: heading order and the collapsible wrapper never depend on
/// model output. Agent results are embedded verbatim; the security section
/// in particular is reproduced byte-for-byte so citations survive intact.
pub fn render_merged_document(summary: &str, session: &SessionState) -> String {
    format!(
        r#"## Summary
{summary}

<details>
<summary>Click to view full agent results</summary>

### Style Agent Result
{style}

### Reviewer Agent Result
{reviewer}

### Security Agent Result
{security}

</details>"#,
        summary = summary.trim(),
        style = session.style_result,
        reviewer = session.reviewer_result,
        security = session.security_result,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionState {
        SessionState::new(
            "- logic looks sound".to_string(),
            "SQL injection risk. Sources: [CWE-89](https://cwe.mitre.org/data/definitions/89.html)"
                .to_string(),
            "- naming is consistent".to_string(),
        )
    }

    #[test]
    fn headings_appear_exactly_once_each() {
        let doc = render_merged_document("Two reviewers found minor issues.", &session());

        for heading in [
            SUMMARY_HEADING,
            STYLE_HEADING,
            REVIEWER_HEADING,
            SECURITY_HEADING,
        ] {
            assert_eq!(doc.matches(heading).count(), 1, "heading: {heading}");
        }
        assert_eq!(doc.matches(DETAILS_LABEL).count(), 1);
    }

    #[test]
    fn sections_appear_in_fixed_order() {
        let doc = render_merged_document("Summary.", &session());

        let summary_at = doc.find(SUMMARY_HEADING).unwrap();
        let style_at = doc.find(STYLE_HEADING).unwrap();
        let reviewer_at = doc.find(REVIEWER_HEADING).unwrap();
        let security_at = doc.find(SECURITY_HEADING).unwrap();

        assert!(summary_at < style_at);
        assert!(style_at < reviewer_at);
        assert!(reviewer_at < security_at);
        assert!(security_at < doc.find("</details>").unwrap());
    }

    #[test]
    fn security_result_is_embedded_byte_for_byte() {
        let session = session();
        let doc = render_merged_document("Summary.", &session);

        assert!(doc.contains(&session.security_result));
        assert!(doc.contains("[CWE-89](https://cwe.mitre.org/data/definitions/89.html)"));
    }

    #[test]
    fn empty_results_still_produce_a_well_formed_document() {
        let session = SessionState::new(String::new(), String::new(), String::new());
        let doc = render_merged_document("", &session);

        assert!(doc.starts_with(SUMMARY_HEADING));
        assert!(doc.contains("<details>"));
        assert!(doc.trim_end().ends_with("</details>"));
        assert_eq!(doc.matches(REVIEWER_HEADING).count(), 1);
    }
}
