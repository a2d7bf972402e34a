use kconfig_protocol::VerificationResult;

/// Human-readable summary of a `verify` run
pub fn render_results(results: &[VerificationResult]) -> String {
    let mut out = String::new();
    for result in results {
        let status = if result.available { "FOUND" } else { "MISSING" };
        out.push_str(&format!(
            "CONFIG_{} {status} [{} / {}]\n",
            result.name,
            result.search_method.as_str(),
            format!("{:?}", result.confidence).to_lowercase()
        ));
        if let Some(source) = &result.source {
            out.push_str(&format!("  source: {source}\n"));
        }
        if let Some(description) = &result.description {
            out.push_str(&format!("  {}\n", truncate_one_line(description, 120)));
        }
        if !result.dependencies.is_empty() {
            out.push_str(&format!(
                "  depends on: {}\n",
                result.dependencies.join(", ")
            ));
        }
        if let Some(note) = &result.note {
            out.push_str(&format!("  note: {note}\n"));
        }
        if let Some(warning) = &result.warning {
            out.push_str(&format!("  warning: {warning}\n"));
        }
        if !result.alternatives.is_empty() {
            out.push_str(&format!(
                "  alternatives: {}\n",
                result.alternatives.join(", ")
            ));
        }
        for suggestion in &result.suggestions {
            out.push_str(&format!("  - {suggestion}\n"));
        }
    }

    let found = results.iter().filter(|r| r.available).count();
    out.push_str(&format!("{found}/{} symbols available", results.len()));
    out
}

fn truncate_one_line(text: &str, max_chars: usize) -> String {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= max_chars {
        return line;
    }
    let mut clipped: String = line.chars().take(max_chars).collect();
    clipped.push('…');
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use kconfig_protocol::{Confidence, SearchMethod};

    #[test]
    fn renders_found_and_missing() {
        let found = VerificationResult::found(
            "BT_SCAN",
            "zephyr/subsys/bluetooth/Kconfig",
            Confidence::High,
            SearchMethod::Indexed,
        )
        .with_description(Some("Enables scanning.".to_string()))
        .with_dependencies(vec!["BT".to_string()]);
        let mut missing = VerificationResult::unavailable("BT_HRS");
        missing.warning = Some("Not part of this SDK release".to_string());
        missing.add_alternatives(["BT_BAS"]);

        let text = render_results(&[found, missing]);
        assert!(text.contains("CONFIG_BT_SCAN FOUND [indexed / high]"));
        assert!(text.contains("  source: zephyr/subsys/bluetooth/Kconfig"));
        assert!(text.contains("  depends on: BT"));
        assert!(text.contains("CONFIG_BT_HRS MISSING [not_found / low]"));
        assert!(text.contains("  alternatives: BT_BAS"));
        assert!(text.ends_with("1/2 symbols available"));
    }

    #[test]
    fn long_descriptions_are_clipped() {
        let text = truncate_one_line(&"word ".repeat(50), 20);
        assert_eq!(text.chars().count(), 21);
        assert!(text.ends_with('…'));
    }
}
