// crates/tutor-core/src/utils.rs

/// Returns the trimmed text when it is present and not blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Canonical stored form of a topic label: trimmed, with blank labels dropped.
pub fn normalize_topic(topic: Option<String>) -> Option<String> {
    non_blank(topic.as_deref()).map(str::to_string)
}

/// Locates the first balanced JSON object or array embedded in free text.
///
/// Brackets inside string literals are ignored and mismatched closers abandon
/// the candidate, in which case scanning resumes at the next opening bracket.
pub fn extract_json_span(text: &str) -> Option<&str> {
    json_spans(text).next()
}

/// Every balanced `{...}` or `[...]` span in `text`, ordered by start offset.
///
/// Spans may nest; callers pick the first one that parses to the shape they
/// expect, so prose such as `[1]` before the payload is skipped.
pub fn json_spans(text: &str) -> impl Iterator<Item = &str> {
    text.char_indices()
        .filter(|(_, c)| *c == '{' || *c == '[')
        .filter_map(move |(start, _)| {
            balanced_end(&text[start..]).map(|end| &text[start..start + end])
        })
}

// Byte offset one past the bracket that closes the one at the start of `text`.
fn balanced_end(text: &str) -> Option<usize> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(c) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(idx + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_object_surrounded_by_prose() {
        let text = r#"Sure! Here you go: {"feedbackText": "Nice", "hint": "Check units"} Hope it helps."#;
        assert_eq!(
            extract_json_span(text),
            Some(r#"{"feedbackText": "Nice", "hint": "Check units"}"#)
        );
    }

    #[test]
    fn takes_first_balanced_span_not_last_brace() {
        let text = r#"{"a": 1} and later {"b": 2}"#;
        assert_eq!(extract_json_span(text), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn ignores_brackets_inside_strings() {
        let text = r#"[{"nextTopic": "Sets {A}", "explanation": "use ] carefully \" ok"}]"#;
        assert_eq!(extract_json_span(text), Some(text));
    }

    #[test]
    fn skips_unbalanced_candidates() {
        let text = r#"note: {oops] then {"ok": true}"#;
        assert_eq!(extract_json_span(text), Some(r#"{"ok": true}"#));
    }

    #[test]
    fn yields_later_spans_after_prose_brackets() {
        let text = r#"Verdict [partial]: {"ok": true}"#;
        let spans: Vec<&str> = json_spans(text).collect();
        assert_eq!(spans, vec!["[partial]", r#"{"ok": true}"#]);
    }

    #[test]
    fn none_when_no_structure() {
        assert_eq!(extract_json_span("just words"), None);
        assert_eq!(extract_json_span("{ never closed"), None);
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank(Some("  x ")), Some("x"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn topic_labels_are_trimmed_and_blank_ones_dropped() {
        assert_eq!(normalize_topic(Some("\tAlgebra\n".into())).as_deref(), Some("Algebra"));
        assert_eq!(normalize_topic(Some("\u{a0}".into())), None);
        assert_eq!(normalize_topic(Some(" \t\r\n".into())), None);
        assert_eq!(normalize_topic(None), None);
    }
}
