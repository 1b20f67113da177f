//! Sanitization of untrusted free text before it is persisted.
//!
//! Audit rows are rendered later by internal tooling; every user-supplied
//! string (user agent, email, error detail) goes through [`sanitize_text`]
//! so the stored trail never carries raw markup or control characters.

/// Maximum length of a sanitized field
pub const MAX_SANITIZED_LENGTH: usize = 512;

/// Strip control characters and escape markup-significant characters.
///
/// Output is safe to embed in HTML or log lines as-is. Input longer than
/// [`MAX_SANITIZED_LENGTH`] characters is truncated before escaping.
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars().take(MAX_SANITIZED_LENGTH) {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Sanitize an optional field, mapping empty results to `None`
pub fn sanitize_opt(input: Option<&str>) -> Option<String> {
    input.map(sanitize_text).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_markup() {
        let out = sanitize_text("<script>alert('xss')</script>");
        assert!(!out.contains('<'));
        assert!(!out.contains('>'));
        assert_eq!(
            out,
            "&lt;script&gt;alert(&#x27;xss&#x27;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_escapes_quotes_and_ampersands() {
        assert_eq!(sanitize_text(r#"a"b&c'd"#), "a&quot;b&amp;c&#x27;d");
    }

    #[test]
    fn test_strips_control_characters() {
        let out = sanitize_text("line1\r\nline2\x00\x1b[31m");
        assert_eq!(out, "line1line2[31m");
    }

    #[test]
    fn test_sql_injection_text_is_inert() {
        let out = sanitize_text("'; DROP TABLE subjects; --");
        assert!(!out.contains('\''));
        assert_eq!(out, "&#x27;; DROP TABLE subjects; --");
    }

    #[test]
    fn test_truncates_long_input() {
        let long = "a".repeat(MAX_SANITIZED_LENGTH * 2);
        assert_eq!(sanitize_text(&long).len(), MAX_SANITIZED_LENGTH);
    }

    #[test]
    fn test_sanitize_opt() {
        assert_eq!(sanitize_opt(None), None);
        assert_eq!(sanitize_opt(Some("\x00\x01")), None);
        assert_eq!(sanitize_opt(Some("ok")), Some("ok".to_string()));
    }
}
