//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
    let mut out = tpl.to_string();
    for (k, v) in pairs {
        let needle = format!("{{{}}}", k);
        out = out.replace(&needle, v);
    }
    out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let cut = s
            .char_indices()
            .take_while(|(i, _)| *i < max)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}… ({} bytes total)", &s[..cut], s.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_fills_all_pairs() {
        let out = fill_template("{a} and {b} and {a}", &[("a", "1"), ("b", "2")]);
        assert_eq!(out, "1 and 2 and 1");
    }

    #[test]
    fn truncation_keeps_short_strings_intact() {
        assert_eq!(trunc_for_log("short", 100), "short");
        assert!(trunc_for_log(&"x".repeat(500), 32).contains("500 bytes total"));
    }
}
