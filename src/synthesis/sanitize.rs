const INDENT_WIDTH: usize = 4;

/// Folds typographic punctuation to ASCII and replaces anything else outside
/// ASCII with `*` (bullets) or `-`.
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{2022}' => out.push('*'),
            ch if ch.is_ascii() => out.push(ch),
            _ => out.push('-'),
        }
    }
    out
}

/// Re-indents block content by bracket depth before it is stored.
///
/// Only the first and last character of each trimmed line are inspected, so
/// brackets inside strings or comments can throw the depth off.
pub fn format_code_content(content: &str) -> String {
    let mut depth: usize = 0;
    let mut formatted = Vec::new();

    for line in content.trim().lines() {
        let trimmed = line.trim();
        if trimmed.starts_with(['}', ')', ']']) {
            depth = depth.saturating_sub(1);
        }

        if trimmed.is_empty() {
            formatted.push(String::new());
        } else {
            formatted.push(format!("{}{}", " ".repeat(depth * INDENT_WIDTH), trimmed));
        }

        if trimmed.ends_with(['{', '(', '[']) {
            depth += 1;
        }
    }

    formatted.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{format_code_content, sanitize_text};
    use proptest::prelude::*;

    #[test]
    fn sanitize_folds_typographic_punctuation() {
        let raw = "\u{201C}quoted\u{201D} it\u{2019}s \u{2014} done\u{2026} \u{2022} item \u{00E9}";
        assert_eq!(sanitize_text(raw), "\"quoted\" it's - done... * item -");
    }

    #[test]
    fn sanitize_leaves_ascii_untouched() {
        let raw = "```js\nconsole.log('ok');\n```";
        assert_eq!(sanitize_text(raw), raw);
    }

    #[test]
    fn format_reindents_by_bracket_depth() {
        let raw = "\n\nfunction main() {\nif (x) {\nrun([\n1,\n]);\n}\n\n}\n\n";
        let expected = "function main() {\n    if (x) {\n        run([\n            1,\n        ]);\n    }\n\n}";
        assert_eq!(format_code_content(raw), expected);
    }

    #[test]
    fn format_never_goes_below_zero_depth() {
        assert_eq!(format_code_content("}\n}\nx"), "}\n}\nx");
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(text in "\\PC*") {
            let once = sanitize_text(&text);
            prop_assert_eq!(sanitize_text(&once), once.clone());
            prop_assert!(once.is_ascii());
        }
    }
}
