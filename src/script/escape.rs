//! AppleScript string-literal escaping.
//!
//! Every user-supplied value that ends up inside generated script source goes
//! through [`escape`] (or [`quote`], which also adds the surrounding quotes).

/// Escape `raw` so it can sit between double quotes in AppleScript source.
///
/// Backslash is replaced first so the escapes introduced for quotes and
/// control characters are not themselves re-escaped.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// Escape `raw` and wrap it in double quotes, ready to embed as a literal.
pub fn quote(raw: &str) -> String {
    format!("\"{}\"", escape(raw))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    /// Reads back one AppleScript string literal the way the interpreter
    /// does, returning the decoded value and the number of bytes consumed.
    fn read_literal(src: &str) -> Option<(String, usize)> {
        let mut chars = src.char_indices();
        if chars.next()?.1 != '"' {
            return None;
        }
        let mut out = String::new();
        while let Some((i, ch)) = chars.next() {
            match ch {
                '"' => return Some((out, i + 1)),
                '\\' => {
                    let (_, esc) = chars.next()?;
                    out.push(match esc {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        other => other,
                    });
                }
                // A raw line break inside a literal would end the statement.
                '\n' | '\r' => return None,
                other => out.push(other),
            }
        }
        None
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(escape("Ada Lovelace"), "Ada Lovelace");
    }

    #[test]
    fn empty_string_is_total() {
        assert_eq!(escape(""), "");
        assert_eq!(quote(""), "\"\"");
    }

    #[test]
    fn quotes_and_backslashes() {
        assert_eq!(escape(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape(r"C:\path"), r"C:\\path");
        // Backslash before quote must not collapse into an escaped quote.
        assert_eq!(escape("\\\""), "\\\\\\\"");
    }

    #[test]
    fn control_characters() {
        assert_eq!(escape("a\nb\rc\td"), "a\\nb\\rc\\td");
        assert_eq!(escape("\n\n\t"), "\\n\\n\\t");
    }

    #[test]
    fn literal_reads_back_exactly() {
        let samples = [
            "",
            "Ada Lovelace",
            "O'Brien & Sons",
            r#"He said "end tell""#,
            "line one\nline two\r\nline three",
            "\\",
            "\\\\\"\\",
            "tab\there",
            "\"; do shell script \"rm -rf ~\" --",
            "emoji 🚀 and accents éàü",
            "pipe | and @@FS@@ sentinel",
            "\n\r\t",
        ];
        for raw in samples {
            let literal = quote(raw);
            let (decoded, consumed) = read_literal(&literal)
                .unwrap_or_else(|| panic!("literal for {raw:?} did not parse: {literal}"));
            assert_eq!(decoded, raw);
            assert_eq!(consumed, literal.len(), "literal for {raw:?} ended early");
        }
    }

    #[test]
    fn escaped_output_has_no_raw_line_breaks() {
        let escaped = escape("a\nb\rc");
        assert!(!escaped.contains('\n'));
        assert!(!escaped.contains('\r'));
    }
}
