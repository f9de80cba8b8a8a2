//! Character-safe text shaping for model-facing output

/// First `limit` characters of `text`, never splitting a UTF-8 sequence.
///
/// Returns the kept prefix and the number of characters dropped.
pub fn truncate_chars(text: &str, limit: usize) -> (&str, usize) {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => (&text[..byte_idx], text[byte_idx..].chars().count()),
        None => (text, 0),
    }
}

/// Collapse line breaks into spaces so an item fits on one line.
pub fn flatten_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "瑞幸咖啡真好喝";
        let (kept, omitted) = truncate_chars(text, 4);
        assert_eq!(kept, "瑞幸咖啡");
        assert_eq!(omitted, 3);
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_chars("abc", 10), ("abc", 0));
        assert_eq!(truncate_chars("abc", 3), ("abc", 0));
    }

    #[test]
    fn line_breaks_become_spaces() {
        assert_eq!(flatten_line("a\nb\r\nc"), "a b c");
    }
}
