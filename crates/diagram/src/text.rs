//! Cleanup for text returned by extractors.

use std::sync::LazyLock;

use regex::Regex;

/// A line holding nothing but a page number
static PAGE_NUMBER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\d+[ \t]*\r?$").expect("page number pattern"));
/// Control and format characters other than whitespace
static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{C}&&[^\s]]").expect("control character pattern"));
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Normalize extracted text.
///
/// Page-number lines are dropped first so that they are still recognisable
/// as lines; then control characters are removed, whitespace runs become a
/// single space and the result is trimmed.
///
/// This is not the same as collapsing whitespace first and then stripping
/// numeric lines: that order turns the text into a single line, so it only
/// removes a number when the whole text is that number. Here `"12\nIntro"`
/// becomes `"Intro"`, not `"12 Intro"`.
pub fn clean_text(text: &str) -> String {
    let without_page_numbers = PAGE_NUMBER_LINE.replace_all(text, "");
    let without_controls = CONTROL_CHARS.replace_all(&without_page_numbers, "");
    WHITESPACE_RUN
        .replace_all(&without_controls, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(clean_text("  乾 \t 元亨\n\n利貞  "), "乾 元亨 利貞");
    }

    #[test]
    fn test_drops_page_number_lines() {
        assert_eq!(clean_text("12\nThe Creative\n  13  \nheaven"), "The Creative heaven");
        assert_eq!(clean_text("Hexagram 1\r\n42\r\n"), "Hexagram 1");
    }

    #[test]
    fn test_page_number_line_is_dropped_before_collapsing() {
        assert_eq!(clean_text("12\nIntro"), "Intro");
    }

    #[test]
    fn test_keeps_numbers_inside_text() {
        assert_eq!(clean_text("line 6 of 6"), "line 6 of 6");
    }

    #[test]
    fn test_removes_control_characters() {
        assert_eq!(clean_text("a\u{0007}b\u{200b}c d\u{feff}"), "abc d");
    }

    #[test]
    fn test_empty_and_blank_input() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n 7 \n\t"), "");
    }
}
