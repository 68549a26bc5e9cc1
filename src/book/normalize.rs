//! Text cleanup between extraction and segmentation.
//!
//! Repairs common mojibake, removes control characters and html2text
//! decorations, and normalizes whitespace so paragraph breaks are exactly one
//! blank line.

use std::sync::LazyLock;

use regex::Regex;

/// Replacement patterns applied in order.
static CLEANUP_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // Link footnotes emitted by html2text ("[1]: chapter02.xhtml#note")
        (r"(?m)^\[\d+\]: .*$", ""),
        // Inline link markers ("[text][1]" -> "text")
        (r"\[([^\]\n]*)\]\[\d+\]", "$1"),
        // Heading markers
        (r"(?m)^#{1,6} +", ""),
        // Emphasis markers ("*word*", "**some words**"), not a lone "5 * 3"
        (r"(?m)(^|[^\w*])\*{1,2}([^*\s](?:[^*\n]*[^*\s])?)\*{1,2}", "$1$2"),
        // Horizontal rules
        (r"(?m)^[─━\-_=*]{3,}[ \t]*$", ""),
        // Collapse horizontal whitespace
        (r"[ \t]+", " "),
        // Trim lines
        (r"(?m)^ +| +$", ""),
        // At most one blank line between paragraphs
        (r"\n{3,}", "\n\n"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).expect("cleanup pattern is valid"), replacement))
    .collect()
});

/// UTF-8 punctuation that was decoded as Windows-1252 or Latin-1 somewhere
/// upstream, and what it should read as.
const MOJIBAKE: &[(&str, &str)] = &[
    // Windows-1252
    ("\u{e2}\u{20ac}\u{2122}", "'"),
    ("\u{e2}\u{20ac}\u{2dc}", "'"),
    ("\u{e2}\u{20ac}\u{153}", "\""),
    ("\u{e2}\u{20ac}\u{9d}", "\""),
    ("\u{e2}\u{20ac}\u{201c}", "\u{2013}"),
    ("\u{e2}\u{20ac}\u{201d}", "\u{2014}"),
    ("\u{e2}\u{20ac}\u{a6}", "\u{2026}"),
    // Latin-1
    ("\u{e2}\u{80}\u{99}", "'"),
    ("\u{e2}\u{80}\u{98}", "'"),
    ("\u{e2}\u{80}\u{9c}", "\""),
    ("\u{e2}\u{80}\u{9d}", "\""),
    ("\u{e2}\u{80}\u{93}", "\u{2013}"),
    ("\u{e2}\u{80}\u{94}", "\u{2014}"),
    ("\u{e2}\u{80}\u{a6}", "\u{2026}"),
];

/// "Â" left in front of a Latin-1 symbol by a double-decoded two-byte sequence ("Â\u{a0}", "Â©").
static STRAY_CIRCUMFLEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\u{c2}([\u{80}-\u{bf}])").expect("stray circumflex pattern is valid"));

/// Undo double-decoded UTF-8 punctuation.
fn repair_mojibake(text: &str) -> String {
    let mut repaired = MOJIBAKE.iter().fold(text.to_string(), |acc, (wrong, right)| acc.replace(wrong, right));
    if repaired.contains('\u{c2}') {
        repaired = STRAY_CIRCUMFLEX.replace_all(&repaired, "$1").into_owned();
    }
    repaired
}

/// Characters dropped outright: zero-width marks, BOM and soft hyphens.
#[inline]
fn is_invisible(ch: char) -> bool {
    matches!(ch, '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}')
}

/// Normalize raw extracted text for segmentation.
pub fn normalize(raw: &str) -> String {
    // Before control characters go: the Latin-1 forms contain C1 controls
    let repaired = repair_mojibake(raw);
    let unified = repaired.replace("\r\n", "\n").replace('\r', "\n");

    let mut cleaned: String = unified
        .chars()
        .filter(|&c| !is_invisible(c))
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
        .map(|c| if c == '\u{00A0}' || c == '\u{3000}' { ' ' } else { c })
        .collect();

    for (regex, replacement) in CLEANUP_PATTERNS.iter() {
        cleaned = regex.replace_all(&cleaned, *replacement).into_owned();
    }

    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_characters_removed() {
        assert_eq!(normalize("Hello\u{0007} wor\u{200B}ld\u{FEFF}"), "Hello world");
    }

    #[test]
    fn test_line_endings_and_blank_lines() {
        assert_eq!(normalize("One.\r\n\r\n\r\n\r\nTwo.\rThree."), "One.\n\nTwo.\nThree.");
    }

    #[test]
    fn test_whitespace_collapsed_and_lines_trimmed() {
        assert_eq!(normalize("  a \t  b  \n\u{3000}\u{3000}第一段  "), "a b\n第一段");
    }

    #[test]
    fn test_html2text_decorations_stripped() {
        let raw = "# Chapter One\n\nShe read *the* [letter][1] **twice**.\n\n-----\n\n[1]: notes.xhtml#n1\n";
        assert_eq!(normalize(raw), "Chapter One\n\nShe read the letter twice.");
    }

    #[test]
    fn test_literal_asterisks_kept() {
        assert_eq!(normalize("5 * 3 and 2 * 4"), "5 * 3 and 2 * 4");
        assert_eq!(normalize("Rated ** out of five"), "Rated ** out of five");
        assert_eq!(normalize("*One* and *two*"), "One and two");
    }

    #[test]
    fn test_mojibake_repaired() {
        // Windows-1252 reading of UTF-8 quotes, then a non-breaking space read as Latin-1
        let raw = "It\u{e2}\u{20ac}\u{2122}s \u{e2}\u{20ac}\u{153}quoted\u{e2}\u{20ac}\u{9d}\u{c2}\u{a0}here";
        assert_eq!(normalize(raw), "It's \"quoted\" here");

        let raw = "Wait\u{e2}\u{80}\u{94}what\u{e2}\u{80}\u{99}s that\u{e2}\u{80}\u{a6}";
        assert_eq!(normalize(raw), "Wait\u{2014}what's that\u{2026}");
    }

    #[test]
    fn test_legitimate_circumflex_kept() {
        assert_eq!(normalize("\u{c2}ge d'or, Ch\u{e2}teau"), "\u{c2}ge d'or, Ch\u{e2}teau");
    }

    #[test]
    fn test_chinese_text_preserved() {
        let raw = "这是 第一段。\n这是第二段。";
        assert_eq!(normalize(raw), raw);
    }
}
