//! Boundary classification for the segmenter.
//!
//! A boundary is a position between two characters where a chunk may end.
//! Positions are char indices: boundary `c` ends a chunk right after
//! `chars[c - 1]` and the next chunk starts at the first non-whitespace
//! character at or after `chars[c]`.

use std::fmt;

use serde::Serialize;

/// Kind of break a chunk ended on, ordered from most to least preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    /// A whitespace run holding two or more line feeds
    Paragraph,
    /// Sentence terminator, Western (`. ! ?`) or East Asian (`。！？`)
    Sentence,
    /// Clause punctuation (`, ; :` and `，；：、`)
    Clause,
    /// Plain whitespace between words
    Whitespace,
    /// Change between Latin-like and CJK text with no space in between
    Script,
    /// Gap between two CJK characters
    Character,
    /// Arbitrary character offset inside an unbreakable run
    Forced,
    /// End of the text
    End,
}

impl BoundaryKind {
    /// Whether a chunk ending here closes a sentence or paragraph.
    pub fn ends_sentence(self) -> bool {
        matches!(self, BoundaryKind::Paragraph | BoundaryKind::Sentence | BoundaryKind::End)
    }
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BoundaryKind::Paragraph => "paragraph",
            BoundaryKind::Sentence => "sentence",
            BoundaryKind::Clause => "clause",
            BoundaryKind::Whitespace => "whitespace",
            BoundaryKind::Script => "script",
            BoundaryKind::Character => "character",
            BoundaryKind::Forced => "forced",
            BoundaryKind::End => "end",
        };
        f.pad(name)
    }
}

/// Check if a character belongs to a script written without spaces
/// (Han ideographs, Hiragana, Katakana).
#[inline]
pub fn is_cjk(ch: char) -> bool {
    matches!(
        ch as u32,
        0x3040..=0x30FF      // Hiragana, Katakana
        | 0x3400..=0x4DBF    // CJK Extension A
        | 0x4E00..=0x9FFF    // CJK Unified Ideographs
        | 0xF900..=0xFAFF    // CJK Compatibility Ideographs
        | 0x20000..=0x2FA1F  // Extensions B-F, Compatibility Supplement
    )
}

#[inline]
fn is_terminator(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?' | '。' | '！' | '？' | '｡' | '…' | '‼' | '⁇' | '⁈' | '⁉')
}

#[inline]
fn is_clause_mark(ch: char) -> bool {
    matches!(ch, ',' | ';' | ':' | '，' | '；' | '：' | '、' | '﹐' | '﹔' | '﹕')
}

/// Closing quotes and brackets that stay attached to the punctuation before them.
#[inline]
fn is_closer(ch: char) -> bool {
    matches!(
        ch,
        '"' | '\'' | ')' | ']' | '}' | '”' | '’' | '»' | '）' | '」' | '』' | '】' | '》' | '〉' | '〕' | '］'
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Cjk,
    Alphabetic,
}

fn script(ch: char) -> Option<Script> {
    if is_cjk(ch) {
        Some(Script::Cjk)
    } else if ch.is_alphanumeric() {
        Some(Script::Alphabetic)
    } else {
        None
    }
}

/// Whether a run of `is_mark` characters, optionally followed by closers, ends at `c`.
///
/// The run must be maximal: `c` is not inside `?!`, `……` or `."`. An ASCII mark
/// directly followed by an ASCII alphanumeric is part of a number or token
/// (`80.79`, `1,000`, `e.g`) and never ends anything.
fn mark_run_ends_at(chars: &[char], c: usize, is_mark: fn(char) -> bool) -> bool {
    let next = chars.get(c).copied();
    if next.is_some_and(|n| is_mark(n) || is_closer(n)) {
        return false;
    }

    let mut i = c;
    while i > 0 && is_closer(chars[i - 1]) {
        i -= 1;
    }
    if i == 0 || !is_mark(chars[i - 1]) {
        return false;
    }

    let glued_to_token = i == c && chars[i - 1].is_ascii() && next.is_some_and(|n| n.is_ascii_alphanumeric());
    !glued_to_token
}

/// Whether the whitespace run starting at `rest[0]` contains a blank line.
fn is_paragraph_gap(rest: &[char]) -> bool {
    rest.iter().take_while(|c| c.is_whitespace()).filter(|&&c| c == '\n').nth(1).is_some()
}

/// Classify the position `c` (with `0 < c < chars.len()`).
///
/// Returns the most preferred boundary kind available there, or `None` when a
/// chunk must not end at `c` (inside a word, before punctuation, or inside a
/// whitespace run).
pub(crate) fn classify(chars: &[char], c: usize) -> Option<BoundaryKind> {
    debug_assert!(c > 0 && c < chars.len());

    let prev = chars[c - 1];
    let next = chars[c];

    if prev.is_whitespace() {
        return None;
    }
    if next.is_whitespace() && is_paragraph_gap(&chars[c..]) {
        return Some(BoundaryKind::Paragraph);
    }
    if mark_run_ends_at(chars, c, is_terminator) {
        return Some(BoundaryKind::Sentence);
    }
    if mark_run_ends_at(chars, c, is_clause_mark) {
        return Some(BoundaryKind::Clause);
    }
    if next.is_whitespace() {
        return Some(BoundaryKind::Whitespace);
    }
    if let (Some(a), Some(b)) = (script(prev), script(next))
        && a != b
    {
        return Some(BoundaryKind::Script);
    }
    if is_cjk(prev) && is_cjk(next) {
        return Some(BoundaryKind::Character);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_at(text: &str, c: usize) -> Option<BoundaryKind> {
        let chars: Vec<char> = text.chars().collect();
        classify(&chars, c)
    }

    #[test]
    fn test_priority_order() {
        assert!(BoundaryKind::Paragraph < BoundaryKind::Sentence);
        assert!(BoundaryKind::Sentence < BoundaryKind::Clause);
        assert!(BoundaryKind::Clause < BoundaryKind::Whitespace);
        assert!(BoundaryKind::Whitespace < BoundaryKind::Script);
        assert!(BoundaryKind::Script < BoundaryKind::Character);
        assert!(BoundaryKind::Character < BoundaryKind::Forced);
    }

    #[test]
    fn test_western_sentence_end() {
        assert_eq!(kind_at("Hi. There", 3), Some(BoundaryKind::Sentence));
        assert_eq!(kind_at("Why?! No", 5), Some(BoundaryKind::Sentence));
        // Inside a terminator run
        assert_eq!(kind_at("Why?! No", 4), None);
    }

    #[test]
    fn test_east_asian_sentence_end() {
        assert_eq!(kind_at("走吧。然后", 3), Some(BoundaryKind::Sentence));
        assert_eq!(kind_at("真的！好", 3), Some(BoundaryKind::Sentence));
        assert_eq!(kind_at("什么？好", 3), Some(BoundaryKind::Sentence));
    }

    #[test]
    fn test_decimal_point_is_not_a_sentence_end() {
        // "80.79": position after the '.'
        assert_eq!(kind_at("for 80.79 years", 7), None);
        assert_eq!(kind_at("1,000 people", 2), None);
    }

    #[test]
    fn test_closing_quote_stays_with_sentence() {
        let text = "\"Stop.\" He ran";
        assert_eq!(kind_at(text, 6), None);
        assert_eq!(kind_at(text, 7), Some(BoundaryKind::Sentence));

        let text = "他说：“走吧。”然后";
        assert_eq!(kind_at(text, 7), None);
        assert_eq!(kind_at(text, 8), Some(BoundaryKind::Sentence));
    }

    #[test]
    fn test_clause_marks() {
        assert_eq!(kind_at("Well, fine", 5), Some(BoundaryKind::Clause));
        assert_eq!(kind_at("first; second", 6), Some(BoundaryKind::Clause));
        assert_eq!(kind_at("所以，如今", 3), Some(BoundaryKind::Clause));
        assert_eq!(kind_at("苹果、香蕉", 3), Some(BoundaryKind::Clause));
    }

    #[test]
    fn test_paragraph_gap() {
        assert_eq!(kind_at("Title\n\nBody", 5), Some(BoundaryKind::Paragraph));
        assert_eq!(kind_at("Title\r\n \r\nBody", 5), Some(BoundaryKind::Paragraph));
        assert_eq!(kind_at("Title\nBody", 5), Some(BoundaryKind::Whitespace));
    }

    #[test]
    fn test_whitespace_and_word_interior() {
        assert_eq!(kind_at("hello world", 5), Some(BoundaryKind::Whitespace));
        assert_eq!(kind_at("hello world", 3), None);
        // Inside a whitespace run
        assert_eq!(kind_at("hello  world", 6), None);
    }

    #[test]
    fn test_script_change_and_cjk_gap() {
        assert_eq!(kind_at("dog猫", 3), Some(BoundaryKind::Script));
        assert_eq!(kind_at("猫dog", 1), Some(BoundaryKind::Script));
        assert_eq!(kind_at("你好世界", 2), Some(BoundaryKind::Character));
        // Never directly before punctuation
        assert_eq!(kind_at("十。", 1), None);
    }

    #[test]
    fn test_is_cjk() {
        assert!(is_cjk('中'));
        assert!(is_cjk('か'));
        assert!(is_cjk('カ'));
        assert!(!is_cjk('a'));
        assert!(!is_cjk('。'));
        assert!(!is_cjk('한'));
    }

    #[test]
    fn test_ends_sentence() {
        assert!(BoundaryKind::Sentence.ends_sentence());
        assert!(BoundaryKind::Paragraph.ends_sentence());
        assert!(!BoundaryKind::Clause.ends_sentence());
        assert!(!BoundaryKind::Forced.ends_sentence());
    }
}
