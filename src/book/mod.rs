//! Book loading: turns an input file into normalized document text.
//!
//! EPUB files go through the spine reader; anything else is read as UTF-8
//! plain text. Both paths end in [`normalize`].

mod epub_reader;
mod normalize;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

pub use epub_reader::read_epub;
pub use normalize::normalize;

use crate::text::is_cjk;

/// Input format, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookFormat {
    /// EPUB container (*.epub)
    Epub,
    /// UTF-8 text (everything else)
    PlainText,
}

/// Detect the input format of `path`.
pub fn detect_format<P: AsRef<Path>>(path: P) -> BookFormat {
    match path.as_ref().extension().map(|ext| ext.to_string_lossy().to_lowercase()) {
        Some(ext) if ext == "epub" => BookFormat::Epub,
        _ => BookFormat::PlainText,
    }
}

/// Load a book and return its normalized text.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_text(path: &Path) -> Result<String> {
    let raw = match detect_format(path) {
        BookFormat::Epub => read_epub(path)?,
        BookFormat::PlainText => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read text file {}", path.display()))?
        }
    };

    let text = normalize(&raw);
    info!("Loaded {} characters of text from {}", text.chars().count(), path.display());
    Ok(text)
}

/// CJK writing system of a book, used to pick a default voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CjkScript {
    Chinese,
    Japanese,
}

/// Hiragana and katakana.
fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{30FF}')
}

/// Which CJK script the text is written in, if any.
///
/// Kana anywhere makes it Japanese; Han characters alone make it Chinese.
pub fn detect_cjk_script(text: &str) -> Option<CjkScript> {
    let mut han = false;
    for c in text.chars() {
        if is_kana(c) {
            return Some(CjkScript::Japanese);
        }
        han |= is_cjk(c);
    }
    han.then_some(CjkScript::Chinese)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("book.epub"), BookFormat::Epub);
        assert_eq!(detect_format("/library/BOOK.EPUB"), BookFormat::Epub);
        assert_eq!(detect_format("book.txt"), BookFormat::PlainText);
        assert_eq!(detect_format("no_extension"), BookFormat::PlainText);
    }

    #[test]
    fn test_load_plain_text_is_normalized() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        std::io::Write::write_all(&mut file, "  Chapter 1\r\n\r\n\r\nIt  begins.\u{200B}  ".as_bytes()).unwrap();

        let text = load_text(file.path()).unwrap();
        assert_eq!(text, "Chapter 1\n\nIt begins.");
    }

    #[test]
    fn test_detect_cjk_script() {
        assert_eq!(detect_cjk_script("Chapter 1 第一章"), Some(CjkScript::Chinese));
        assert_eq!(detect_cjk_script("吾輩は猫である。名前はまだ無い。"), Some(CjkScript::Japanese));
        assert_eq!(detect_cjk_script("カタカナ only"), Some(CjkScript::Japanese));
        assert_eq!(detect_cjk_script("Plain English text."), None);
        assert_eq!(detect_cjk_script("。！？"), None);
    }
}
