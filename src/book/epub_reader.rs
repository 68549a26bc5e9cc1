//! EPUB text extraction.
//!
//! Walks the spine in reading order, decodes each XHTML document, converts it
//! to plain text and joins the documents with paragraph breaks.
//!
//! Chapters are read as raw bytes. The charset comes from a byte order mark,
//! the XML declaration or a `<meta>` tag; chapters that declare nothing and
//! are not valid UTF-8 go through charset detection. A chapter is never
//! dropped for its encoding: undecodable bytes are replaced and logged.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use epub::doc::EpubDoc;
use regex::bytes::Regex;
use tracing::{debug, info, warn};

/// Line width handed to html2text. Wide enough that paragraphs are never wrapped.
const WRAP_WIDTH: usize = 10_000;

/// Bytes searched for a charset declaration.
const DECLARATION_WINDOW: usize = 1024;

/// `<?xml ... encoding="..."?>`
static XML_ENCODING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)<\?xml[^>]*?encoding\s*=\s*["']([A-Za-z0-9._:-]+)["']"#).expect("xml encoding pattern is valid")
});

/// `<meta charset="...">` and `<meta http-equiv="Content-Type" content="...; charset=...">`
static META_CHARSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i-u)<meta[^>]*?charset\s*=\s*["']?([A-Za-z0-9._:-]+)"#).expect("meta charset pattern is valid")
});

/// A chapter decoded to UTF-8.
#[derive(Debug)]
struct DecodedChapter {
    text: String,
    encoding: &'static Encoding,
    /// Some bytes were not valid in `encoding` and were replaced
    lossy: bool,
}

/// Charset named by the document itself, if any.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(DECLARATION_WINDOW)];
    XML_ENCODING
        .captures(head)
        .or_else(|| META_CHARSET.captures(head))
        .and_then(|caps| Encoding::for_label(&caps[1]))
}

/// Decode one chapter's bytes.
fn decode_chapter(bytes: &[u8]) -> DecodedChapter {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, lossy) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return DecodedChapter { text: text.into_owned(), encoding, lossy };
    }

    let declared = declared_encoding(bytes);
    if declared.is_none_or(|encoding| encoding == UTF_8)
        && let Ok(text) = std::str::from_utf8(bytes)
    {
        return DecodedChapter { text: text.to_string(), encoding: UTF_8, lossy: false };
    }

    if let Some(encoding) = declared.filter(|&encoding| encoding != UTF_8) {
        let (text, lossy) = encoding.decode_without_bom_handling(bytes);
        if !lossy {
            return DecodedChapter { text: text.into_owned(), encoding, lossy };
        }
        debug!("Chapter does not decode cleanly as declared {}, detecting", encoding.name());
    }

    // Missing or wrong declaration
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (text, lossy) = encoding.decode_without_bom_handling(bytes);
    DecodedChapter { text: text.into_owned(), encoding, lossy }
}

/// Read every spine document of an EPUB as plain text.
///
/// # Errors
/// Returns an error if the file cannot be opened as an EPUB or contains no text.
pub fn read_epub(path: &Path) -> Result<String> {
    let mut doc = EpubDoc::new(path).with_context(|| format!("Failed to open EPUB at {}", path.display()))?;

    let mut sections: Vec<String> = Vec::new();
    let mut skipped = 0;

    loop {
        let item = doc.get_current_id().unwrap_or_default();
        match doc.get_current() {
            Some((bytes, mime)) if mime.contains("html") => {
                let chapter = decode_chapter(&bytes);
                if chapter.lossy {
                    warn!("⚠️  Spine item {} is not valid {}; undecodable bytes were replaced", item, chapter.encoding.name());
                } else if chapter.encoding != UTF_8 {
                    debug!("Decoded spine item {} as {}", item, chapter.encoding.name());
                }

                let plain = html2text::from_read(chapter.text.as_bytes(), WRAP_WIDTH);
                let plain = plain.trim();
                if plain.is_empty() {
                    skipped += 1;
                } else {
                    sections.push(plain.to_string());
                }
            }
            Some((_, mime)) => {
                debug!("Skipping spine item {} with MIME type {}", item, mime);
                skipped += 1;
            }
            None => {
                warn!("⚠️  Spine item {} is missing from the archive", item);
                skipped += 1;
            }
        }

        if !doc.go_next() {
            break;
        }
    }

    if sections.is_empty() {
        anyhow::bail!("No textual content found in {}", path.display());
    }

    info!("📖 Read {} sections from {} ({} empty or non-text items skipped)", sections.len(), path.display(), skipped);
    Ok(sections.join("\n\n"))
}
