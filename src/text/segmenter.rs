//! Greedy long-text segmenter.
//!
//! Splits normalized book text into chunks that fit a speech model's input
//! budget. Each cut is placed on the most preferred boundary found by a
//! backward search from the overflow point, so chunks end on paragraph and
//! sentence breaks whenever the budget allows it.
//!
//! Chunk spans tile the source exactly: the whitespace between two chunks
//! belongs to the span of the chunk before it, and leading whitespace belongs
//! to the first chunk. Delivered chunk text is always trimmed.

use std::fmt;
use std::ops::Range;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::boundary::{BoundaryKind, classify};

/// Default chunk budget in characters.
///
/// Kokoro handles roughly 500 phoneme tokens per call; 250 characters of prose
/// stays well inside that for both English and Chinese.
pub const DEFAULT_MAX_LENGTH: usize = 250;

/// Errors raised by the segmenter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("invalid segmenter configuration: {0}")]
    InvalidConfiguration(String),
}

/// What to do with a run that has no break point inside the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OversizePolicy {
    /// Emit the whole run as one oversized chunk
    #[default]
    Keep,
    /// Cut the run at the character budget
    Split,
}

/// Non-fatal condition attached to a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChunkWarning {
    /// A run with no break point is longer than the budget
    OversizedAtomicUnit { length: usize, max_length: usize },
    /// The chunk runs past the budget to end on a sentence boundary
    Overshoot { length: usize, max_length: usize },
}

impl fmt::Display for ChunkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkWarning::OversizedAtomicUnit { length, max_length } => {
                write!(f, "oversized atomic unit ({} > {} chars)", length, max_length)
            }
            ChunkWarning::Overshoot { length, max_length } => {
                write!(f, "overshoot to sentence end ({} > {} chars)", length, max_length)
            }
        }
    }
}

/// A contiguous piece of the source text sized for one synthesis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position of this chunk in the sequence (0-based)
    pub index: usize,
    /// Byte range in the source, including the whitespace that follows the chunk
    pub span: Range<usize>,
    /// Byte range of the trimmed text inside `span`
    pub content: Range<usize>,
    /// Trimmed text for the synthesis layer
    pub text: String,
    /// Boundary the chunk ended on
    pub boundary: BoundaryKind,
    /// Condition the caller may want to log, skip or flag
    pub warning: Option<ChunkWarning>,
}

impl Chunk {
    /// Length of the delivered text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the chunk closes a sentence or paragraph.
    pub fn ends_sentence(&self) -> bool {
        self.boundary.ends_sentence()
    }

    pub fn is_oversized(&self) -> bool {
        matches!(self.warning, Some(ChunkWarning::OversizedAtomicUnit { .. }))
    }

    /// The raw slice of `source` this chunk covers, separators included.
    pub fn raw<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }
}

/// Segmenter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmenterConfig {
    /// Maximum chunk length in characters
    pub max_length: usize,
    /// Characters before the overflow point searched first for each boundary
    /// class (`None` searches the whole window)
    pub lookback: Option<usize>,
    /// Characters a chunk may run past `max_length` to reach a sentence end
    pub overshoot: usize,
    /// Handling of runs with no break point
    pub oversize: OversizePolicy,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LENGTH)
    }
}

impl SegmenterConfig {
    pub fn new(max_length: usize) -> Self {
        Self { max_length, lookback: None, overshoot: 0, oversize: OversizePolicy::Keep }
    }

    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = Some(lookback);
        self
    }

    pub fn with_overshoot(mut self, overshoot: usize) -> Self {
        self.overshoot = overshoot;
        self
    }

    pub fn with_oversize(mut self, oversize: OversizePolicy) -> Self {
        self.oversize = oversize;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns [`SegmentError::InvalidConfiguration`] if `max_length` or
    /// `lookback` is zero.
    pub fn validate(&self) -> Result<(), SegmentError> {
        if self.max_length == 0 {
            return Err(SegmentError::InvalidConfiguration("max_length must be a positive integer".to_string()));
        }
        if self.lookback == Some(0) {
            return Err(SegmentError::InvalidConfiguration("lookback must be a positive integer".to_string()));
        }
        Ok(())
    }
}

/// Where the current chunk's content ends.
struct Cut {
    end: usize,
    kind: BoundaryKind,
    warning: Option<ChunkWarning>,
}

/// Splits text into chunks using a greedy backward boundary search.
///
/// The segmenter holds no mutable state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    /// Create a segmenter.
    ///
    /// # Errors
    /// Returns [`SegmentError::InvalidConfiguration`] if the configuration is invalid.
    pub fn new(config: SegmenterConfig) -> Result<Self, SegmentError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Split `text` into an ordered, gap-free sequence of chunks.
    ///
    /// Empty and whitespace-only input yields no chunks.
    pub fn segment(&self, text: &str) -> Vec<Chunk> {
        let (offsets, chars): (Vec<usize>, Vec<char>) = text.char_indices().unzip();
        let byte_at = |i: usize| offsets.get(i).copied().unwrap_or(text.len());

        let Some(content_end) = chars.iter().rposition(|c| !c.is_whitespace()).map(|i| i + 1) else {
            return Vec::new();
        };

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut span_start = 0;
        let mut start = skip_whitespace(&chars, 0);

        while start < content_end {
            let cut = if content_end - start <= self.config.max_length {
                Cut { end: content_end, kind: BoundaryKind::End, warning: None }
            } else {
                self.find_cut(&chars, start, content_end)
            };

            // Trailing whitespace of the whole text belongs to the last chunk
            let next_start = if cut.end >= content_end { chars.len() } else { skip_whitespace(&chars, cut.end) };

            let content = byte_at(start)..byte_at(cut.end);
            chunks.push(Chunk {
                index: chunks.len(),
                span: byte_at(span_start)..byte_at(next_start),
                text: text[content.clone()].to_string(),
                content,
                boundary: cut.kind,
                warning: cut.warning,
            });

            span_start = next_start;
            start = next_start;
        }

        debug!("Segmented {} chars into {} chunks (max {} chars)", chars.len(), chunks.len(), self.config.max_length);
        chunks
    }

    /// Pick the end of a chunk whose content starts at `start` and does not fit the budget.
    fn find_cut(&self, chars: &[char], start: usize, content_end: usize) -> Cut {
        let max_length = self.config.max_length;
        let window_end = start + max_length;
        debug_assert!(window_end < content_end);

        let lookback_start = match self.config.lookback {
            Some(lookback) => window_end.saturating_sub(lookback).max(start + 1),
            None => start + 1,
        };

        let mut best = best_boundary(chars, lookback_start, window_end);
        if best.is_none() && lookback_start > start + 1 {
            best = best_boundary(chars, start + 1, window_end);
        }

        if self.config.overshoot > 0 && best.is_none_or(|(_, kind)| kind > BoundaryKind::Sentence) {
            let limit = (window_end + self.config.overshoot).min(content_end - 1);
            let sentence_end = (window_end + 1..=limit).find_map(|c| match classify(chars, c) {
                Some(kind @ (BoundaryKind::Paragraph | BoundaryKind::Sentence)) => Some((c, kind)),
                _ => None,
            });
            if let Some((end, kind)) = sentence_end {
                return Cut { end, kind, warning: Some(ChunkWarning::Overshoot { length: end - start, max_length }) };
            }
        }

        if let Some((end, kind)) = best {
            return Cut { end, kind, warning: None };
        }

        match self.config.oversize {
            OversizePolicy::Split => Cut { end: window_end, kind: BoundaryKind::Forced, warning: None },
            OversizePolicy::Keep => {
                let (end, kind) = (window_end + 1..content_end)
                    .find_map(|c| classify(chars, c).map(|kind| (c, kind)))
                    .unwrap_or((content_end, BoundaryKind::End));
                debug!("No break point within {} chars at offset {}, keeping {} chars together", max_length, start, end - start);
                Cut { end, kind, warning: Some(ChunkWarning::OversizedAtomicUnit { length: end - start, max_length }) }
            }
        }
    }
}

/// Latest boundary of the most preferred kind in `lo..=hi`.
fn best_boundary(chars: &[char], lo: usize, hi: usize) -> Option<(usize, BoundaryKind)> {
    let mut best: Option<(usize, BoundaryKind)> = None;
    for c in (lo..=hi).rev() {
        let Some(kind) = classify(chars, c) else { continue };
        if best.is_none_or(|(_, current)| kind < current) {
            best = Some((c, kind));
            if kind == BoundaryKind::Paragraph {
                break;
            }
        }
    }
    best
}

fn skip_whitespace(chars: &[char], from: usize) -> usize {
    chars[from..].iter().position(|c| !c.is_whitespace()).map_or(chars.len(), |i| from + i)
}

/// Segment `text` with the default policies and the given budget.
///
/// # Errors
/// Returns [`SegmentError::InvalidConfiguration`] if `max_length` is zero.
pub fn segment(text: &str, max_length: usize) -> Result<Vec<Chunk>, SegmentError> {
    Ok(Segmenter::new(SegmenterConfig::new(max_length))?.segment(text))
}

/// Rebuild the source text from its chunk sequence.
pub fn reassemble(source: &str, chunks: &[Chunk]) -> String {
    chunks.iter().map(|chunk| chunk.raw(source)).collect()
}
