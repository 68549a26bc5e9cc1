//! Long-text segmentation for speech synthesis.
//!
//! Splits book text into chunks small enough for a TTS model while keeping
//! paragraph, sentence and clause breaks intact. Handles Western and East
//! Asian punctuation as well as CJK text written without spaces.

mod boundary;
mod segmenter;

pub use boundary::{BoundaryKind, is_cjk};
pub use segmenter::{
    Chunk, ChunkWarning, DEFAULT_MAX_LENGTH, OversizePolicy, SegmentError, Segmenter, SegmenterConfig, reassemble, segment,
};
