//! Book Narrator - turns EPUB books into narrated audio with a local TTS model.
//!
//! The library half holds the parts that do not touch the model:
//! - [`book`]: EPUB and plain-text loading with text normalization
//! - [`text`]: the long-text segmenter that sizes chunks for synthesis

pub mod book;
pub mod text;
