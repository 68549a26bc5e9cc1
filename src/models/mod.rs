//! Model management: fetching the Kokoro bundle on first use.

mod download;

pub use download::ensure_kokoro_model;
