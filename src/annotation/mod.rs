//! Corpus annotation
//!
//! Raw text goes in, one `surface\tanalyses` line per token comes out. The
//! remote analyzer and the local dictionary both implement
//! [`TokenAnalyzer`]; [`CorpusAnnotator`] batches, dispatches and merges.

pub mod analyzer;
pub mod annotator;
pub mod batching;
pub mod fallback;
pub mod markup;
pub mod remote;

pub use analyzer::{TokenAnalyzer, WordMarkup};
pub use annotator::CorpusAnnotator;
pub use batching::BatchPolicy;
pub use fallback::FallbackAnalyzer;
pub use markup::{format_markup, format_token, AnnotatedToken, ERROR_MARKER};
pub use remote::RemoteAnalyzer;
