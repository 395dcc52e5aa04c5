//! Morphological analysis tags and their alignment to surface text
//!
//! - tag: the `LEMMA+POS+FEATURE(...)` wire format
//! - segmenter: tag + surface into a segmented Morphology
//! - grammar: display metadata for POS and feature codes

pub mod grammar;
pub mod segmenter;
pub mod tag;

pub use grammar::{FeatureMetadata, GrammarHandle, GrammarResources};
pub use segmenter::{parse, MorphologyBuilder};
pub use tag::FeatureSpec;
