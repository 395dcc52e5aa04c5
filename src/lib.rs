//! Uqureader - annotated reading corpora with exposure-aware highlighting
//!
//! The library covers three subsystems:
//! - **Morphology**: parsing compact analysis tags and aligning them to the
//!   surface text of each token
//! - **Annotation**: batching raw text to a remote analyzer, local
//!   dictionary fallback, markup output, and translation augmentation of
//!   stored corpora
//! - **Memory and usage**: decayed familiarity per lemma/feature, highlight
//!   weights, and an append-only usage ledger
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use uqureader_core::{annotation::{CorpusAnnotator, FallbackAnalyzer}, morphology};
//!
//! let fallback = FallbackAnalyzer::from_markup("китап\tкитап+N+Sg+Nom;")?;
//! let annotator = CorpusAnnotator::local(Arc::new(fallback));
//! let markup = annotator.markup("китап", 500).await?;
//!
//! let morph = morphology::parse("Китаплар", "китап+N+PL(лар/ләр);").unwrap();
//! assert_eq!(morph.segments.concat(), "Китаплар");
//! ```

pub mod annotation;
pub mod api;
pub mod augment;
pub mod config;
pub mod corpus;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod morphology;
pub mod reader;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use annotation::{CorpusAnnotator, FallbackAnalyzer, RemoteAnalyzer, TokenAnalyzer};
pub use augment::{augment, AugmentReport};
pub use config::ReaderConfig;
pub use error::{ReaderError, Result};
pub use ledger::UsageLedger;
pub use memory::MemoryModel;
pub use reader::ReadingSession;
pub use storage::{Dictionary, InMemoryStore, MemoryStore, SqliteDictionary, SqliteStore, UsageStore};
pub use types::{
    EventType, Feature, MemoryRecord, Morphology, StatsScope, Token, UsageEvent, UsageStat,
};
