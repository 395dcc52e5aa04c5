//! HTTP API for the annotation service
//!
//! Provides:
//! - `POST /api/markup`: raw text in, tab-separated markup out
//! - `POST /api/token`: single-token lookup in the local dictionary, with
//!   lemma and readable grammar names when metadata is attached
//! - `GET /health`

pub mod server;

pub use server::{ApiServer, ApiServerConfig};
