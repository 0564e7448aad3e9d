//! # cellscope
//!
//! Hybrid semantic and keyword search over spreadsheet cells and ranges.
//!
//! A sheet's value grid is turned into [`Cell`] and [`Range`] documents
//! carrying headers, neighbouring values and formula analysis. Each document
//! is embedded and labeled through injected providers and stored in a
//! [`SheetIndex`], which answers queries with explained [`SearchResult`]s.
//!
//! ## Example
//!
//! ```rust
//! use cellscope::{HashingEmbedder, IndexConfig, SearchOptions, SheetIndex};
//! use cellscope_core::SheetGrid;
//! use std::sync::Arc;
//!
//! let grid = SheetGrid::from_rows(
//!     "Budget",
//!     vec![
//!         vec!["Line", "Q1", "Q2"],
//!         vec!["Revenue", "100", "120"],
//!         vec!["Cost", "60", "70"],
//!     ],
//! );
//!
//! let mut index = SheetIndex::new(Arc::new(HashingEmbedder::default()), IndexConfig::default());
//! let report = index.ingest_sheet("book", &grid);
//! assert!(report.is_complete());
//!
//! let hits = index.keyword_search("revenue", &SearchOptions::default()).unwrap();
//! assert!(!hits.is_empty());
//!
//! let hits = index.search("quarterly revenue", &SearchOptions::top_k(3)).unwrap();
//! assert_eq!(hits.len(), 3);
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): score candidates with rayon
//! - `serde`: serialize documents, results and configuration

pub mod builder;
pub mod concepts;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod extract;
pub mod format;
pub mod index;
pub mod provider;
pub mod ranking;
pub mod store;

// Re-exports for convenience
pub use builder::embedding_text;
pub use config::{IndexConfig, RankingWeights, SearchOptions};
pub use document::{
    Cell, CellHeaders, ContextEntry, Document, DocumentKind, FormulaPattern, IndexedDocument,
    LabelMethod, LabelSet, Range,
};
pub use error::{Error, Result};
pub use extract::{extract_cells, extract_sheet, group_ranges, SheetDocuments};
pub use format::{Location, SearchResult};
pub use index::{Comparison, IngestFailure, IngestReport, SheetIndex};
pub use provider::{EmbeddingKind, EmbeddingProvider, HashingEmbedder, LabelChain, LabelProvider};
pub use ranking::{cosine_similarity, SemanticScores};
pub use store::{DocumentStore, IndexStats};

// Re-export the lower layers
pub use cellscope_core;
pub use cellscope_formula;
