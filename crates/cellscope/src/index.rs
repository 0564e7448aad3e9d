//! The sheet index
//!
//! [`SheetIndex`] owns the [`DocumentStore`] and the providers. Ingestion
//! enriches each document with an embedding and labels and upserts it;
//! searches are read-only.

use crate::builder::embedding_text;
use crate::concepts::query_concepts;
use crate::config::{IndexConfig, SearchOptions};
use crate::document::{Cell, Document, DocumentKind, IndexedDocument, Range};
use crate::error::{Error, Result};
use crate::extract::extract_sheet;
use crate::format::{keyword_result, semantic_result, SearchResult};
use crate::provider::{EmbeddingKind, EmbeddingProvider, LabelChain, LabelProvider};
use crate::ranking::{keyword, overlap, semantic};
use crate::store::{DocumentStore, IndexStats};
use cellscope_core::SheetGrid;
use std::sync::Arc;

/// A document that could not be indexed
#[derive(Debug)]
pub struct IngestFailure {
    pub id: String,
    pub error: Error,
}

/// Outcome of one ingestion call
///
/// Failures are isolated per document: the rest of the batch is indexed.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Documents stored (new or replaced)
    pub indexed: usize,
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    /// Whether every document was indexed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: IngestReport) {
        self.indexed += other.indexed;
        self.failures.extend(other.failures);
    }
}

/// Results of both rankers for one query
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comparison {
    pub semantic: Vec<SearchResult>,
    pub keyword: Vec<SearchResult>,
    /// Jaccard overlap of the two result id sets (1.0 when both are empty)
    pub overlap: f64,
}

/// In-memory hybrid search index over cells and ranges
pub struct SheetIndex {
    store: DocumentStore,
    embedder: Arc<dyn EmbeddingProvider>,
    labeler: Arc<dyn LabelProvider>,
    config: IndexConfig,
}

impl SheetIndex {
    /// Index labeling through a [`LabelChain`] built from `config`
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: IndexConfig) -> Self {
        let labeler = Arc::new(LabelChain::from_config(&config));
        Self::with_providers(embedder, labeler, config)
    }

    /// Index with explicit providers
    pub fn with_providers(
        embedder: Arc<dyn EmbeddingProvider>,
        labeler: Arc<dyn LabelProvider>,
        config: IndexConfig,
    ) -> Self {
        Self {
            store: DocumentStore::new(),
            embedder,
            labeler,
            config,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Get an indexed document by id
    pub fn get(&self, id: &str) -> Option<&IndexedDocument> {
        self.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Document counts by kind
    pub fn stats(&self) -> IndexStats {
        self.store.stats()
    }

    /// Drop every document
    pub fn clear(&mut self) {
        tracing::debug!("Clearing index ({} documents)", self.store.len());
        self.store.clear();
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Index cells
    pub fn ingest(&mut self, cells: Vec<Cell>) -> IngestReport {
        self.ingest_documents(cells.into_iter().map(Document::Cell))
    }

    /// Index ranges
    pub fn ingest_ranges(&mut self, ranges: Vec<Range>) -> IngestReport {
        self.ingest_documents(ranges.into_iter().map(Document::Range))
    }

    /// Extract and index every cell and range of a sheet
    pub fn ingest_sheet(&mut self, spreadsheet_id: &str, grid: &SheetGrid) -> IngestReport {
        let sheet = extract_sheet(spreadsheet_id, grid);
        let mut report = self.ingest(sheet.cells);
        report.merge(self.ingest_ranges(sheet.ranges));
        report
    }

    fn ingest_documents<I>(&mut self, documents: I) -> IngestReport
    where
        I: IntoIterator<Item = Document>,
    {
        let mut report = IngestReport::default();
        for document in documents {
            let id = document.id().to_string();
            match self.enrich(document) {
                Ok(indexed) => {
                    self.store.upsert(indexed);
                    report.indexed += 1;
                }
                Err(error) => {
                    tracing::warn!("Skipping {id}: {error}");
                    report.failures.push(IngestFailure { id, error });
                }
            }
        }
        tracing::debug!(
            "Ingested {} documents ({} failed), index size {}",
            report.indexed,
            report.failures.len(),
            self.store.len()
        );
        report
    }

    fn enrich(&self, document: Document) -> Result<IndexedDocument> {
        let text = embedding_text(&document);
        let embedding = self.embedder.embed(&text, EmbeddingKind::Document)?;
        let expected = self.embedder.dimensions();
        if embedding.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }
        check_finite(&embedding)?;

        let labels = match &document {
            Document::Cell(cell) => self.labeler.label_cell(cell)?,
            Document::Range(range) => self.labeler.label_range(range)?,
        };

        Ok(IndexedDocument {
            document,
            embedding,
            labels,
        })
    }

    // ========================================================================
    // Search
    // ========================================================================

    fn candidates(&self, options: &SearchOptions) -> Vec<&IndexedDocument> {
        self.store
            .iter()
            .filter(|d| options.include_ranges || d.kind() == DocumentKind::Cell)
            .collect()
    }

    /// Semantic search
    ///
    /// An empty index yields no results. A document whose embedding length
    /// differs from the query's aborts the search.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let query = validate_query(query)?;
        options.validate()?;

        let candidates = self.candidates(options);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query, EmbeddingKind::Query)?;
        check_finite(&query_embedding)?;
        let concepts = query_concepts(query);
        let ranked = semantic::rank(
            &candidates,
            &query_embedding,
            &concepts,
            &self.config,
            options.top_k,
        )?;

        tracing::debug!(
            "Semantic search {query:?}: {} of {} candidates returned",
            ranked.len(),
            candidates.len()
        );
        Ok(ranked
            .iter()
            .map(|m| semantic_result(m, query, &concepts))
            .collect())
    }

    /// Keyword search
    pub fn keyword_search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        let query = validate_query(query)?;
        options.validate()?;

        let candidates = self.candidates(options);
        let terms = keyword::query_terms(query);
        let ranked = keyword::rank(&candidates, &terms, options.top_k);

        tracing::debug!(
            "Keyword search {query:?}: {} of {} candidates matched",
            ranked.len(),
            candidates.len()
        );
        Ok(ranked.iter().map(keyword_result).collect())
    }

    /// Run both searches and measure how much they agree
    pub fn compare(&self, query: &str, options: &SearchOptions) -> Result<Comparison> {
        let semantic = self.search(query, options)?;
        let keyword = self.keyword_search(query, options)?;
        let overlap = overlap(
            semantic.iter().map(|r| r.id.as_str()),
            keyword.iter().map(|r| r.id.as_str()),
        );
        Ok(Comparison {
            semantic,
            keyword,
            overlap,
        })
    }
}

impl std::fmt::Debug for SheetIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetIndex")
            .field("documents", &self.store.len())
            .field("embedder", &self.embedder.name())
            .field("labeler", &self.labeler.name())
            .field("config", &self.config)
            .finish()
    }
}

fn check_finite(embedding: &[f32]) -> Result<()> {
    match embedding.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(Error::NonFiniteEmbedding { index }),
        None => Ok(()),
    }
}

/// Trimmed, non-empty query
fn validate_query(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("query must not be empty"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::HashingEmbedder;
    use cellscope_core::CellAddress;
    use pretty_assertions::assert_eq;

    struct BrokenEmbedder;

    impl EmbeddingProvider for BrokenEmbedder {
        fn name(&self) -> &str {
            "broken"
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn embed(&self, text: &str, _kind: EmbeddingKind) -> Result<Vec<f32>> {
            if text.contains("poison") {
                return Err(Error::provider("broken", "refused"));
            }
            if text.contains("short") {
                return Ok(vec![1.0]);
            }
            if text.contains("corrupt") {
                return Ok(vec![1.0, f32::NAN, 0.0, 0.0]);
            }
            Ok(vec![1.0, 0.0, 0.0, 0.0])
        }
    }

    fn index() -> SheetIndex {
        SheetIndex::new(Arc::new(HashingEmbedder::default()), IndexConfig::default())
    }

    fn cell(reference: &str, value: &str) -> Cell {
        Cell::new("book", "Sheet1", CellAddress::parse(reference).unwrap(), value)
    }

    #[test]
    fn test_failures_are_isolated() {
        let mut index = SheetIndex::new(Arc::new(BrokenEmbedder), IndexConfig::default());
        let report = index.ingest(vec![
            cell("A2", "fine"),
            cell("A3", "poison"),
            cell("A4", "short"),
            cell("A5", "also fine"),
            cell("A6", "corrupt"),
        ]);

        assert_eq!(report.indexed, 2);
        assert!(!report.is_complete());
        let failed: Vec<_> = report.failures.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(
            failed,
            vec!["book:Sheet1:A3", "book:Sheet1:A4", "book:Sheet1:A6"]
        );
        assert!(matches!(report.failures[0].error, Error::Provider { .. }));
        assert!(matches!(
            report.failures[1].error,
            Error::DimensionMismatch {
                expected: 4,
                actual: 1
            }
        ));
        assert!(matches!(
            report.failures[2].error,
            Error::NonFiniteEmbedding { index: 1 }
        ));
        assert_eq!(index.len(), 2);

        // A query embedding with NaN is refused rather than ranked
        assert!(matches!(
            index.search("corrupt", &SearchOptions::default()),
            Err(Error::NonFiniteEmbedding { index: 1 })
        ));
        assert_eq!(index.search("fine", &SearchOptions::default()).unwrap().len(), 2);
    }

    #[test]
    fn test_query_validation() {
        let mut index = index();
        index.ingest(vec![cell("A2", "Revenue")]);

        assert!(matches!(
            index.search("   ", &SearchOptions::default()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            index.keyword_search("", &SearchOptions::default()),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            index.search("revenue", &SearchOptions::top_k(0)),
            Err(Error::Validation(_))
        ));
        assert!(index.compare("", &SearchOptions::default()).is_err());
    }

    #[test]
    fn test_empty_index() {
        let index = index();
        assert!(index.search("revenue", &SearchOptions::default()).unwrap().is_empty());
        assert!(index
            .keyword_search("revenue", &SearchOptions::default())
            .unwrap()
            .is_empty());

        let comparison = index.compare("revenue", &SearchOptions::default()).unwrap();
        assert_eq!(comparison.overlap, 1.0);
    }

    #[test]
    fn test_cells_only() {
        let mut index = index();
        let grid = SheetGrid::from_rows(
            "Budget",
            vec![vec!["Item", "Amount"], vec!["Rent", "100"], vec!["Travel", "50"]],
        );
        let report = index.ingest_sheet("book", &grid);
        assert!(report.is_complete());
        assert_eq!(
            index.stats(),
            IndexStats {
                total_documents: 6,
                cells: 4,
                ranges: 2
            }
        );

        let results = index
            .search("amount", &SearchOptions::top_k(10).cells_only())
            .unwrap();
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.kind == DocumentKind::Cell));
    }

    #[test]
    fn test_reingest_replaces() {
        let mut index = index();
        index.ingest(vec![cell("A2", "old")]);
        index.ingest(vec![cell("A2", "new")]);
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.get("book:Sheet1:A2").unwrap().document.display_value(),
            "new"
        );
    }
}
