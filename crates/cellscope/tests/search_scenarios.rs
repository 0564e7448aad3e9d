//! End-to-end search over extracted sheets

use cellscope::cellscope_core::{CellAddress, GridValue, SheetGrid};
use cellscope::cellscope_formula::{analyze_formula, FormulaKind};
use cellscope::ranking::semantic::{concept_match, sheet_importance};
use cellscope::{
    Cell, DocumentKind, EmbeddingKind, EmbeddingProvider, Error, HashingEmbedder, IndexConfig,
    IndexStats, LabelChain, LabelMethod, LabelProvider, LabelSet, Range, Result, SearchOptions,
    SheetIndex,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, RwLock};

fn pnl() -> SheetGrid {
    let mut grid = SheetGrid::from_rows(
        "P&L",
        vec![
            vec!["Line", "Revenue", "Cost", "Margin %"],
            vec!["North", "1200", "700", "41.7%"],
            vec!["South", "900", "650", "27.8%"],
        ],
    );
    grid.push_row(vec![
        GridValue::text("Total"),
        GridValue::formula("2100", "=SUM(B2:B3)"),
        GridValue::formula("1350", "=SUM(C2:C3)"),
        GridValue::formula("35.7%", "=(B4-C4)/B4"),
    ]);
    grid
}

fn index() -> SheetIndex {
    SheetIndex::new(Arc::new(HashingEmbedder::default()), IndexConfig::default())
}

/// Formula `=SUM(B2:B10)` is an aggregation with positive complexity
#[test]
fn test_sum_formula_is_aggregation() {
    let analysis = analyze_formula("=SUM(B2:B10)").unwrap();
    assert_eq!(analysis.kind, FormulaKind::Aggregation);
    assert_eq!(analysis.functions, vec!["SUM".to_string()]);
    assert!(analysis.complexity > 0.0);
}

/// Division without named functions is a percentage formula
#[test]
fn test_division_formula_is_percentage() {
    let analysis = analyze_formula("=B2/C2").unwrap();
    assert_eq!(analysis.kind, FormulaKind::Percentage);
    assert!(analysis.functions.is_empty());
}

#[test]
fn test_sheet_importance_by_name() {
    assert_eq!(sheet_importance("Budget"), 1.0);
    assert_eq!(sheet_importance("RawData"), 0.3);
}

#[test]
fn test_identical_concepts_match_fully() {
    let labels = vec!["profitability".to_string()];
    assert_eq!(concept_match(&labels, &labels.clone()), 1.0);
}

/// Two cells under a "Revenue" header are both keyword hits
#[test]
fn test_keyword_search_finds_header_matches() {
    let mut index = index();
    let report = index.ingest_sheet("book", &pnl());
    assert!(report.is_complete());

    let results = index
        .keyword_search("revenue", &SearchOptions::top_k(20).cells_only())
        .unwrap();
    let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
    assert!(ids.contains(&"book:P&L:B2"));
    assert!(ids.contains(&"book:P&L:B3"));
    assert!(results.iter().all(|r| r.relevance > 0.0));
    assert!(results
        .iter()
        .all(|r| r.reasons.iter().any(|reason| reason.contains("revenue"))));
}

#[test]
fn test_clear_resets_stats() {
    let mut index = index();
    index.ingest_sheet("book", &pnl());
    assert!(index.stats().total_documents > 0);

    index.clear();
    assert_eq!(
        index.stats(),
        IndexStats {
            total_documents: 0,
            cells: 0,
            ranges: 0
        }
    );
}

#[test]
fn test_semantic_search_explains_results() {
    let mut index = index();
    index.ingest_sheet("book", &pnl());

    let results = index.search("total revenue", &SearchOptions::top_k(5)).unwrap();
    assert_eq!(results.len(), 5);

    for pair in results.windows(2) {
        assert!(pair[0].relevance >= pair[1].relevance);
    }
    for result in &results {
        let scores = result.scores.unwrap();
        assert_eq!(scores.sheet_importance, 1.0);
        assert_eq!(result.location.sheet, "P&L");
    }

    let total = index.get("book:P&L:B4").unwrap();
    assert_eq!(total.labels.method, LabelMethod::Heuristic);
    assert!(total.labels.labels.contains(&"aggregation".to_string()));
}

#[test]
fn test_ranges_are_indexed() {
    let mut index = index();
    index.ingest_sheet("book", &pnl());

    let stats = index.stats();
    assert_eq!(stats.cells, 12);
    assert_eq!(stats.ranges, 4);

    let revenue = index.get("book:P&L:range:B2-B4").unwrap();
    assert_eq!(revenue.kind(), DocumentKind::Range);
    let range = revenue.document.as_range().unwrap();
    assert_eq!(range.header, "Revenue");
    assert_eq!(range.sample_values, vec!["1200", "900", "2100"]);

    let results = index
        .keyword_search("revenue", &SearchOptions::default())
        .unwrap();
    let hit = results
        .iter()
        .find(|r| r.id == "book:P&L:range:B2-B4")
        .unwrap();
    assert_eq!(hit.kind, DocumentKind::Range);
    assert_eq!(hit.location.range, "2-4");
    assert_eq!(hit.primary_concept, "revenue");
}

#[test]
fn test_compare_reports_overlap() {
    let mut index = index();
    index.ingest_sheet("book", &pnl());

    let comparison = index
        .compare("revenue", &SearchOptions::top_k(3))
        .unwrap();
    assert_eq!(comparison.semantic.len(), 3);
    assert!(!comparison.keyword.is_empty());
    assert!((0.0..=1.0).contains(&comparison.overlap));
}

#[test]
fn test_manual_cells_and_ranges() {
    let mut index = index();
    let address = |r: &str| CellAddress::parse(r).unwrap();
    let cells = vec![
        Cell::new("book", "Forecast", address("B2"), "0.12").with_formatted_value("12%"),
        Cell::new("book", "Forecast", address("B3"), "0.15").with_formatted_value("15%"),
    ];
    let range = Range::from_cells("book", "Forecast", "Growth", cells.clone()).unwrap();

    let mut report = index.ingest(cells);
    report.merge(index.ingest_ranges(vec![range]));
    assert_eq!(report.indexed, 3);

    let results = index.search("growth rate", &SearchOptions::default()).unwrap();
    assert_eq!(results.len(), 3);
    assert!(results
        .iter()
        .any(|r| r.kind == DocumentKind::Range && r.primary_concept == "percentage"));
}

struct OfflineBackend;

impl LabelProvider for OfflineBackend {
    fn name(&self) -> &str {
        "offline"
    }

    fn label_cell(&self, _cell: &Cell) -> Result<LabelSet> {
        Err(Error::provider("offline", "connection refused"))
    }

    fn label_range(&self, _range: &Range) -> Result<LabelSet> {
        Err(Error::provider("offline", "connection refused"))
    }
}

#[test]
fn test_backend_failure_falls_back_to_basic_labels() {
    let config = IndexConfig::default();
    let labeler = LabelChain::from_config(&config).with_backend(Arc::new(OfflineBackend));
    let mut index = SheetIndex::with_providers(
        Arc::new(HashingEmbedder::default()),
        Arc::new(labeler),
        config,
    );

    let grid = SheetGrid::from_rows("Staff", vec![vec!["Team", "Headcount"], vec!["Ops", "14"]]);
    let report = index.ingest_sheet("hr", &grid);
    assert!(report.is_complete());

    let headcount = index.get("hr:Staff:B2").unwrap();
    assert_eq!(headcount.labels.method, LabelMethod::Fallback);
    assert_eq!(headcount.labels.labels, vec!["numeric"]);
    assert_eq!(headcount.labels.confidence, vec![0.5]);
}

/// Embedder returning vectors whose length depends on the text
struct RaggedEmbedder;

impl EmbeddingProvider for RaggedEmbedder {
    fn name(&self) -> &str {
        "ragged"
    }

    fn dimensions(&self) -> usize {
        3
    }

    fn embed(&self, _text: &str, kind: EmbeddingKind) -> Result<Vec<f32>> {
        match kind {
            EmbeddingKind::Document => Ok(vec![1.0, 0.0, 0.0]),
            EmbeddingKind::Query => Ok(vec![1.0, 0.0]),
        }
    }
}

#[test]
fn test_dimension_mismatch_aborts_search() {
    let mut index = SheetIndex::new(Arc::new(RaggedEmbedder), IndexConfig::default());
    index.ingest_sheet("book", &pnl());

    let err = index
        .search("revenue", &SearchOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
}

#[test]
fn test_shared_index_behind_rwlock() {
    let index = Arc::new(RwLock::new(index()));

    std::thread::scope(|scope| {
        let writer = Arc::clone(&index);
        scope.spawn(move || {
            let mut guard = writer.write().unwrap();
            guard.ingest_sheet("book", &pnl());
        });
    });

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let reader = Arc::clone(&index);
            std::thread::spawn(move || {
                let guard = reader.read().unwrap();
                guard
                    .keyword_search("cost", &SearchOptions::default())
                    .unwrap()
                    .len()
            })
        })
        .collect();

    let counts: Vec<_> = readers.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(counts.iter().all(|&c| c == counts[0] && c > 0));
}
