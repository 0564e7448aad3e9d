//! cellscope CLI
//!
//! Index CSV exports of spreadsheets and search them by meaning or keyword.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use cellscope::cellscope_core::{CellAddress, SheetGrid};
use cellscope::extract::build_cell;
use cellscope::{
    embedding_text, Document, HashingEmbedder, IndexConfig, LabelChain, LabelProvider,
    SearchOptions, SearchResult, SheetIndex,
};
use cellscope_csv::{CsvReadOptions, CsvReader};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cellscope")]
#[command(
    author,
    version,
    about = "Semantic and keyword search over spreadsheet cells",
    long_about = None
)]
struct Cli {
    /// Log ingestion and ranking at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index CSV files and run a query
    Search {
        /// CSV files, one sheet each
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Query text
        #[arg(short, long)]
        query: String,

        /// Ranking mode
        #[arg(short, long, value_enum, default_value_t = Mode::Semantic)]
        mode: Mode,

        /// Maximum number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Rank cells only
        #[arg(long)]
        no_ranges: bool,

        /// JSON file with index configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        weights: WeightArgs,

        #[command(flatten)]
        csv: CsvArgs,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Index CSV files and print document counts
    Stats {
        /// CSV files, one sheet each
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        csv: CsvArgs,

        /// Print counts as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the document built for a single cell
    Inspect {
        /// CSV file
        input: PathBuf,

        /// Cell reference (e.g., B4)
        cell: String,

        #[command(flatten)]
        csv: CsvArgs,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Semantic,
    Keyword,
    Both,
}

/// Overrides for individual ranking weights
#[derive(clap::Args, Debug, Default)]
struct WeightArgs {
    /// Weight of embedding similarity
    #[arg(long)]
    semantic_weight: Option<f64>,

    /// Weight of concept overlap
    #[arg(long)]
    concept_weight: Option<f64>,

    /// Weight of formula complexity
    #[arg(long)]
    formula_weight: Option<f64>,

    /// Weight of sheet importance
    #[arg(long)]
    sheet_weight: Option<f64>,
}

impl WeightArgs {
    fn apply(&self, config: &mut IndexConfig) {
        let weights = &mut config.weights;
        if let Some(w) = self.semantic_weight {
            weights.semantic = w;
        }
        if let Some(w) = self.concept_weight {
            weights.concept = w;
        }
        if let Some(w) = self.formula_weight {
            weights.formula = w;
        }
        if let Some(w) = self.sheet_weight {
            weights.sheet = w;
        }
    }
}

#[derive(clap::Args, Debug)]
struct CsvArgs {
    /// Field delimiter
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,

    /// Keep leading '=' fields as plain text
    #[arg(long)]
    no_formulas: bool,
}

impl CsvArgs {
    fn options(&self) -> Result<CsvReadOptions> {
        if !self.delimiter.is_ascii() {
            bail!("Delimiter must be a single ASCII character");
        }
        Ok(CsvReadOptions {
            delimiter: self.delimiter as u8,
            detect_formulas: !self.no_formulas,
            ..CsvReadOptions::default()
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Search {
            inputs,
            query,
            mode,
            top_k,
            no_ranges,
            config,
            weights,
            csv,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            weights.apply(&mut config);

            let mut options = SearchOptions::default();
            if let Some(k) = top_k {
                options.top_k = k;
            }
            options.include_ranges = !no_ranges;

            let index = build_index(&inputs, &csv.options()?, config)?;
            search(&index, &query, mode, &options, json)?;
        }
        Commands::Stats { inputs, csv, json } => {
            let index = build_index(&inputs, &csv.options()?, IndexConfig::default())?;
            let stats = index.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Documents: {}", stats.total_documents);
                println!("Cells:     {}", stats.cells);
                println!("Ranges:    {}", stats.ranges);
            }
        }
        Commands::Inspect { input, cell, csv } => {
            inspect(&input, &cell, &csv.options()?)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<IndexConfig> {
    let Some(path) = path else {
        return Ok(IndexConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config '{}'", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid config in '{}'", path.display()))
}

fn read_sheet(path: &Path, options: &CsvReadOptions) -> Result<(String, SheetGrid)> {
    let grid = CsvReader::read_file(path, options)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;
    let spreadsheet_id = grid.name().to_string();
    Ok((spreadsheet_id, grid))
}

fn build_index(
    inputs: &[PathBuf],
    options: &CsvReadOptions,
    config: IndexConfig,
) -> Result<SheetIndex> {
    let mut index = SheetIndex::new(Arc::new(HashingEmbedder::default()), config);

    for path in inputs {
        let (spreadsheet_id, grid) = read_sheet(path, options)?;
        tracing::debug!("read '{spreadsheet_id}' with {} rows", grid.row_count());
        let report = index.ingest_sheet(&spreadsheet_id, &grid);
        eprintln!(
            "Indexed {} documents from '{}'",
            report.indexed,
            path.display()
        );
        for failure in &report.failures {
            eprintln!("  skipped {}: {}", failure.id, failure.error);
        }
    }

    Ok(index)
}

fn search(
    index: &SheetIndex,
    query: &str,
    mode: Mode,
    options: &SearchOptions,
    json: bool,
) -> Result<()> {
    match mode {
        Mode::Semantic => {
            let results = index.search(query, options).context("Semantic search failed")?;
            print_results(&results, json)?;
        }
        Mode::Keyword => {
            let results = index
                .keyword_search(query, options)
                .context("Keyword search failed")?;
            print_results(&results, json)?;
        }
        Mode::Both => {
            let comparison = index.compare(query, options).context("Search failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&comparison)?);
            } else {
                println!("Semantic:");
                print_results(&comparison.semantic, false)?;
                println!();
                println!("Keyword:");
                print_results(&comparison.keyword, false)?;
                println!();
                println!("Overlap: {:.2}", comparison.overlap);
            }
        }
    }
    Ok(())
}

fn print_results(results: &[SearchResult], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("  (no results)");
        return Ok(());
    }
    for (rank, result) in results.iter().enumerate() {
        println!("{}", describe(rank + 1, result));
        for reason in &result.reasons {
            println!("     - {reason}");
        }
    }
    Ok(())
}

fn describe(rank: usize, result: &SearchResult) -> String {
    let mut line = format!(
        "{rank:>3}. [{}] {} {} = {:?} ({:.3})",
        result.kind, result.location, result.primary_concept, result.value, result.relevance
    );
    if let Some(formula) = &result.formula {
        line.push_str(&format!(" {formula}"));
    }
    line
}

fn inspect(path: &Path, cell_ref: &str, options: &CsvReadOptions) -> Result<()> {
    let (spreadsheet_id, grid) = read_sheet(path, options)?;
    let address = CellAddress::parse(cell_ref)
        .with_context(|| format!("Invalid cell reference '{cell_ref}'"))?;
    let (row, col) = address.one_based();

    let Some(cell) = build_cell(&spreadsheet_id, &grid, row, col) else {
        bail!("Cell {} of '{}' is empty", address, path.display());
    };

    let labels = LabelChain::new().label_cell(&cell)?;

    println!("Id:       {}", cell.id);
    println!("Kind:     {}", cell.kind);
    println!("Value:    {:?}", cell.display_value());
    if let Some(header) = &cell.headers.column {
        println!("Column:   {header}");
    }
    if let Some(header) = &cell.headers.row {
        println!("Row:      {header}");
    }
    if let Some(analysis) = &cell.parsed_formula {
        println!("Formula:  {}", analysis.original);
        println!("  type:       {}", analysis.kind);
        println!("  functions:  {}", analysis.functions.join(", "));
        let references: Vec<_> = analysis.references.iter().map(|r| r.target()).collect();
        println!("  references: {}", references.join(", "));
        println!("  complexity: {:.1}", analysis.complexity);
        if let Some(error) = &analysis.error {
            println!("  error:      {error}");
        }
    }
    if !cell.headers.context.is_empty() {
        let context: Vec<_> = cell
            .headers
            .context
            .iter()
            .map(|entry| entry.value.as_str())
            .collect();
        println!("Context:  {}", context.join(", "));
    }
    println!(
        "Labels:   {} ({})",
        labels.labels.join(", "),
        labels.method
    );
    println!();
    println!("{}", embedding_text(&Document::from(cell)));

    Ok(())
}
