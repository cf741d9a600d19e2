use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use recipe_core::dataset::{concat, load_path, DatasetOptions};
use recipe_core::persist::{load_prefit, save_index, IndexPaths};
use recipe_core::{recommend, CorpusIndex, RecipeRecord, TfScheme, WeightingConfig, DEFAULT_TOP_K};
use tracing_subscriber::{EnvFilter, fmt};
use walkdir::WalkDir;

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Fit and query TF-IDF recipe indexes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit an index from a recipe dataset file or a directory of them
    Build {
        /// Input path (file or directory of .csv/.json/.jsonl)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Use sublinear tf = 1 + ln(tf) instead of raw counts
        #[arg(long, default_value_t = false)]
        sublinear_tf: bool,
        /// Use idf = ln(N/df) + 1 instead of ln((1+N)/(1+df)) + 1
        #[arg(long, default_value_t = false)]
        no_smooth_idf: bool,
        /// Title column (defaults to Recipe_name, then Title)
        #[arg(long)]
        title_column: Option<String>,
        #[arg(long, default_value = "Ingredients")]
        ingredients_column: String,
    },
    /// Rank recipes in a built index against pantry text
    Query {
        #[arg(long)]
        index: String,
        /// Pantry description
        #[arg(long)]
        text: String,
        #[arg(long, default_value_t = DEFAULT_TOP_K, allow_negative_numbers = true)]
        top_k: i64,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, sublinear_tf, no_smooth_idf, title_column, ingredients_column } => {
            let weighting = WeightingConfig {
                tf: if sublinear_tf { TfScheme::Sublinear } else { TfScheme::Raw },
                smooth_idf: !no_smooth_idf,
            };
            let opts = DatasetOptions { title_column, ingredients_column };
            build_index(Path::new(&input), Path::new(&output), &opts, weighting)
        }
        Commands::Query { index, text, top_k } => {
            let index = load_prefit(&IndexPaths::new(&index))?;
            let results = recommend(&index, &text.to_lowercase(), top_k)?;
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }
    }
}

/// Dataset files under `input`, in sorted path order.
fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && is_dataset(p) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("input path does not exist: {}", input.display());
    }
    Ok(files)
}

fn is_dataset(p: &Path) -> bool {
    matches!(p.extension().and_then(|s| s.to_str()), Some("csv" | "json" | "jsonl"))
}

fn load_inputs(input: &Path, opts: &DatasetOptions) -> Result<Vec<RecipeRecord>> {
    let mut datasets = Vec::new();
    for file in collect_inputs(input)? {
        let records = load_path(&file, opts)?;
        tracing::info!(file = %file.display(), recipes = records.len(), "read dataset");
        datasets.push(records);
    }
    Ok(concat(datasets))
}

fn build_index(input: &Path, output: &Path, opts: &DatasetOptions, weighting: WeightingConfig) -> Result<()> {
    let records = load_inputs(input, opts)?;
    let index = CorpusIndex::build_with(records, weighting)
        .with_context(|| format!("fitting index from {}", input.display()))?;
    tracing::info!(num_docs = index.len(), num_terms = index.vocabulary().len(), "fitted index");

    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    save_index(&IndexPaths::new(output), &index, &created_at)?;

    tracing::info!(output = %output.display(), "index build complete");
    Ok(())
}
