//! Recipe dataset loading.
//!
//! Reads CSV, JSON (array or single object) and JSONL files into
//! [`RecipeRecord`]s. Rows without ingredient text are dropped; survivors are
//! numbered densely in load order.

use crate::{RecipeId, RecipeRecord};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Title columns tried in order when none is configured.
pub const TITLE_COLUMNS: &[&str] = &["Recipe_name", "Title"];
pub const DEFAULT_INGREDIENTS_COLUMN: &str = "Ingredients";

#[derive(Debug, Clone)]
pub struct DatasetOptions {
    pub title_column: Option<String>,
    pub ingredients_column: String,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self { title_column: None, ingredients_column: DEFAULT_INGREDIENTS_COLUMN.to_string() }
    }
}

#[derive(Debug, Deserialize)]
struct InputRecipe {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    ingredients: Option<String>,
}

/// Title used when a row has no usable title.
pub fn fallback_title(row: usize) -> String {
    format!("Recipe #{row}")
}

/// Load a dataset file, picking the parser from its extension.
pub fn load_path(path: &Path, opts: &DatasetOptions) -> Result<Vec<RecipeRecord>> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("csv") => load_csv(path, opts),
        Some("jsonl") => load_jsonl(path),
        Some("json") => load_json(path),
        _ => bail!("unsupported dataset format: {}", path.display()),
    }
}

pub fn load_csv(path: &Path, opts: &DatasetOptions) -> Result<Vec<RecipeRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let ingredients_idx = column(opts.ingredients_column.as_str()).with_context(|| {
        format!("{} has no '{}' column (found {:?})", path.display(), opts.ingredients_column, headers)
    })?;
    let title_idx = match &opts.title_column {
        Some(name) => Some(column(name.as_str()).with_context(|| format!("{} has no '{}' column", path.display(), name))?),
        None => TITLE_COLUMNS.iter().find_map(|&name| column(name)),
    };

    let mut rows = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("parsing row {row} of {}", path.display()))?;
        let title = title_idx.and_then(|i| record.get(i)).map(str::to_string);
        rows.push((row, title, record.get(ingredients_idx).map(str::to_string)));
    }
    Ok(into_records(rows))
}

pub fn load_jsonl(path: &Path) -> Result<Vec<RecipeRecord>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rows = Vec::new();
    for (lineno, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let input: InputRecipe = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", path.display(), lineno + 1))?;
        rows.push((rows.len(), input.title, input.ingredients));
    }
    Ok(into_records(rows))
}

pub fn load_json(path: &Path) -> Result<Vec<RecipeRecord>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("decoding {}", path.display()))?;
    let items = match json {
        serde_json::Value::Array(arr) => arr,
        obj @ serde_json::Value::Object(_) => vec![obj],
        _ => bail!("{} must hold an object or an array of objects", path.display()),
    };
    let mut rows = Vec::with_capacity(items.len());
    for (row, v) in items.into_iter().enumerate() {
        let input: InputRecipe = serde_json::from_value(v)?;
        rows.push((row, input.title, input.ingredients));
    }
    Ok(into_records(rows))
}

/// Drop rows without ingredient text and number the rest from zero.
fn into_records(rows: Vec<(usize, Option<String>, Option<String>)>) -> Vec<RecipeRecord> {
    rows.into_iter()
        .filter_map(|(row, title, ingredients)| {
            let ingredients = ingredients.filter(|s| !s.trim().is_empty())?;
            let title = title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| fallback_title(row));
            Some((title, ingredients))
        })
        .enumerate()
        .map(|(id, (title, ingredients))| RecipeRecord::new(id as RecipeId, title, &ingredients))
        .collect()
}

/// Concatenate several datasets, renumbering ids so they stay dense.
pub fn concat(datasets: Vec<Vec<RecipeRecord>>) -> Vec<RecipeRecord> {
    datasets
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(id, record)| RecipeRecord { id: id as RecipeId, ..record })
        .collect()
}
