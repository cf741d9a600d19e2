use crate::{CorpusIndex, RecipeRecord, SparseVector, TermWeights, Vocabulary};
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// On-disk layout version written to `meta.json`.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn vocabulary(&self) -> PathBuf { self.root.join("vocabulary.bin") }
    fn weights(&self) -> PathBuf { self.root.join("weights.bin") }
    fn records(&self) -> PathBuf { self.root.join("records.bin") }
    fn matrix(&self) -> PathBuf { self.root.join("matrix.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

fn write_bincode<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(f);
    bincode::serialize_into(&mut w, value)?;
    w.flush()?;
    Ok(())
}

fn read_bincode<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let value = bincode::deserialize_from(BufReader::new(f))
        .with_context(|| format!("decoding {}", path.display()))?;
    Ok(value)
}

/// Terms in column order together with their document frequencies.
pub fn save_vocabulary(paths: &IndexPaths, vocab: &Vocabulary, df: &[u32]) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bincode(&paths.vocabulary(), &(vocab.terms(), df))
}

pub fn load_vocabulary(paths: &IndexPaths) -> Result<(Vocabulary, Vec<u32>)> {
    let (terms, df): (Vec<String>, Vec<u32>) = read_bincode(&paths.vocabulary())?;
    let vocab = Vocabulary::from_terms(terms).context("vocabulary contains duplicate terms")?;
    Ok((vocab, df))
}

pub fn save_weights(paths: &IndexPaths, weights: &TermWeights) -> Result<()> {
    write_bincode(&paths.weights(), weights)
}

pub fn load_weights(paths: &IndexPaths) -> Result<TermWeights> {
    read_bincode(&paths.weights())
}

pub fn save_records(paths: &IndexPaths, records: &[RecipeRecord]) -> Result<()> {
    write_bincode(&paths.records(), &records)
}

pub fn load_records(paths: &IndexPaths) -> Result<Vec<RecipeRecord>> {
    read_bincode(&paths.records())
}

pub fn save_matrix(paths: &IndexPaths, matrix: &[SparseVector]) -> Result<()> {
    write_bincode(&paths.matrix(), &matrix)
}

pub fn load_matrix(paths: &IndexPaths) -> Result<Vec<SparseVector>> {
    read_bincode(&paths.matrix())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write every artifact of a fitted index under `paths.root`.
pub fn save_index(paths: &IndexPaths, index: &CorpusIndex, created_at: &str) -> Result<()> {
    save_vocabulary(paths, index.vocabulary(), &index.weights().df)?;
    save_weights(paths, index.weights())?;
    save_records(paths, index.records())?;
    save_matrix(paths, index.matrix())?;
    let meta = MetaFile {
        num_docs: index.len() as u32,
        num_terms: index.vocabulary().len() as u32,
        created_at: created_at.to_string(),
        version: FORMAT_VERSION,
    };
    save_meta(paths, &meta)
}

/// Load a previously fitted index without refitting.
pub fn load_prefit(paths: &IndexPaths) -> Result<CorpusIndex> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        bail!("unsupported index version {} (expected {})", meta.version, FORMAT_VERSION);
    }
    let (vocabulary, df) = load_vocabulary(paths)?;
    let weights = load_weights(paths)?;
    let records = load_records(paths)?;
    let matrix = load_matrix(paths)?;

    let num_terms = vocabulary.len();
    if num_terms != meta.num_terms as usize || df.len() != num_terms || weights.idf.len() != num_terms || weights.df != df {
        bail!("vocabulary and term weights disagree on size ({} terms in meta)", meta.num_terms);
    }
    if records.len() != meta.num_docs as usize || matrix.len() != records.len() {
        bail!(
            "index holds {} records and {} rows, meta expects {}",
            records.len(),
            matrix.len(),
            meta.num_docs
        );
    }
    for (pos, row) in matrix.iter().enumerate() {
        if row.indices.len() != row.values.len() {
            bail!("matrix row {pos} has {} columns but {} weights", row.indices.len(), row.values.len());
        }
        // dot products merge on sorted columns
        if row.indices.windows(2).any(|w| w[0] >= w[1]) {
            bail!("matrix row {pos} columns are not strictly increasing");
        }
        if row.indices.last().is_some_and(|&tid| tid as usize >= num_terms) {
            bail!("matrix row {pos} references a column outside the vocabulary");
        }
        if row.values.iter().any(|w| !w.is_finite() || *w < 0.0) {
            bail!("matrix row {pos} holds a negative or non-finite weight");
        }
    }
    if records.windows(2).any(|w| w[0].id >= w[1].id) {
        bail!("record ids are not strictly increasing");
    }
    Ok(CorpusIndex::from_parts(records, vocabulary, weights, matrix))
}
