//! Occurrence dataset loading: remote fetch, gzip decompress, CSV parse.
//!
//! The loader is deliberately forgiving: any fetch or parse failure becomes
//! a notice plus an empty dataset with the expected schema, so the pipeline
//! downstream degrades to "no results" instead of crashing.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use crate::cache::CacheManager;

/// Stable occurrence identifier.
pub const OCCURRENCE_ID: &str = "occurrenceID";
/// Accession / catalog number within the collection.
pub const CATALOG_NUMBER: &str = "catalogNumber";
/// Taxonomic genus.
pub const GENUS: &str = "genus";
/// Taxonomic specific epithet.
pub const SPECIFIC_EPITHET: &str = "specificEpithet";
/// Collection year; nullable.
pub const YEAR_COLLECTED: &str = "yearCollected";
/// Free-text specimen notes. Never sorted or aggregated.
pub const OCCURRENCE_REMARKS: &str = "occurrenceRemarks";

/// The six columns every loaded dataset is normalized to.
pub const COLUMNS: [&str; 6] = [
    OCCURRENCE_ID,
    CATALOG_NUMBER,
    GENUS,
    SPECIFIC_EPITHET,
    YEAR_COLLECTED,
    OCCURRENCE_REMARKS,
];

/// Cache file the downloaded dataset is stored under.
pub const DATASET_CACHE_FILE: &str = "occurrences.csv";

const FETCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// An empty dataset carrying the expected schema. Used as the downstream
/// value for every load failure.
pub fn empty_dataset() -> DataFrame {
    let schema = Schema::from_iter(COLUMNS.iter().map(|name| {
        let dtype = if *name == YEAR_COLLECTED {
            DataType::Int32
        } else {
            DataType::String
        };
        Field::new((*name).into(), dtype)
    }));
    DataFrame::empty_with_schema(&schema)
}

/// Download the archive at `url` into `dest`, transparently decompressing
/// gzip payloads. The payload lands in a temp file next to `dest` first so a
/// failed download never clobbers a previously cached copy.
pub fn fetch_dataset(url: &str, dest: &Path) -> Result<()> {
    let dir = dest
        .parent()
        .ok_or_else(|| eyre!("cache path has no parent directory"))?;
    std::fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|_| eyre!("Could not create a temporary file."))?;
    let response = ureq::get(url).timeout(FETCH_TIMEOUT).call().map_err(|e| {
        eyre!(
            "Download failed. Check the URL and your connection: {}",
            e
        )
    })?;
    let status = response.status();
    if status >= 400 {
        return Err(eyre!(
            "Server returned {} {}. Check the URL.",
            status,
            response.status_text()
        ));
    }
    std::io::copy(&mut response.into_reader(), &mut temp)
        .map_err(|_| eyre!("Download failed while saving the file."))?;

    finalize_download(temp.path(), dest)
}

/// Move a downloaded payload into place, decompressing when the gzip magic
/// bytes are present.
fn finalize_download(payload: &Path, dest: &Path) -> Result<()> {
    let mut reader = BufReader::new(File::open(payload)?);
    let mut magic = [0u8; 2];
    let n = reader.read(&mut magic)?;

    let dir = dest
        .parent()
        .ok_or_else(|| eyre!("cache path has no parent directory"))?;
    let mut out = tempfile::NamedTempFile::new_in(dir)?;
    if n == 2 && magic == GZIP_MAGIC {
        let mut gz = flate2::read::GzDecoder::new(BufReader::new(File::open(payload)?));
        std::io::copy(&mut gz, &mut out)?;
    } else {
        let mut plain = BufReader::new(File::open(payload)?);
        std::io::copy(&mut plain, &mut out)?;
    }
    out.as_file().sync_all()?;
    out.persist(dest)
        .map_err(|e| eyre!("Could not save the downloaded file: {}", e.error))?;
    Ok(())
}

/// Parse the cached CSV and normalize it to the six expected columns.
///
/// Columns the upstream file does not carry are filled with nulls, and
/// `yearCollected` is cast to Int32 (unparsable years become null and follow
/// the null-year policy).
pub fn read_dataset(path: &Path) -> Result<DataFrame> {
    let pl_path = PlPath::Local(Arc::from(path));
    let lf = LazyCsvReader::new(pl_path)
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .finish()?;

    let mut lf = lf;
    let schema = lf.collect_schema()?;
    let mut fixes: Vec<Expr> = Vec::new();
    for name in COLUMNS {
        if schema.get(name).is_none() {
            let dtype = if name == YEAR_COLLECTED {
                DataType::Int32
            } else {
                DataType::String
            };
            fixes.push(lit(NULL).cast(dtype).alias(name));
        }
    }
    if schema.get(YEAR_COLLECTED).is_some() {
        fixes.push(col(YEAR_COLLECTED).cast(DataType::Int32).alias(YEAR_COLLECTED));
    }
    if !fixes.is_empty() {
        lf = lf.with_columns(fixes);
    }

    let df = lf
        .select(COLUMNS.iter().map(|c| col(*c)).collect::<Vec<_>>())
        .collect()?;
    Ok(df)
}

/// Fetch (or reuse the cached copy of) the dataset and parse it. Returns the
/// dataset plus an optional notice; on failure the dataset is empty and the
/// notice explains why.
pub fn load_or_empty(url: &str, cache: &CacheManager, refresh: bool) -> (DataFrame, Option<String>) {
    let dest = cache.cache_file(DATASET_CACHE_FILE);
    if refresh || !dest.exists() {
        if let Err(e) = fetch_dataset(url, &dest) {
            return (
                empty_dataset(),
                Some(format!("Could not load the occurrence dataset: {}", e)),
            );
        }
    }
    match read_dataset(&dest) {
        Ok(df) => (df, None),
        Err(e) => (
            empty_dataset(),
            Some(format!(
                "Could not parse the occurrence dataset: {}",
                crate::error_display::user_message_from_report(&e)
            )),
        ),
    }
}
