use log;
use std::path::{Path, PathBuf};
use thiserror::Error;

macro_rules! contextualize {
    ($e:expr) => {
        contextualize!($e; stringify!($e))
    };
    ($e:expr; $($c:expr),+) => {
        ($e).map_err(|e| {log::error!($($c),+); e})
    };
}

pub mod migrate;
pub mod post;
pub mod source;
pub mod store;

pub use migrate::{FileFailure, Migrator, Report};
pub use post::{Platform, Post, Skip};
pub use source::{Document, SourceRecord};
pub use store::PostStore;

/// Conventional location of the metrics database.
pub const DEFAULT_DB_PATH: &str = "data/metrics.db";
/// Conventional directory holding the generator's JSON output files.
pub const DEFAULT_INPUT_DIR: &str = "outputs";
/// Files in the input directory which hold records.
pub const DEFAULT_PATTERN: &str = "*.json";

#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("store: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] globset::Error),
    #[error("destination table `{0}` does not exist")]
    MissingTable(&'static str),
}

pub(crate) fn log_progress(idx: u64, verb: &str) {
    if idx > 0 {
        if idx & 0x3fff == 0 {
            log::info!("{} {} records", verb, idx);
        } else if idx & 0xfff == 0 {
            log::trace!("{} {} records", verb, idx);
        }
    }
}

/// list the record files directly inside `dir` whose file names match `pattern`
///
/// The listing is not recursive. Paths are sorted so that runs are reproducible.
pub fn record_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, Error> {
    let matcher = globset::Glob::new(pattern)?.compile_matcher();
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if matcher.is_match(entry.file_name()) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Migrate every record file in `input_dir` into the store at `db_path`.
///
/// The store is opened once; if that fails, or the destination table is missing and
/// `create_table` is not set, nothing is migrated and the error is returned.
///
/// Failures reading or parsing an individual file are logged and collected in the
/// [`Report`]; they never abort the run. All writes are committed together once every
/// file has been processed.
pub fn migrate_directory(
    db_path: &Path,
    input_dir: &Path,
    pattern: &str,
    create_table: bool,
) -> Result<Report, Error> {
    let mut conn = store::open(db_path, create_table)?;
    let files = match record_files(input_dir, pattern) {
        Ok(files) => files,
        Err(Error::Io(err)) => {
            log::error!("cannot list {}: {}", input_dir.display(), err);
            Vec::new()
        }
        Err(err) => return Err(err),
    };
    log::info!("found {} record files in {}", files.len(), input_dir.display());

    let tx = contextualize!(conn.transaction())?;
    let report = Migrator::new(&*tx)?.run(files)?;
    contextualize!(tx.commit(); "failed to commit migrated posts")?;
    Ok(report)
}
