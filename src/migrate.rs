use crate::{
    log_progress,
    post::{Post, Skip},
    source::Document,
    store::PostStore,
    Error,
};
use chrono::Local;
use std::fmt;
use std::path::{Path, PathBuf};

/// A record file which could not be read or parsed, or whose posts could not be written.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// What happened to the entries of one successfully processed file.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct FileOutcome {
    pub migrated: u64,
    pub skipped: u64,
}

/// Summary of a whole run.
#[derive(Debug)]
pub struct Report {
    pub initial_count: u64,
    pub migrated: u64,
    pub skipped: u64,
    pub failures: Vec<FileFailure>,
    pub final_count: u64,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Existing posts in database: {}", self.initial_count)?;
        for failure in &self.failures {
            writeln!(
                f,
                "Error processing {}: {}",
                failure.path.display(),
                failure.error
            )?;
        }
        if self.skipped > 0 {
            writeln!(f, "Entries skipped: {}", self.skipped)?;
        }
        writeln!(f, "Posts migrated: {}", self.migrated)?;
        writeln!(f, "Total posts in database: {}", self.final_count)?;
        write!(f, "Migration completed!")
    }
}

/// Migration context: the destination store and the counters of the current run.
///
/// The row count is taken once, when the migrator is created. Records without an `id`
/// are numbered from that count onwards, so synthesized ids are only distinct within a
/// single run; a later run against the same store can produce the same ids again and
/// replace those rows.
pub struct Migrator<'s, S: PostStore + ?Sized> {
    store: &'s S,
    initial_count: u64,
    migrated: u64,
    skipped: u64,
    failures: Vec<FileFailure>,
}

impl<'s, S: PostStore + ?Sized> Migrator<'s, S> {
    pub fn new(store: &'s S) -> Result<Self, Error> {
        let initial_count = store.count()?;
        log::info!("existing posts in database: {}", initial_count);
        Ok(Migrator {
            store,
            initial_count,
            migrated: 0,
            skipped: 0,
            failures: Vec::new(),
        })
    }

    pub fn migrated(&self) -> u64 {
        self.migrated
    }

    /// sequence number for the next record lacking an `id`
    pub fn next_sequence(&self) -> u64 {
        self.migrated + self.initial_count + 1
    }

    /// Migrate every eligible record of one file.
    ///
    /// An error means the file could not be read or parsed, or a write failed part
    /// way through; records written before the failure stay written and counted.
    pub fn migrate_file(&mut self, path: &Path) -> Result<FileOutcome, Error> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let document = Document::load(path)?;

        let mut outcome = FileOutcome::default();
        for (idx, record) in document.records().enumerate() {
            let post = record.and_then(|record| {
                Post::from_record(&record, &file_name, self.next_sequence(), Local::now())
            });
            let post = match post {
                Ok(post) => post,
                Err(skip) => {
                    if skip == Skip::BlankContent {
                        log::debug!("{}[{}]: skipped, {}", file_name, idx, skip);
                    } else {
                        log::warn!("{}[{}]: skipped, {}", file_name, idx, skip);
                    }
                    outcome.skipped += 1;
                    self.skipped += 1;
                    continue;
                }
            };

            self.store.upsert(&post)?;
            log::trace!("{}[{}]: upserted {}", file_name, idx, post.post_id);
            outcome.migrated += 1;
            self.migrated += 1;
            log_progress(self.migrated, "migrated");
        }
        Ok(outcome)
    }

    /// Migrate each file in turn, then report.
    ///
    /// A file which fails is logged and recorded in the report, and the run moves on
    /// to the next file. Only a failure to count the store's rows is returned as an error.
    pub fn run<I>(mut self, files: I) -> Result<Report, Error>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        for path in files {
            match self.migrate_file(&path) {
                Ok(outcome) => log::info!(
                    "{}: migrated {}, skipped {}",
                    path.display(),
                    outcome.migrated,
                    outcome.skipped
                ),
                Err(error) => {
                    log::error!("error processing {}: {}", path.display(), error);
                    self.failures.push(FileFailure { path, error });
                }
            }
        }

        let final_count = self.store.count()?;
        Ok(Report {
            initial_count: self.initial_count,
            migrated: self.migrated,
            skipped: self.skipped,
            failures: self.failures,
            final_count,
        })
    }
}
