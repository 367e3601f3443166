use posts2db::{migrate_directory, DEFAULT_DB_PATH, DEFAULT_INPUT_DIR, DEFAULT_PATTERN};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
struct Opt {
    /// Path to the metrics database holding the `generated_content` table [default: data/metrics.db]
    #[structopt(parse(from_os_str), long)]
    db: Option<PathBuf>,

    /// Directory containing the JSON files written by the content generators [default: outputs]
    #[structopt(parse(from_os_str), long)]
    input: Option<PathBuf>,

    /// Glob selecting record files within the input directory [default: *.json]
    #[structopt(long)]
    pattern: Option<String>,

    /// Create the destination table if it does not exist yet.
    ///
    /// Without this, a database lacking the table aborts the run before any file is read.
    #[structopt(long)]
    create_table: bool,
}

fn main() -> Result<(), anyhow::Error> {
    pretty_env_logger::init();
    let opt = Opt::from_args();

    let db = opt.db.unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
    let input = opt.input.unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR));
    let pattern = opt.pattern.as_deref().unwrap_or(DEFAULT_PATTERN);

    let report = migrate_directory(&db, &input, pattern, opt.create_table)?;
    println!("{}", report);

    Ok(())
}
