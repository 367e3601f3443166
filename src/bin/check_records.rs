use std::path::PathBuf;

use chrono::Local;
use structopt::StructOpt;

use posts2db::{source::Document, store::MemoryStore, Migrator, Post};

#[derive(Debug, StructOpt)]
struct Opt {
    /// JSON record file to preview
    #[structopt(parse(from_os_str))]
    input: PathBuf,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let opt = Opt::from_args();
    let file_name = opt
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    match Document::load(&opt.input) {
        Ok(document) => {
            // numbering as it would be against an empty database
            let mut sequence = 1;
            for (idx, record) in document.records().enumerate() {
                let post = record.and_then(|record| {
                    Post::from_record(&record, &file_name, sequence, Local::now())
                });
                match post {
                    Ok(post) => {
                        sequence += 1;
                        println!("{:>4}: {}", idx, serde_json::to_string(&post)?);
                    }
                    Err(skip) => println!("{:>4}: skipped ({})", idx, skip),
                }
            }
        }
        Err(e) => {
            eprintln!("{:#?}", e);
            return Ok(());
        }
    }

    let store = MemoryStore::default();
    let report = Migrator::new(&store)?.run(vec![opt.input])?;
    println!(
        "{} would be migrated, {} distinct post ids",
        report.migrated,
        report.final_count
    );

    Ok(())
}
