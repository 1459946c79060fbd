//! # Memoscribe
//!
//! Batch extractor for voice memo containers: walks each `.m4a` atom tree
//! and writes one Markdown note with the embedded transcript and metadata.

use anyhow::{bail, Result};
use std::path::PathBuf;

use memoscribe_core::note::NoteWriter;
use memoscribe_core::pipeline::process_paths;

struct AppOptions {
    dest: PathBuf,
    verbose: bool,
    inputs: Vec<PathBuf>,
}

impl AppOptions {
    fn from_args(args: &[String]) -> Self {
        let mut dest = None;
        let mut verbose = false;
        let mut inputs = Vec::new();

        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--dest" => dest = iter.next().map(PathBuf::from),
                "--verbose" | "-v" => verbose = true,
                other => inputs.push(PathBuf::from(other)),
            }
        }

        let dest = dest.unwrap_or_else(default_dest);
        Self {
            dest,
            verbose,
            inputs,
        }
    }
}

fn default_dest() -> PathBuf {
    dirs::document_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voice-notes")
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let options = AppOptions::from_args(&args);

    let filter = if options.verbose {
        "memoscribe=debug,memoscribe_core=debug"
    } else {
        "memoscribe=info,memoscribe_core=info"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Memoscribe v{}", memoscribe_core::VERSION);

    if options.inputs.is_empty() {
        eprintln!("Usage: memoscribe [--dest DIR] [--verbose] FILE.m4a [FILE.m4a ...]");
        bail!("no input files given");
    }

    let writer = NoteWriter::new(options.dest.as_path());
    tracing::info!(dest = %options.dest.display(), "writing notes");

    let summary = process_paths(&options.inputs, &writer)?;
    tracing::info!(
        processed = summary.processed,
        skipped = summary.skipped,
        failed = summary.failed,
        "run complete"
    );

    if summary.processed == 0 && summary.failed > 0 {
        bail!("no input could be processed");
    }
    Ok(())
}
