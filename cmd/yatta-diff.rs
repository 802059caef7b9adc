#![forbid(unsafe_code)]
use std::fs;
use std::process;

use clap::Parser;
use yatta::Differ;

#[derive(Parser, Debug)]
#[clap(
    name = "yatta-diff",
    version,
    about = "compute a compressed delta between two files",
    long_about = None,
)]
struct DiffArgs {
    /// source file
    #[clap(value_name = "SOURCE")]
    source_path: String,

    /// target file
    #[clap(value_name = "TARGET")]
    target_path: String,

    /// output patch file
    #[clap(value_name = "PATCH")]
    patch_path: String,

    /// minimum match length before a COPY is worth emitting, clamped to [4, 32]
    #[clap(short = 'm', long, value_name = "LENGTH")]
    min_match: Option<usize>,
}

fn main() {
    let args = DiffArgs::parse();
    if let Err(e) = execute(args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn execute(args: DiffArgs) -> yatta::Result<()> {
    let source = fs::read(&args.source_path)?;
    let target = fs::read(&args.target_path)?;

    let mut differ = Differ::new(&source)?;
    if let Some(min_match) = args.min_match {
        differ = differ.min_match(min_match);
    }
    let patch = differ.diff(&target)?;
    fs::write(&args.patch_path, patch.as_slice())?;
    Ok(())
}
