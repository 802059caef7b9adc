#![forbid(unsafe_code)]
use std::fs;
use std::process;

use clap::Parser;
use yatta::{DirectoryModel, DirectoryPatcher, NullSink};

#[derive(Parser, Debug)]
#[clap(
    name = "yatta-install",
    version,
    about = "apply a directory patch produced by yatta-diff-dir against a live install root",
    long_about = None,
)]
struct InstallArgs {
    /// existing install directory, patched in place
    #[clap(value_name = "ROOT")]
    root: String,

    /// directory patch file
    #[clap(value_name = "PATCH")]
    patch_path: String,

    /// relative path or extension (with leading '.') to exclude when rescanning ROOT
    #[clap(short = 'x', long = "exclude", value_name = "PATTERN")]
    exclusions: Vec<String>,
}

fn main() {
    let args = InstallArgs::parse();
    if let Err(e) = execute(args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn execute(args: InstallArgs) -> yatta::Result<()> {
    let mut sink = NullSink;
    let current = DirectoryModel::scan(&args.root, &args.exclusions, &mut sink)?;
    let patch = fs::read(&args.patch_path)?;

    let patcher = DirectoryPatcher::new(&args.root);
    let updated = patcher.apply(&current, &patch)?;

    eprintln!(
        "installed: {} files now present ({} before)",
        updated.file_count(),
        current.file_count()
    );
    Ok(())
}
