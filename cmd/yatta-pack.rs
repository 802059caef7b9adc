#![forbid(unsafe_code)]
use std::fs;
use std::process;

use clap::Parser;
use yatta::{DirectoryModel, NullSink};

#[derive(Parser, Debug)]
#[clap(
    name = "yatta-pack",
    version,
    about = "scan a directory and serialize it into a single compressed package",
    long_about = None,
)]
struct PackArgs {
    /// directory to scan
    #[clap(value_name = "ROOT")]
    root: String,

    /// output package file
    #[clap(value_name = "PACKAGE")]
    package_path: String,

    /// relative path or extension (with leading '.') to exclude; may repeat
    #[clap(short = 'x', long = "exclude", value_name = "PATTERN")]
    exclusions: Vec<String>,
}

fn main() {
    let args = PackArgs::parse();
    if let Err(e) = execute(args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn execute(args: PackArgs) -> yatta::Result<()> {
    let mut sink = NullSink;
    let model = DirectoryModel::scan(&args.root, &args.exclusions, &mut sink)?;
    let package = yatta::pack_directory(&model, &mut sink)?;
    fs::write(&args.package_path, package.as_slice())?;
    eprintln!(
        "packed {} files, {} bytes",
        model.file_count(),
        model.total_size()
    );
    Ok(())
}
