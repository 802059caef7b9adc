#![forbid(unsafe_code)]
use std::fs;
use std::process;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(
    name = "yatta-patch",
    version,
    about = "apply a delta produced by yatta-diff",
    long_about = None,
)]
struct PatchArgs {
    /// source file
    #[clap(value_name = "SOURCE")]
    source_path: String,

    /// patch file
    #[clap(value_name = "PATCH")]
    patch_path: String,

    /// output target file
    #[clap(value_name = "TARGET")]
    target_path: String,
}

fn main() {
    let args = PatchArgs::parse();
    if let Err(e) = execute(args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn execute(args: PatchArgs) -> yatta::Result<()> {
    let source = fs::read(&args.source_path)?;
    let patch = fs::read(&args.patch_path)?;
    let target = yatta::patch(&source, &patch)?;
    fs::write(&args.target_path, target.as_slice())?;
    Ok(())
}
