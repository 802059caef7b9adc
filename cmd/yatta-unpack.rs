#![forbid(unsafe_code)]
use std::fs;
use std::process;

use clap::Parser;
use yatta::NullSink;

#[derive(Parser, Debug)]
#[clap(
    name = "yatta-unpack",
    version,
    about = "extract a package produced by yatta-pack onto disk",
    long_about = None,
)]
struct UnpackArgs {
    /// package file
    #[clap(value_name = "PACKAGE")]
    package_path: String,

    /// destination directory
    #[clap(value_name = "ROOT")]
    root: String,
}

fn main() {
    let args = UnpackArgs::parse();
    if let Err(e) = execute(args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn execute(args: UnpackArgs) -> yatta::Result<()> {
    let package = fs::read(&args.package_path)?;
    let model = yatta::unpack_directory(&package)?;
    let mut sink = NullSink;
    model.write(&args.root, &mut sink)?;
    eprintln!("unpacked {} files", model.file_count());
    Ok(())
}
