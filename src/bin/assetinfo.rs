//! Inspect or filter a compiled asset archive.
//!
//! `--info` dumps a JSON description of the input to stdout (or
//! `--output`); without it, the idiom/scale filters thin the archive into
//! `--output`.

use acbuild::{archive_info, filter_archive, InfoOptions};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "assetinfo")]
#[command(about = "Describe or thin a compiled asset archive")]
#[command(version)]
struct Args {
    /// Keep only facets with this idiom
    #[arg(long, short = 'i')]
    idiom: Option<String>,

    /// Keep only facets at this scale
    #[arg(long, short = 's', value_parser = clap::value_parser!(u16).range(1..))]
    scale: Option<u16>,

    /// Dump a JSON description of the input
    #[arg(long, short = 'I')]
    info: bool,

    /// Output path (JSON for --info, archive otherwise)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Input archive
    input: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    std::process::exit(run(args));
}

fn run(args: Args) -> i32 {
    if args.info {
        let options = InfoOptions {
            idiom: args.idiom,
            scale: args.scale,
        };
        match archive_info(&args.input, &options) {
            Ok(value) => {
                let rendered = match serde_json::to_string_pretty(&value) {
                    Ok(rendered) => rendered,
                    Err(e) => {
                        eprintln!("error: {e}");
                        return 1;
                    }
                };
                match &args.output {
                    Some(path) => {
                        if let Err(e) = std::fs::write(path, rendered) {
                            eprintln!("error: {e}");
                            return 1;
                        }
                    }
                    None => println!("{rendered}"),
                }
                0
            }
            Err(e) => {
                eprintln!("error: {e}");
                1
            }
        }
    } else {
        let Some(output) = &args.output else {
            eprintln!("error: unable to thin without an output file");
            return 1;
        };
        match filter_archive(&args.input, output, args.idiom.as_deref(), args.scale) {
            Ok(report) => {
                eprintln!(
                    "kept {} facets / {} renditions",
                    report.facets_kept, report.renditions_kept
                );
                0
            }
            Err(e) => {
                eprintln!("error: {e}");
                1
            }
        }
    }
}
