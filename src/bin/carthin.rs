//! Thin or edit an existing compiled asset archive.

use acbuild::{thin_archive, ThinOptions};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "carthin")]
#[command(about = "Remove assets or scales from a compiled asset archive")]
#[command(version)]
struct Args {
    /// Input archive
    #[arg(long)]
    input: PathBuf,

    /// Output archive
    #[arg(long)]
    output: PathBuf,

    /// Drop facets whose name matches this pattern (repeatable)
    #[arg(long = "remove-asset")]
    remove_assets: Vec<String>,

    /// Drop renditions at this scale, keeping at least one per facet
    /// (repeatable)
    #[arg(long = "remove-scale", value_parser = clap::value_parser!(u16).range(1..))]
    remove_scales: Vec<u16>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let options = ThinOptions {
        remove_assets: args.remove_assets,
        remove_scales: args.remove_scales,
    };

    match thin_archive(&args.input, &args.output, &options) {
        Ok(report) => {
            eprintln!(
                "kept {} facets / {} renditions, dropped {} facets / {} renditions",
                report.facets_kept,
                report.renditions_kept,
                report.facets_dropped,
                report.renditions_dropped
            );
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
