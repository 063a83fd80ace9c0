//! Asset catalog compile driver.

use acbuild::asset::manifest;
use acbuild::{CompileOptions, Compiler, DefaultFilesystem, DefaultImageCodec, StepReport};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "acdriver")]
#[command(about = "Compile asset catalogs into a compiled asset archive")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile one or more asset catalogs.
    Compile(CompileArgs),
}

#[derive(clap::Args, Debug)]
struct CompileArgs {
    /// Output directory for Assets.car (or folder-form output)
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// Name of the app icon set to compile
    #[arg(long)]
    app_icon: Option<String>,

    /// Name of the launch image to compile
    #[arg(long)]
    launch_image: Option<String>,

    /// Target platform identifier
    #[arg(long)]
    platform: Option<String>,

    /// Target device (repeatable: iphone, ipad, tv, watch, carplay, mac)
    #[arg(long)]
    target_device: Vec<String>,

    /// Minimum deployment target (e.g. 9.0)
    #[arg(long)]
    minimum_deployment_target: Option<String>,

    /// Optimization level
    #[arg(long)]
    optimization: Option<String>,

    /// Compress PNG pixel data
    #[arg(long)]
    compress_pngs: bool,

    /// Enable on-demand resources
    #[arg(long)]
    enable_on_demand_resources: bool,

    /// Accepted for compatibility; not implemented
    #[arg(long)]
    enable_incremental_distill: bool,

    /// Target name for sidecar output
    #[arg(long)]
    target_name: Option<String>,

    /// Device model filter
    #[arg(long)]
    filter_for_device_model: Option<String>,

    /// Device OS version filter
    #[arg(long)]
    filter_for_device_os_version: Option<String>,

    /// Write a partial Info.plist fragment here
    #[arg(long)]
    output_partial_info_plist: Option<PathBuf>,

    /// Write a dependency-info file here
    #[arg(long)]
    export_dependency_info: Option<PathBuf>,

    /// Input asset catalog directories
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let Command::Compile(args) = args.command;
    std::process::exit(run(args));
}

fn run(args: CompileArgs) -> i32 {
    let options = CompileOptions {
        output: args.output,
        app_icon: args.app_icon,
        launch_image: args.launch_image,
        platform: args.platform,
        target_device: args.target_device,
        minimum_deployment_target: args.minimum_deployment_target,
        optimization: args.optimization,
        compress_pngs: args.compress_pngs,
        enable_on_demand_resources: args.enable_on_demand_resources,
        enable_incremental_distill: args.enable_incremental_distill,
        target_name: args.target_name,
        filter_for_device_model: args.filter_for_device_model,
        filter_for_device_os_version: args.filter_for_device_os_version,
        output_partial_info_plist: args.output_partial_info_plist,
        export_dependency_info: args.export_dependency_info,
    };

    let filesystem = DefaultFilesystem;
    let codec = DefaultImageCodec;

    let mut catalogs = Vec::new();
    let mut load_report = StepReport::new();
    for input in &args.inputs {
        match manifest::load_catalog(&filesystem, input) {
            Ok((catalog, report)) => {
                load_report.merge(report);
                catalogs.push(catalog);
            }
            Err(e) => {
                eprintln!("error: unable to load asset catalog {}: {e}", input.display());
                return 1;
            }
        }
    }

    let compiler = Compiler {
        options: &options,
        filesystem: &filesystem,
        codec: &codec,
    };
    match compiler.run(&catalogs) {
        Ok(outcome) => {
            for diagnostic in load_report.diagnostics() {
                eprintln!("{diagnostic}");
            }
            for diagnostic in outcome.report.diagnostics() {
                eprintln!("{diagnostic}");
            }
            info!(
                facets = outcome.report.facets_emitted,
                renditions = outcome.report.renditions_emitted,
                "compile finished"
            );
            if outcome.report.has_errors() {
                1
            } else {
                0
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}
