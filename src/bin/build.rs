//! gdbforge-build - extract, patch and build the pinned gdb into `<root>/ext/dst`.

use clap::builder::FalseyValueParser;
use clap::Parser;
use gdbforge::config::Config;
use gdbforge::error::Error;
use gdbforge::layout::Layout;
use gdbforge::pipeline::exec::SystemExecutor;
use gdbforge::pipeline::host::HostProfile;
use gdbforge::pipeline::{BuildContext, BuildPipeline};
use gdbforge::{gf_error, gf_info};
use itertools::Itertools;
use std::env;
use std::path::{self, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Project root with `patches` and `ext/src` (default: current directory)
    #[clap(long, env = "GDBFORGE_ROOT")]
    root: Option<PathBuf>,

    /// Configuration file (default: ~/.config/gdbforge/pipeline.toml or the builtin preset)
    #[clap(long)]
    config: Option<PathBuf>,

    /// Scripting runtime installation passed to configure (default: auto-detect)
    #[clap(long)]
    with_python_dir: Option<PathBuf>,

    /// Commit pristine source and each applied patch into git, for patch development
    #[clap(long, env = "DEV", value_parser = FalseyValueParser::new())]
    dev: bool,

    /// Only report errors
    #[clap(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    gdbforge::log::init("info");
    if args.quiet {
        gdbforge::log::disable();
    }

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let contact = config.report.contact.clone();

    let layout = match args.root.map_or_else(env::current_dir, Ok).and_then(Layout::absolute) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("error: project root: {e}");
            return ExitCode::FAILURE;
        }
    };
    let runtime_dir = match args.with_python_dir.map(path::absolute).transpose() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("error: --with-python-dir: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut ctx = BuildContext::new(layout, config);
    ctx.runtime_dir = runtime_dir;
    ctx.dev_mode = args.dev;

    let profile = HostProfile::probe(ctx.runtime_dir.as_deref());
    match BuildPipeline::new(&ctx, profile, SystemExecutor).run() {
        Ok(artifact) => {
            gf_info!(target: "pipeline", "installed {}", artifact.debugger.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            gf_error!(target: "pipeline", "build failed");
            report(&e, &contact);
            ExitCode::FAILURE
        }
    }
}

fn report(e: &Error, contact: &str) {
    eprintln!("error: {e}");
    if let Some(hint) = e.hint() {
        eprintln!("hint: {hint}");
    }
    let logs = e.logs();
    if logs.is_empty() {
        eprintln!("if this looks like a bug, please report to {contact}");
    } else {
        eprintln!(
            "please report to {contact} with {}",
            logs.iter().map(|p| p.display()).join(", ")
        );
    }
}
