use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use gdbforge::config::Config;
use gdbforge::error::Error;
use gdbforge::launcher::{ensure_process_exists, resolve_interpreter, usage, Launch, LaunchTarget};
use gdbforge::layout::Layout;
use gdbforge::pipeline::build::BuildArtifact;
use std::env;
use std::path::PathBuf;
use std::process::exit;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Project root with `ext/dst` and `scripts` (default: two levels above this executable)
    #[clap(long, env = "GDBFORGE_ROOT")]
    root: Option<PathBuf>,

    /// Configuration file (default: ~/.config/gdbforge/pipeline.toml or the builtin preset)
    #[clap(long)]
    config: Option<PathBuf>,

    /// Print debugger command line instead of running it
    #[clap(long)]
    print: bool,

    /// `<pid>`, `none` or `<interpreter> <pid>`
    target: Vec<String>,
}

fn print_usage_and_exit() -> ! {
    println!("{}", usage());
    exit(1)
}

fn default_root() -> anyhow::Result<PathBuf> {
    let exe = env::current_exe().context("locate launcher executable")?;
    exe.parent()
        .and_then(|bin| bin.parent())
        .map(ToOwned::to_owned)
        .context("launcher executable has no project root, use --root")
}

fn main() {
    gdbforge::log::init("warn");

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => print_usage_and_exit(),
    };

    if let Err(e) = run(args) {
        if let Some(Error::Usage(_)) = e.downcast_ref::<Error>() {
            print_usage_and_exit();
        }
        eprintln!("error: {e:#}");
        if let Some(hint) = e.downcast_ref::<Error>().and_then(Error::hint) {
            eprintln!("hint: {hint}");
        }
        exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    // argument shape is checked before the configuration is read
    let mut loaded = None;
    let target = LaunchTarget::parse(args.target.as_slice(), || {
        let config = Config::load(args.config.as_deref())?;
        let interpreter = resolve_interpreter(&config.launcher.interpreter);
        loaded = Some(config);
        interpreter
    })?;
    let config = match loaded {
        Some(config) => config,
        None => Config::load(args.config.as_deref())?,
    };

    let root = match args.root {
        Some(root) => root,
        None => default_root()?,
    };
    let layout = Layout::absolute(&root)
        .with_context(|| format!("resolve project root {}", root.display()))?;
    let artifact = BuildArtifact::locate(&layout)?;
    let script = layout.resolve(&config.launcher.script);
    if !script.is_file() {
        return Err(Error::ScriptNotFound(script).into());
    }
    if let LaunchTarget::Attach { pid, .. } = &target {
        ensure_process_exists(*pid)?;
    }

    let launch = Launch::new(&artifact, &script, &target);
    if args.print {
        println!("{}", launch.command_line());
        return Ok(());
    }

    match launch.exec()? {}
}
