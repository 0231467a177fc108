#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use objtree::cli::Args;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run_app() {
        eprintln!("objtree: {e:#}");
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let args = Args::parse().validated();
    init_tracing(args.verbose);
    scan_and_render(&args)
}

/// Route diagnostics to stderr; `-v` raises the floor, `RUST_LOG` wins.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(windows)]
fn scan_and_render(args: &Args) -> Result<()> {
    use anyhow::Context;
    use objtree::namespace::nt::NtNamespace;
    use objtree::render::{render_tree, RenderConfig};
    use objtree::tree::Scanner;
    use std::io::Write;

    let ns = NtNamespace::resolve().context("failed to resolve ntdll entry points")?;
    let root = Scanner::new(&ns).scan(&args.path, args.recurse);

    let config = RenderConfig {
        use_color: !args.no_color,
    };
    let stdout = std::io::stdout();
    let mut writer = std::io::BufWriter::with_capacity(64 * 1024, stdout.lock());
    render_tree(&mut writer, &root, &config).context("failed to write tree")?;
    writer.flush().context("failed to flush output")?;

    // Subtree failures were logged as they happened; only a root that
    // could not be opened at all turns into a failing exit status.
    anyhow::ensure!(root.error.is_none(), "scan of {} failed", args.path);
    Ok(())
}

#[cfg(not(windows))]
fn scan_and_render(_args: &Args) -> Result<()> {
    anyhow::bail!("the NT object namespace is only available on Windows");
}
