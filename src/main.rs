//! `fswatch`: print each settled change to a set of files.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{
    Parser,
    builder::styling::{AnsiColor, Effects, Styles},
};
use fswatch::{FileWatcher, WatchMode, WatchSettings};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser, Debug)]
#[command(name = "fswatch", version, styles = clap_cargo_style())]
#[command(about = "Print a line each time a watched file settles after a change")]
struct Cli {
    /// Files to watch (added to those from the config file)
    paths: Vec<PathBuf>,

    /// Configuration file (defaults to .fswatch.toml in this or a parent directory)
    #[arg(short, long, env = "FSWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Watch the files themselves instead of their parent directories
    #[arg(short, long)]
    direct: bool,

    /// Quiet period in milliseconds before a change is reported
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn settings(&self) -> Result<WatchSettings> {
        let mut settings = match &self.config {
            Some(path) => WatchSettings::load_from(path),
            None => WatchSettings::load(),
        }
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("failed to load configuration")?;

        for path in &self.paths {
            let absolute = std::path::absolute(path)
                .with_context(|| format!("cannot resolve {}", path.display()))?;
            settings.paths.push(absolute);
        }
        if self.direct {
            settings.mode = WatchMode::Direct;
        }
        if let Some(ms) = self.debounce_ms {
            settings.debounce_ms = ms;
        }

        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;

    if cli.print_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    fswatch::logging::init_with_config(&settings.logging);

    if settings.paths.is_empty() {
        bail!("nothing to watch: pass file paths or set `paths` in the config file");
    }

    let mut watcher = FileWatcher::builder()
        .settings(&settings)
        .on_change(|path| println!("{}", path.display()))
        .build()?;
    watcher.start()?;

    fswatch::log_event!(
        "cli",
        "watching",
        "{} files, ctrl-c to stop",
        watcher.paths().count()
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;

    watcher.stop()?;
    Ok(())
}
