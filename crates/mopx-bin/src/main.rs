use anyhow::{Context, Result};
use clap::Parser;
use core_config::{Config, Overrides};
use core_events::ResizeNudge;
use core_input::CrosstermKeys;
use core_panes::{FsContentSource, Indicator, SystemLauncher};
use core_terminal::{
    CrosstermBackend, CrosstermSizeProbe, CrosstermSurface, DisplaySurface, TerminalBackend,
};
use mopx::{ResizeWatcher, Runtime, build_layout, list_dir_items, log_dir};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "mopx.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "mopx", version, about = "Terminal panel browser")]
struct Args {
    /// Items to list. Defaults to the entries of the current directory.
    pub paths: Vec<PathBuf>,
    /// Title drawn on the list border.
    #[arg(long)]
    pub title: Option<String>,
    /// Program used to open the selected item (Enter / l).
    #[arg(long)]
    pub pager: Option<String>,
    /// Program used to edit the selected item (e). Overrides $EDITOR.
    #[arg(long)]
    pub editor: Option<String>,
    /// Share of the screen height given to the status bar.
    #[arg(long)]
    pub status_ratio: Option<f64>,
    /// Share of the list pane width given to the list column.
    #[arg(long)]
    pub list_ratio: Option<f64>,
    /// Key read timeout and resize poll period, in milliseconds.
    #[arg(long)]
    pub tick_ms: Option<u64>,
    /// Status indicator as LABEL=VALUE (`true`/`false` flag, `%NN` bar).
    #[arg(long = "indicator", value_name = "LABEL=VALUE")]
    pub indicators: Vec<Indicator>,
    /// Directory for mopx.log. Defaults to a `mopx` directory under the
    /// system temp directory.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            title: self.title.clone(),
            editor: self.editor.clone(),
            pager: self.pager.clone(),
            status_ratio: self.status_ratio,
            list_ratio: self.list_ratio,
            tick: self.tick_ms.map(Duration::from_millis),
        }
    }

    fn items(&self) -> Result<Vec<String>> {
        if self.paths.is_empty() {
            return list_dir_items(Path::new(".")).context("listing current directory");
        }
        Ok(self
            .paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect())
    }
}

fn configure_logging(dir: Option<&Path>) -> Option<WorkerGuard> {
    let log_dir = log_dir(dir);
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("mopx: logging disabled, cannot create {}: {e}", log_dir.display());
        return None;
    }
    let log_path = log_dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Some(guard),
        // Global subscriber already installed; dropping the guard stops the writer.
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            core_terminal::emergency_restore();
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

#[cfg(unix)]
async fn terminated() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(target: "runtime", error = %e, "sigterm_handler_unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminated() {
    std::future::pending::<()>().await;
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging(args.log_dir.as_deref());
    install_panic_hook();

    let config = Config::from_env(args.overrides())?;
    let items = args.items()?;
    info!(target: "runtime", items = items.len(), indicators = args.indicators.len(), "startup");

    let mut backend = CrosstermBackend::new();
    backend.set_title(&config.title)?;
    let guard = backend.enter_guard()?;

    let surface = CrosstermSurface::new()?;
    let size = surface.size();
    let root = build_layout(
        &config,
        size,
        items,
        args.indicators,
        Box::new(FsContentSource::new()),
        Box::new(SystemLauncher),
    )?;

    let nudge = ResizeNudge::new();
    let (watcher, sizes) = ResizeWatcher::spawn(
        CrosstermSizeProbe,
        nudge.clone(),
        config.resize_poll_interval,
        size,
    );
    let mut runtime = Runtime::new(surface, CrosstermKeys::new(nudge), root, sizes)
        .with_read_timeout(Some(config.read_timeout))
        .with_watcher(watcher)
        .with_guard(guard);

    let reason = runtime.run(terminated()).await?;
    info!(target: "runtime", %reason, "exit");
    Ok(())
}
