// logger.rs
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};

use anyhow::Context as _;
use directories::BaseDirs;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_KEEP_RUNS: usize = 8;
const FILE_PREFIX: &str = "inject";

/// Where run logs go: `<data dir>/<app_id>/logs`.
pub fn logs_dir(app_id: &str) -> io::Result<PathBuf> {
    let base = BaseDirs::new().ok_or_else(|| io::Error::other("no home directory"))?;
    let dir = base.data_dir().join(app_id).join("logs");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// `<prefix>-YYYYmmdd-HHMMSS-<pid>.log`
fn run_log_name(prefix: &str) -> String {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    format!("{prefix}-{stamp}-{}.log", std::process::id())
}

/// Delete all but the newest `keep` files named `<prefix>-*.log` in `dir`.
fn prune_runs(dir: &Path, prefix: &str, keep: usize) {
    let Ok(read) = fs::read_dir(dir) else {
        return;
    };
    let mut runs: Vec<(SystemTime, PathBuf)> = read
        .flatten()
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.starts_with(prefix) && name.ends_with(".log")
        })
        .map(|e| {
            let mtime = e
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (mtime, e.path())
        })
        .collect();
    runs.sort_by_key(|(t, _)| *t);
    let excess = runs.len().saturating_sub(keep);
    for (_, path) in runs.into_iter().take(excess) {
        let _ = fs::remove_file(path);
    }
}

struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the global subscriber: one log file per run under [`logs_dir`],
/// filtered by `RUST_LOG` (default `info`). Records from crates that log via
/// `log` are bridged in. Stdout is left alone.
///
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init(app_id: &str) -> anyhow::Result<WorkerGuard> {
    init_in(&logs_dir(app_id).context("creating log directory")?, DEFAULT_KEEP_RUNS)
}

pub fn init_in(dir: &Path, keep_runs: usize) -> anyhow::Result<WorkerGuard> {
    // Leave room for the file about to be created.
    prune_runs(dir, FILE_PREFIX, keep_runs.saturating_sub(1));

    let path = dir.join(run_log_name(FILE_PREFIX));
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    let (writer, guard) = non_blocking(file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = fmt::layer()
        .with_writer(writer)
        .with_timer(LocalTime)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true);

    // A subscriber may already be installed (tests, embedding); keep it.
    // `try_init` also routes `log` records through tracing.
    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();

    Ok(guard)
}
