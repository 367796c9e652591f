//! Tracing setup
//!
//! The TUI owns the terminal, so logs go to a file in the platform data
//! directory, or in the directory given with `--log-dir`. The previous
//! session's log is replaced on startup.

use directories::ProjectDirs;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Log file name inside the log directory
pub const LOG_FILE_NAME: &str = "l1chat.log";

/// Directory holding the log file, e.g. `~/.local/share/l1chat` on Linux
pub fn log_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "l1chat").map(|dirs| dirs.data_local_dir().to_path_buf())
}

/// Filter used when `RUST_LOG` is not set
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug,hyper=info,hyper_util=info,reqwest=info,rustls=info"
    } else {
        "info,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn"
    }
}

/// Creates the log directory and removes the previous session's log
pub fn prepare_log_dir(dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(LOG_FILE_NAME);
    if path.exists() {
        fs::remove_file(&path)?;
    }
    Ok(path)
}

/// Installs the global subscriber
///
/// Logs go to `dir`, or to [`log_dir`] when it is `None`. `stderr` mirrors
/// warnings to the console, which only makes sense when the TUI is not
/// running. The returned guard flushes the file writer on drop and must be
/// held for the life of the program.
pub fn init(verbose: bool, stderr: bool, dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let mut guard = None;
    let mut setup_error = None;
    let file_layer = match dir.or_else(log_dir) {
        Some(dir) => match prepare_log_dir(&dir) {
            Ok(_) => {
                let appender = tracing_appender::rolling::never(&dir, LOG_FILE_NAME);
                let (writer, worker_guard) = tracing_appender::non_blocking(appender);
                guard = Some(worker_guard);
                Some(fmt::layer().with_writer(writer).with_ansi(false))
            }
            Err(e) => {
                setup_error = Some(format!("cannot use log directory {}: {}", dir.display(), e));
                None
            }
        },
        None => None,
    };

    let stderr_layer = stderr.then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_filter(LevelFilter::WARN)
    });

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
    {
        eprintln!("warning: logging disabled: {}", e);
        return guard;
    }

    if let Some(msg) = setup_error {
        tracing::warn!("{}", msg);
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting l1chat");
    guard
}
