//! Tracing subscriber setup.
//!
//! Logs go to stderr (stdout belongs to the operator console) and, when
//! `log.dir` is set, are appended to `<dir>/<YYYY-MM-DD>.log` as well.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use dr_common::config::LogConfig;
use dr_common::{RelayError, RelayResult};
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber. `RUST_LOG` takes precedence over `log.level`.
pub fn init_tracing(config: &LogConfig) -> RelayResult<Option<PathBuf>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file, path) = match config.dir.as_deref() {
        Some(dir) => {
            let (file, path) = open_daily_log(dir)?;
            (Some(file), Some(path))
        }
        None => (None, None),
    };

    // set_global_default fails only if a subscriber is already installed
    let _ = build_subscriber(filter, config.json, file).try_init();

    Ok(path)
}

/// Stderr sink plus an optional ANSI-free file sink, both behind `filter`.
fn build_subscriber(
    filter: EnvFilter,
    json: bool,
    file: Option<File>,
) -> impl Subscriber + Send + Sync + 'static {
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);

    let stderr = fmt::layer().with_target(true).with_writer(std::io::stderr);
    let stderr: BoxedLayer = if json {
        Box::new(stderr.json())
    } else {
        Box::new(stderr)
    };
    layers.push(stderr);

    if let Some(file) = file {
        let sink = fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file));
        let sink: BoxedLayer = if json {
            Box::new(sink.json())
        } else {
            Box::new(sink)
        };
        layers.push(sink);
    }

    tracing_subscriber::registry().with(layers).with(filter)
}

fn open_daily_log(dir: &Path) -> RelayResult<(File, PathBuf)> {
    let path = dir.join(format!("{}.log", Local::now().format("%Y-%m-%d")));
    let log_error = |source: std::io::Error| RelayError::LogFile {
        path: path.clone(),
        source,
    };

    fs::create_dir_all(dir).map_err(log_error)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(log_error)?;
    Ok((file, path))
}
