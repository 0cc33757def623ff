use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::config::Config;
use crate::utils::timing::TIMING_TARGET;

/// Plain-text general log; what `promptverse logs` tails by default.
pub const GENERAL_LOG_NAME: &str = "promptverse.log";
/// Command and provider-call timings only.
pub const TIMING_LOG_NAME: &str = "timing.log";
/// Machine-readable copy of the general log.
pub const GENERAL_JSON_LOG_NAME: &str = "promptverse.jsonl";

/// Flushes the non-blocking file writers when dropped. Keep it alive for the
/// whole run.
pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

#[derive(Debug, Clone)]
pub struct LogTail {
    pub path: PathBuf,
    pub lines: Vec<String>,
}

fn parse_log_level(value: &str) -> LevelFilter {
    match value.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// Everything except timing events, with HTTP client chatter capped at warn.
fn general_filter(level: LevelFilter) -> Targets {
    Targets::new()
        .with_default(level)
        .with_target(TIMING_TARGET, LevelFilter::OFF)
        .with_target("hyper", LevelFilter::WARN)
        .with_target("hyper_util", LevelFilter::WARN)
        .with_target("reqwest", LevelFilter::WARN)
}

fn timing_filter() -> Targets {
    Targets::new()
        .with_default(LevelFilter::OFF)
        .with_target(TIMING_TARGET, LevelFilter::INFO)
}

fn daily_writer(dir: &Path, name: &str, guards: &mut Vec<WorkerGuard>) -> NonBlocking {
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));
    guards.push(guard);
    writer
}

/// Installs the global subscriber: human-readable stderr plus daily files
/// under `config.logs_dir`. Stdout stays reserved for command results.
pub fn init_logging(config: &Config) -> LoggingGuards {
    let logs_dir = config.logs_dir.as_path();
    if let Err(err) = fs::create_dir_all(logs_dir) {
        eprintln!("Failed to create logs directory {}: {err}", logs_dir.display());
    }

    let level = parse_log_level(&config.log_level);
    let mut guards = Vec::with_capacity(3);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(general_filter(level));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(daily_writer(logs_dir, GENERAL_LOG_NAME, &mut guards))
        .with_ansi(false)
        .with_filter(general_filter(level));
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(daily_writer(logs_dir, GENERAL_JSON_LOG_NAME, &mut guards))
        .with_filter(general_filter(level));
    let timing_layer = tracing_subscriber::fmt::layer()
        .with_writer(daily_writer(logs_dir, TIMING_LOG_NAME, &mut guards))
        .with_ansi(false)
        .with_target(false)
        .with_filter(timing_filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(json_layer)
        .with(timing_layer)
        .init();

    LoggingGuards { _guards: guards }
}

/// Last `max_lines` lines of the most recently written file whose name
/// starts with `base_name` (daily rotation appends a date suffix).
pub fn read_recent_log_lines(
    logs_dir: &Path,
    base_name: &str,
    max_lines: usize,
) -> io::Result<Option<LogTail>> {
    if max_lines == 0 || !logs_dir.exists() {
        return Ok(None);
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(logs_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !entry.file_name().to_string_lossy().starts_with(base_name) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((modified, path));
    }

    let Some((_, path)) = candidates.into_iter().max_by_key(|(modified, _)| *modified) else {
        return Ok(None);
    };

    let mut ring = VecDeque::with_capacity(max_lines);
    for line in BufReader::new(File::open(&path)?).lines() {
        if ring.len() == max_lines {
            ring.pop_front();
        }
        ring.push_back(line?);
    }
    Ok(Some(LogTail {
        path,
        lines: ring.into(),
    }))
}
