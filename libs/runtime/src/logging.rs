use crate::config::{LogSection, LoggingConfig};
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    filter::Targets,
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    Layer, Registry,
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendCount, FileLimit},
    ContentLimit, FileRotate,
};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const DEFAULT_MAX_BACKUPS: usize = 3;

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("cannot create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("cannot bridge `log` records: {0}")]
    LogBridge(String),
}

// -------- level helpers --------
fn parse_level(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" | "" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// Returns true if target == prefix or target starts with "prefix::"
fn matches_prefix(target: &str, prefix: &str) -> bool {
    target == prefix
        || (target.starts_with(prefix) && target[prefix.len()..].starts_with("::"))
}

// -------- rotating writers --------

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendCount>>>);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log writer poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log writer poisoned"))?
            .flush()
    }
}

/// Writer that drops everything; used for targets without a file.
#[derive(Clone)]
struct Discard;

impl Write for Discard {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Clone)]
enum SinkHandle {
    File(RotWriter),
    Discard(Discard),
}

impl Write for SinkHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::File(w) => w.write(buf),
            Self::Discard(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::File(w) => w.flush(),
            Self::Discard(w) => w.flush(),
        }
    }
}

/// Routes records to the file of the longest matching target prefix,
/// falling back to the default section's file.
struct FileRouter {
    default: Option<RotWriter>,
    by_prefix: Vec<(String, RotWriter)>,
}

impl FileRouter {
    fn resolve(&self, target: &str) -> SinkHandle {
        self.by_prefix
            .iter()
            .find(|(prefix, _)| matches_prefix(target, prefix))
            .map(|(_, w)| w.clone())
            .or_else(|| self.default.clone())
            .map_or(SinkHandle::Discard(Discard), SinkHandle::File)
    }

    fn is_empty(&self) -> bool {
        self.default.is_none() && self.by_prefix.is_empty()
    }
}

impl<'a> MakeWriter<'a> for FileRouter {
    type Writer = SinkHandle;

    fn make_writer(&'a self) -> Self::Writer {
        self.default
            .clone()
            .map_or(SinkHandle::Discard(Discard), SinkHandle::File)
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        self.resolve(meta.target())
    }
}

/// Relative log paths live under `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating(section: &LogSection, base_dir: &Path) -> Result<Option<RotWriter>, LoggingError> {
    if section.file.trim().is_empty() {
        return Ok(None);
    }

    let path = resolve_log_path(&section.file, base_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LoggingError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let backups = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
    let rot = FileRotate::new(
        &path,
        AppendCount::new(backups),
        ContentLimit::BytesSurpassed(max_bytes as usize),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(Some(RotWriter(Arc::new(Mutex::new(rot)))))
}

// -------- filter construction --------

fn console_targets(cfg: &LoggingConfig) -> Targets {
    let default = cfg
        .get(DEFAULT_SECTION)
        .map_or(LevelFilter::INFO, |s| parse_level(&s.console_level));
    cfg.iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
        .fold(Targets::new().with_default(default), |t, (name, s)| {
            t.with_target(name.clone(), parse_level(&s.console_level))
        })
}

/// A target with its own section but no file inherits the default file.
fn file_targets(cfg: &LoggingConfig) -> Targets {
    let default = cfg
        .get(DEFAULT_SECTION)
        .filter(|s| !s.file.trim().is_empty())
        .map_or(LevelFilter::OFF, |s| parse_level(&s.file_level));
    cfg.iter()
        .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
        .fold(Targets::new().with_default(default), |t, (name, s)| {
            let level = if s.file.trim().is_empty() {
                default
            } else {
                parse_level(&s.file_level)
            };
            t.with_target(name.clone(), level)
        })
}

fn file_router(cfg: &LoggingConfig, base_dir: &Path) -> Result<FileRouter, LoggingError> {
    let mut default = None;
    let mut by_prefix: Vec<(String, RotWriter)> = Vec::new();
    // Sections sharing a path share one writer
    let mut opened: HashMap<PathBuf, RotWriter> = HashMap::new();

    for (name, section) in cfg {
        let path = resolve_log_path(&section.file, base_dir);
        let writer = match opened.get(&path) {
            Some(w) => Some(w.clone()),
            None => open_rotating(section, base_dir)?,
        };
        let Some(writer) = writer else { continue };
        opened.insert(path, writer.clone());

        if name == DEFAULT_SECTION {
            default = Some(writer);
        } else {
            by_prefix.push((name.clone(), writer));
        }
    }
    // Longest prefix first so nested targets win
    by_prefix.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    Ok(FileRouter { default, by_prefix })
}

// -------- public init --------

/// Install the global subscriber: a console layer plus, when any section
/// names a file, a JSON layer writing to size-rotated files.
/// Relative file paths are resolved against `base_dir` (usually the data dir).
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) -> Result<(), LoggingError> {
    let router = file_router(cfg, base_dir)?;

    let console_layer = fmt::layer()
        .with_ansi(std::io::stdout().is_terminal())
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console_targets(cfg));

    let file_layer = (!router.is_empty()).then(|| {
        fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(router)
            .with_filter(file_targets(cfg))
    });

    let subscriber = Registry::default().with(console_layer).with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    // Bridge `log` → `tracing` for dependencies that still use `log`
    tracing_log::LogTracer::init().map_err(|e| LoggingError::LogBridge(e.to_string()))?;
    Ok(())
}

// =================== tests ===================
