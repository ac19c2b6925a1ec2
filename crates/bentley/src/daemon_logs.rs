//! Persistent JSONL logs for long-running daemons
//!
//! Each record is one JSON line appended to a file. Reads parse the file back,
//! skipping lines that fail to parse, so a crash mid-write never poisons the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

/// Severity of a daemon log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
  Verbose,
  Info,
  Success,
  Warn,
  Error,
}

impl LogLevel {
  /// Parse a level filter; `all` and unknown values yield `None` (no filtering)
  pub fn parse_filter(value: &str) -> Option<Self> {
    match value.to_ascii_lowercase().as_str() {
      "verbose" => Some(Self::Verbose),
      "info" => Some(Self::Info),
      "success" => Some(Self::Success),
      "warn" | "warning" => Some(Self::Warn),
      "error" => Some(Self::Error),
      _ => None,
    }
  }
}

/// HTTP request details attached to a record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct LogContext {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub request_id: Option<String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub method: Option<String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub status_code: Option<u16>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration_ms: Option<f64>,
}

/// One line of the log file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct LogEntry {
  pub timestamp: DateTime<Utc>,
  pub level: LogLevel,
  pub message: String,
  pub component: String,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub context: Option<LogContext>,
}

struct LogFile {
  path: PathBuf,
  silent: bool,
}

impl LogFile {
  fn open(path: &Path, silent: bool) -> std::io::Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Self { path: path.to_path_buf(), silent })
  }

  fn append(&self, entry: &LogEntry) -> std::io::Result<()> {
    let mut line = serde_json::to_string(entry)
      .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    line.push('\n');

    let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
    file.write_all(line.as_bytes())?;
    file.flush()
  }

  fn read(&self, limit: Option<usize>, level: Option<LogLevel>) -> std::io::Result<Vec<LogEntry>> {
    if !self.path.exists() {
      return Ok(Vec::new());
    }

    let reader = BufReader::new(std::fs::File::open(&self.path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
      let line = line?;
      if line.trim().is_empty() {
        continue;
      }
      if let Ok(entry) = serde_json::from_str::<LogEntry>(&line) {
        if level.is_none_or(|wanted| entry.level == wanted) {
          entries.push(entry);
        }
      }
    }

    // Keep the newest `limit` records, oldest first
    if let Some(limit) = limit {
      let skip = entries.len().saturating_sub(limit);
      entries.drain(..skip);
    }

    Ok(entries)
  }
}

/// Thread-safe handle to a JSONL log file
#[derive(Clone)]
pub struct DaemonLogs {
  inner: Arc<Mutex<LogFile>>,
}

impl DaemonLogs {
  /// Open (or create) a log file that also echoes to the console
  pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
    Self::new_with_silent(path, false)
  }

  /// Open (or create) a log file; `silent` suppresses the console echo
  pub fn new_with_silent<P: AsRef<Path>>(path: P, silent: bool) -> std::io::Result<Self> {
    let file = LogFile::open(path.as_ref(), silent)?;
    Ok(Self { inner: Arc::new(Mutex::new(file)) })
  }

  /// Append a record, returning any I/O error
  pub async fn record(
    &self,
    level: LogLevel,
    message: &str,
    component: &str,
    context: Option<LogContext>,
  ) -> std::io::Result<()> {
    let entry = LogEntry {
      timestamp: Utc::now(),
      level,
      message: message.to_string(),
      component: component.to_string(),
      context,
    };

    let guard = self.inner.lock().await;
    guard.append(&entry)?;

    if !guard.silent {
      echo(level, &format!("[{component}] {message}"));
    }
    Ok(())
  }

  /// Read back records, optionally filtered by level and capped to the newest `limit`
  pub async fn get_logs(
    &self,
    limit: Option<usize>,
    level: Option<LogLevel>,
  ) -> std::io::Result<Vec<LogEntry>> {
    let guard = self.inner.lock().await;
    guard.read(limit, level)
  }

  pub async fn info(&self, message: &str, component: &str) {
    let _ = self.record(LogLevel::Info, message, component, None).await;
  }

  pub async fn success(&self, message: &str, component: &str) {
    let _ = self.record(LogLevel::Success, message, component, None).await;
  }

  pub async fn warn(&self, message: &str, component: &str) {
    let _ = self.record(LogLevel::Warn, message, component, None).await;
  }

  pub async fn error(&self, message: &str, component: &str) {
    let _ = self.record(LogLevel::Error, message, component, None).await;
  }

  pub async fn with_context(&self, level: LogLevel, message: &str, component: &str, context: LogContext) {
    let _ = self.record(level, message, component, Some(context)).await;
  }
}

fn echo(level: LogLevel, message: &str) {
  match level {
    LogLevel::Verbose => crate::verbose!("{message}"),
    LogLevel::Info => crate::info!("{message}"),
    LogLevel::Success => crate::success!("{message}"),
    LogLevel::Warn => crate::warn!("{message}"),
    LogLevel::Error => crate::error!("{message}"),
  }
}
