//! Privacy-gated audit records for completed analyses.
//!
//! An audit record carries length, timestamp, score and model identifier
//! only. Story text and client identity never enter this module. In strict
//! privacy mode the sink is a complete no-op; in any other mode records go
//! to structured stdout logging and, when configured, to a newline-delimited
//! JSON file with size-based rotation (single backup, optionally gzipped).

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;

/// `strict` suppresses all audit output. Any other configured value maps to
/// `Debug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivacyMode {
    Strict,
    Debug,
}

impl PrivacyMode {
    pub fn from_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("strict") {
            PrivacyMode::Strict
        } else {
            PrivacyMode::Debug
        }
    }
}

/// Non-sensitive metadata emitted once per successful analysis.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryAudit {
    pub story_length: usize,
    pub received_at: String,
    pub unfairness_score: f64,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct RotationConfig {
    pub max_bytes: Option<u64>,
    pub keep: usize,
    pub compress: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_bytes: None,
            keep: 1,
            compress: false,
        }
    }
}

/// Simple size-based rotating writer (single backup file <path>.1 kept).
pub struct RotatingWriter {
    path: PathBuf,
    file: std::fs::File,
    max_bytes: Option<u64>,
    keep: usize,
    compress: bool,
}

impl RotatingWriter {
    pub fn open(path: &str, rotation: &RotationConfig) -> std::io::Result<Self> {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            path: PathBuf::from(path),
            file,
            max_bytes: rotation.max_bytes,
            keep: rotation.keep,
            compress: rotation.compress,
        })
    }

    fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        self.check_rotate();
        writeln!(self.file, "{}", line)
    }

    fn check_rotate(&mut self) {
        if let Some(limit) = self.max_bytes {
            if self.exceeds_limit(limit) {
                self.rotate_backups();
                self.compress_latest_backup();
                self.reopen_current();
            }
        }
    }

    fn exceeds_limit(&self, limit: u64) -> bool {
        self.path
            .metadata()
            .map(|meta| meta.len() >= limit)
            .unwrap_or(false)
    }

    fn rotate_backups(&self) {
        if self.keep == 0 {
            return;
        }
        for idx in (1..=self.keep).rev() {
            let old = if idx == 1 {
                self.path.clone()
            } else {
                self.path.with_extension(format!("{}", idx - 1))
            };
            if old.exists() {
                let new = self.path.with_extension(format!("{}", idx));
                let _ = fs::rename(&old, &new);
            }
        }
    }

    fn compress_latest_backup(&self) {
        if !self.compress || self.keep == 0 {
            return;
        }
        let rotated = self.path.with_extension("1");
        if let Ok(data) = fs::read(&rotated) {
            let gz_path = rotated.with_extension("1.gz");
            let mut gz = GzEncoder::new(Vec::new(), Compression::default());
            if gz.write_all(&data).is_ok() {
                if let Ok(buf) = gz.finish() {
                    let _ = fs::write(&gz_path, buf);
                    let _ = fs::remove_file(&rotated);
                }
            }
        }
    }

    fn reopen_current(&mut self) {
        if let Ok(newf) = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
        {
            self.file = newf;
        }
    }
}

/// Destination for audit records, shared across handlers.
#[derive(Clone)]
pub struct AuditSink {
    mode: PrivacyMode,
    writer: Option<Arc<Mutex<RotatingWriter>>>,
}

impl AuditSink {
    pub fn new(mode: PrivacyMode, file: Option<&str>, rotation: &RotationConfig) -> Self {
        let writer = match (mode, file) {
            (PrivacyMode::Strict, _) | (_, None) => None,
            (_, Some(path)) => match RotatingWriter::open(path, rotation) {
                Ok(w) => Some(Arc::new(Mutex::new(w))),
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "failed to open AUDIT_LOG_FILE; file audit disabled");
                    None
                }
            },
        };
        Self { mode, writer }
    }

    pub fn mode(&self) -> PrivacyMode {
        self.mode
    }

    pub fn record(&self, audit: &StoryAudit) {
        if self.mode == PrivacyMode::Strict {
            return;
        }
        tracing::info!(
            target = "audit",
            storyLength = audit.story_length,
            receivedAt = %audit.received_at,
            unfairnessScore = audit.unfairness_score,
            model = %audit.model,
            "story audit"
        );
        if let Some(writer) = &self.writer {
            let line = match serde_json::to_string(audit) {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to serialize audit record");
                    return;
                }
            };
            if let Ok(mut guard) = writer.lock() {
                if let Err(e) = guard.write_line(&line) {
                    tracing::warn!(error = %e, "failed to write audit line");
                }
            }
        }
    }
}
