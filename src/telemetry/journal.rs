//! # Telemetry Journal
//!
//! Appends every downlink telemetry frame to a JSONL file.
//!
//! Files are named `telemetry_<stamp>_<seq>.jsonl` inside the journal
//! directory. A new file starts after `max_records_per_file` records and only
//! the newest `max_files_to_keep` journal files are retained.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::error::{GimbalLinkError, Result};
use crate::protocol::frame::TelemetryFrame;

const FILE_PREFIX: &str = "telemetry_";
const FILE_EXTENSION: &str = "jsonl";

/// One journal line
#[derive(Debug, Serialize)]
struct JournalRecord<'a> {
    /// RFC 3339 wall-clock time the frame was sent
    timestamp: String,
    #[serde(flatten)]
    frame: &'a TelemetryFrame,
}

/// Rotating JSONL telemetry writer
pub struct TelemetryJournal {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    files_opened: u32,
}

impl std::fmt::Debug for TelemetryJournal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryJournal")
            .field("dir", &self.dir)
            .field("current_path", &self.current_path)
            .field("records_in_file", &self.records_in_file)
            .finish_non_exhaustive()
    }
}

impl TelemetryJournal {
    /// Create a journal writing into `dir`.
    ///
    /// The directory is created if missing. No file is opened until the
    /// first record.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created, or `Journal` if a
    /// limit is zero.
    pub fn new<P: AsRef<Path>>(dir: P, max_records_per_file: usize, max_files_to_keep: usize) -> Result<Self> {
        if max_records_per_file == 0 || max_files_to_keep == 0 {
            return Err(GimbalLinkError::Journal(
                "journal limits must be greater than 0".to_string(),
            ));
        }

        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        info!("Telemetry journal directory: {}", dir.display());

        Ok(Self {
            dir,
            max_records_per_file,
            max_files_to_keep,
            writer: None,
            current_path: None,
            records_in_file: 0,
            files_opened: 0,
        })
    }

    /// Create a journal from the `[telemetry]` config section.
    pub fn from_config(config: &TelemetryConfig) -> Result<Self> {
        Self::new(&config.log_dir, config.max_records_per_file, config.max_files_to_keep)
    }

    /// Path of the file currently being written, if any
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// Append one frame as a JSON line.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written. The caller
    /// logs it and keeps running.
    pub fn record(&mut self, frame: &TelemetryFrame) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let record = JournalRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            frame,
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| GimbalLinkError::Journal(format!("Failed to serialize telemetry: {}", e)))?;

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| GimbalLinkError::Journal("journal file not open".to_string()))?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;

        self.records_in_file += 1;
        Ok(())
    }

    /// Close the current file and start a new one
    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = self.dir.join(format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX, stamp, self.files_opened, FILE_EXTENSION
        ));
        let file = File::create(&path)?;
        debug!("Opened telemetry journal {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;
        self.files_opened = self.files_opened.wrapping_add(1);

        self.prune();
        Ok(())
    }

    /// Delete the oldest journal files beyond the retention limit
    fn prune(&self) {
        let mut files = match journal_files(&self.dir) {
            Ok(files) => files,
            Err(e) => {
                warn!("Failed to list telemetry journal directory: {}", e);
                return;
            }
        };

        if files.len() <= self.max_files_to_keep {
            return;
        }

        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for path in files.into_iter().take(excess) {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed old telemetry journal {}", path.display()),
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
}

/// Journal files in `dir`, unsorted
fn journal_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_journal = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_EXTENSION))
            .unwrap_or(false);
        if is_journal {
            files.push(path);
        }
    }
    Ok(files)
}
