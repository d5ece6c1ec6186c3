//! Size-rotated log file used as the `fmt` layer's writer.
//!
//! When the file grows past [`MAX_FILE_SIZE_BYTES`] it is renamed to
//! `<name>.<unix-timestamp>` and a fresh file is started. Only the newest
//! [`MAX_BACKUP_FILES`] backups are kept.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Rotation threshold (10 MB).
pub const MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

pub const MAX_BACKUP_FILES: usize = 3;

/// Append-only log file with size-based rotation.
///
/// `&RotatingLogFile` implements [`io::Write`], so an `Arc<RotatingLogFile>`
/// is a `tracing_subscriber` `MakeWriter`.
pub struct RotatingLogFile {
    path: PathBuf,
    max_bytes: u64,
    file: Mutex<Option<File>>,
}

impl RotatingLogFile {
    /// Prepares a log at `path`, creating its parent directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn new(path: impl Into<PathBuf>) -> io::Result<Self> {
        Self::with_limit(path, MAX_FILE_SIZE_BYTES)
    }

    /// Like [`RotatingLogFile::new`] with a custom rotation threshold.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn with_limit(path: impl Into<PathBuf>, max_bytes: u64) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            max_bytes,
            file: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rotate_if_full(&self, file: &mut Option<File>) -> io::Result<()> {
        let Ok(metadata) = fs::metadata(&self.path) else {
            return Ok(());
        };
        if metadata.len() <= self.max_bytes {
            return Ok(());
        }

        *file = None;
        let backup = backup_path(&self.path, chrono::Utc::now().timestamp_millis());
        fs::rename(&self.path, backup)?;
        self.prune_backups()
    }

    fn prune_backups(&self) -> io::Result<()> {
        let (Some(dir), Some(name)) = (self.path.parent(), self.path.file_name().and_then(|n| n.to_str())) else {
            return Ok(());
        };
        let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
        let prefix = format!("{name}.");

        let mut backups: Vec<(i64, PathBuf)> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter_map(|path| {
                let stamp = path
                    .file_name()?
                    .to_str()?
                    .strip_prefix(&prefix)?
                    .parse::<i64>()
                    .ok()?;
                Some((stamp, path))
            })
            .collect();

        backups.sort_by(|a, b| b.0.cmp(&a.0));
        for (_, stale) in backups.iter().skip(MAX_BACKUP_FILES) {
            let _ = fs::remove_file(stale);
        }
        Ok(())
    }
}

fn backup_path(path: &Path, stamp: i64) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{stamp}"));
    PathBuf::from(name)
}

impl Write for &RotatingLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::other(format!("log file lock poisoned: {e}")))?;

        self.rotate_if_full(&mut guard)?;
        if guard.is_none() {
            *guard = Some(OpenOptions::new().create(true).append(true).open(&self.path)?);
        }
        match guard.as_mut() {
            Some(file) => file.write(buf),
            None => Err(io::Error::other("log file unavailable")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::other(format!("log file lock poisoned: {e}")))?;
        guard.as_mut().map_or(Ok(()), Write::flush)
    }
}

impl std::fmt::Debug for RotatingLogFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingLogFile")
            .field("path", &self.path)
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}
