// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Size-rotated log file.
//!
//! When a write would push the file past its size limit, the current file is
//! renamed to `<stem>-<UTC timestamp>.<ext>` next to it and a fresh file is
//! opened. After each rotation, backups beyond the retention count or older
//! than the retention age are removed.
//!
//! A failed rename or prune never stops logging: the fresh file is opened
//! regardless and the failure is returned by the next `flush`. A file removed
//! from under us is simply recreated.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";

/// Rotation limits; zero means unlimited for age and backups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_size_bytes: u64,
    pub max_age_days: u32,
    pub max_backups: usize,
}

pub struct RotatingFile {
    path: PathBuf,
    policy: RotationPolicy,
    file: Option<File>,
    size: u64,
    deferred: Option<io::Error>,
}

impl RotatingFile {
    /// Open (or create) `path` for appending
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> io::Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path,
            policy,
            file: Some(file),
            size,
            deferred: None,
        })
    }

    /// Bytes written to the current file
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Only a failure to open the fresh file is returned; everything else is
    /// deferred to the next flush.
    fn rotate(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.sync_all() {
                self.defer(e);
            }
        }
        match fs::rename(&self.path, self.backup_path(Utc::now())) {
            Ok(()) => {}
            // Deleted or moved away; nothing to back up
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => self.defer(e),
        }

        // Appending keeps the old content if the rename failed
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        self.file = Some(file);
        self.size = 0;
        if let Err(e) = self.remove_expired_backups() {
            self.defer(e);
        }
        Ok(())
    }

    fn defer(&mut self, err: io::Error) {
        self.deferred.get_or_insert(err);
    }

    fn name_parts(&self) -> (String, String) {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (stem, ext)
    }

    fn backup_path(&self, now: DateTime<Utc>) -> PathBuf {
        let (stem, ext) = self.name_parts();
        let name = format!("{}-{}{}", stem, now.format(BACKUP_TIME_FORMAT), ext);
        self.path.with_file_name(name)
    }

    /// Existing backups, newest first
    pub fn backups(&self) -> io::Result<Vec<(DateTime<Utc>, PathBuf)>> {
        let (stem, ext) = self.name_parts();
        let prefix = format!("{}-", stem);
        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut backups = Vec::new();
        for dirent in fs::read_dir(&dir)? {
            let dirent = dirent?;
            let name = dirent.file_name().to_string_lossy().into_owned();
            let Some(stamp) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&ext))
            else {
                continue;
            };
            if let Ok(t) = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT) {
                backups.push((t.and_utc(), dirent.path()));
            }
        }
        backups.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(backups)
    }

    fn remove_expired_backups(&self) -> io::Result<()> {
        let backups = self.backups()?;
        let cutoff = (self.policy.max_age_days > 0)
            .then(|| Utc::now() - Duration::days(i64::from(self.policy.max_age_days)));

        for (idx, (stamp, path)) in backups.iter().enumerate() {
            let too_many = self.policy.max_backups > 0 && idx >= self.policy.max_backups;
            let too_old = cutoff.map(|c| *stamp < c).unwrap_or(false);
            if too_many || too_old {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len() as u64;
        if len > self.policy.max_size_bytes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "write length {} exceeds maximum file size {}",
                    len, self.policy.max_size_bytes
                ),
            ));
        }
        if self.file.is_none() || self.size + len > self.policy.max_size_bytes {
            self.rotate()?;
        }

        let file = match self.file.as_mut() {
            Some(f) => f,
            None => return Err(io::Error::new(io::ErrorKind::Other, "log file is closed")),
        };
        let n = file.write(buf)?;
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(f) = self.file.as_mut() {
            f.flush()?;
            f.sync_data()?;
        }
        match self.deferred.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
