//! Run statistics and their human-readable summary.

use std::fmt;

use super::classify::{ChangeReason, Disposition};

/// Counters for one reconciliation run. Only confirmed operations are counted
/// (in test mode, operations that would have been performed).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStatistics {
    pub files_copied_new: u64,
    pub bytes_copied_new: u64,
    pub files_changed_size: u64,
    pub bytes_changed_size: u64,
    pub files_changed_date: u64,
    pub bytes_changed_date: u64,
    pub files_deleted: u64,
    pub bytes_deleted: u64,
    pub empty_dirs_removed: u64,
    /// Operations that were attempted and failed.
    pub failures: u64,
}

impl RunStatistics {
    /// Count a completed operation for `disposition` moving `bytes`.
    pub fn record(&mut self, disposition: Disposition, bytes: u64) {
        match disposition {
            Disposition::CopyMissing => {
                self.files_copied_new += 1;
                self.bytes_copied_new += bytes;
            }
            Disposition::CopyChanged(ChangeReason::SizeDiffers) => {
                self.files_changed_size += 1;
                self.bytes_changed_size += bytes;
            }
            Disposition::CopyChanged(ChangeReason::NewerInSource) => {
                self.files_changed_date += 1;
                self.bytes_changed_date += bytes;
            }
            Disposition::DeleteStale => {
                self.files_deleted += 1;
                self.bytes_deleted += bytes;
            }
            Disposition::PruneEmptyDir => self.empty_dirs_removed += 1,
            Disposition::NoAction => {}
        }
    }

    /// Add every counter of `other` into `self`.
    pub fn absorb(&mut self, other: RunStatistics) {
        self.files_copied_new += other.files_copied_new;
        self.bytes_copied_new += other.bytes_copied_new;
        self.files_changed_size += other.files_changed_size;
        self.bytes_changed_size += other.bytes_changed_size;
        self.files_changed_date += other.files_changed_date;
        self.bytes_changed_date += other.bytes_changed_date;
        self.files_deleted += other.files_deleted;
        self.bytes_deleted += other.bytes_deleted;
        self.empty_dirs_removed += other.empty_dirs_removed;
        self.failures += other.failures;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// True when any counter is non-zero.
    pub fn has_activity(&self) -> bool {
        *self != RunStatistics::default()
    }

    pub fn files_copied(&self) -> u64 {
        self.files_copied_new + self.files_changed_size + self.files_changed_date
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "Copied {} file[s] not in destination [copied]  , {}",
                self.files_copied_new,
                human_size(self.bytes_copied_new)
            ),
            format!(
                "Copied {} file[s] that size has changed      , {}",
                self.files_changed_size,
                human_size(self.bytes_changed_size)
            ),
            format!(
                "Copied {} file[s] that date has changed      , {}",
                self.files_changed_date,
                human_size(self.bytes_changed_date)
            ),
            format!(
                "Deleted {} file[s] not in source [deleted]   , {}",
                self.files_deleted,
                human_size(self.bytes_deleted)
            ),
            format!("Empty directories deleted                   , {}", self.empty_dirs_removed),
        ];
        if self.failures > 0 {
            lines.push(format!("Failed operations                           , {}", self.failures));
        }
        lines
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.summary_lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Binary-unit size with two decimals: divides by 1024 while the value exceeds 1024.
pub fn human_size(bytes: u64) -> String {
    const SUFFIXES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut idx = 0;
    while size > 1024.0 && idx < SUFFIXES.len() - 1 {
        size /= 1024.0;
        idx += 1;
    }
    format!("{:.2} {}", size, SUFFIXES[idx])
}
