//! Age-based sweep of the output directory.
//!
//! Best effort: every failure is logged and counted, never returned. A file
//! is removed when its age is at least `max_age_hours`, so a zero age clears
//! everything but the reserved name. Files with a modification time in the
//! future count as age zero. Subdirectories and other non-regular entries are
//! left alone.

use crate::naming::parse_output_name;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

const SECS_PER_HOUR: u64 = 3600;

/// What a sweep did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    pub kept: usize,
    pub failed: usize,
}

/// Delete regular files in `dir` at least `max_age_hours` old, except one
/// named `reserved`.
///
/// A missing directory is an empty sweep.
pub fn cleanup_old_files(dir: &Path, max_age_hours: u64, reserved: &str) -> CleanupReport {
    let mut report = CleanupReport::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "output directory missing, nothing to clean");
            return report;
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot read output directory");
            report.failed += 1;
            return report;
        }
    };

    let max_age = Duration::from_secs(max_age_hours.saturating_mul(SECS_PER_HOUR));
    let now = SystemTime::now();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "cannot read directory entry");
                report.failed += 1;
                continue;
            }
        };
        let path = entry.path();

        if entry.file_name() == reserved {
            report.kept += 1;
            continue;
        }

        let modified = match entry.metadata() {
            Ok(meta) if !meta.is_file() => continue,
            Ok(meta) => meta.modified(),
            Err(e) => Err(e),
        };
        let modified = match modified {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot stat file");
                report.failed += 1;
                continue;
            }
        };

        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age < max_age {
            report.kept += 1;
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                // Foreign files in the directory are swept too; they just log without an operation.
                let operation = entry
                    .file_name()
                    .to_str()
                    .and_then(parse_output_name)
                    .map(|parsed| parsed.prefix);
                debug!(
                    path = %path.display(),
                    operation = operation.as_deref().unwrap_or("-"),
                    age_secs = age.as_secs(),
                    "removed old output"
                );
                report.removed += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove old output");
                report.failed += 1;
            }
        }
    }

    info!(
        dir = %dir.display(),
        removed = report.removed,
        kept = report.kept,
        failed = report.failed,
        "cleanup finished"
    );
    report
}
