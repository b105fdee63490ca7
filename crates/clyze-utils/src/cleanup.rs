//! Best-effort removal of temporary directories.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, warn};

/// Outcome of a quiet cleanup pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Directories that were removed
    pub removed: usize,
    /// Directories that did not exist
    pub missing: usize,
    /// Directories that could not be removed (logged, not escalated)
    pub failed: usize,
}

/// Remove every directory in `dirs`, ignoring failures.
///
/// A directory that is already gone counts as `missing`, not as a failure.
/// Other errors are logged at warn level and counted.
pub fn remove_dirs_quietly<I, P>(dirs: I) -> CleanupReport
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut report = CleanupReport::default();

    for dir in dirs {
        let dir = dir.as_ref();
        match std::fs::remove_dir_all(dir) {
            Ok(()) => {
                debug!(path = %dir.display(), "Removed temporary directory");
                report.removed += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => report.missing += 1,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Failed to remove temporary directory");
                report.failed += 1;
            }
        }
    }

    report
}
