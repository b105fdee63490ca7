//! JVM classpath assembly

use std::ffi::OsString;
use std::path::PathBuf;

/// Separator between classpath entries on this platform.
#[cfg(windows)]
pub const CLASSPATH_SEPARATOR: &str = ";";

/// Separator between classpath entries on this platform.
#[cfg(not(windows))]
pub const CLASSPATH_SEPARATOR: &str = ":";

/// Ordered list of classpath entries.
///
/// An empty classpath means no `-cp` flag at all, not an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classpath {
    entries: Vec<PathBuf>,
}

impl Classpath {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    #[must_use]
    pub fn entry(mut self, entry: impl Into<PathBuf>) -> Self {
        self.entries.push(entry.into());
        self
    }

    /// Append an entry in place.
    pub fn push(&mut self, entry: impl Into<PathBuf>) {
        self.entries.push(entry.into());
    }

    #[must_use]
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries joined with [`CLASSPATH_SEPARATOR`], or `None` when empty.
    #[must_use]
    pub fn joined(&self) -> Option<OsString> {
        if self.entries.is_empty() {
            return None;
        }
        let mut joined = OsString::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                joined.push(CLASSPATH_SEPARATOR);
            }
            joined.push(entry.as_os_str());
        }
        Some(joined)
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for Classpath {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<P: Into<PathBuf>> Extend<P> for Classpath {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        self.entries.extend(iter.into_iter().map(Into::into));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_classpath_has_no_value() {
        let cp = Classpath::new();
        assert!(cp.is_empty());
        assert_eq!(cp.joined(), None);
    }

    #[test]
    fn test_single_entry_has_no_separator() {
        let cp = Classpath::new().entry("lib/a.jar");
        assert_eq!(cp.joined(), Some(OsString::from("lib/a.jar")));
    }

    #[test]
    fn test_entries_keep_order() {
        let cp: Classpath = ["a.jar", "b.jar", "classes"].into_iter().collect();
        let expected = format!("a.jar{0}b.jar{0}classes", CLASSPATH_SEPARATOR);
        assert_eq!(cp.joined(), Some(OsString::from(expected)));
        assert_eq!(cp.len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_separator() {
        assert_eq!(CLASSPATH_SEPARATOR, ":");
    }

    #[cfg(windows)]
    #[test]
    fn test_windows_separator() {
        assert_eq!(CLASSPATH_SEPARATOR, ";");
    }
}
