//! Finding the Java runtime to launch

use std::path::{Path, PathBuf};

use tracing::debug;

/// Source of the runtime home directory used to find the interpreter.
///
/// A home is the directory that contains `java` directly or in `bin/`.
pub trait RuntimeLocator: Send + Sync {
    /// The runtime home, or `None` if it cannot be determined.
    fn runtime_home(&self) -> Option<PathBuf>;
}

/// Locator that resolves, in order:
/// 1) an explicit override
/// 2) env `JAVA_HOME`
/// 3) the installation owning the `java` found on `PATH`
#[derive(Debug, Clone, Default)]
pub struct JavaHomeLocator {
    home_override: Option<PathBuf>,
}

impl JavaHomeLocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `home` instead of anything found in the environment.
    #[must_use]
    pub fn with_override(home: impl Into<PathBuf>) -> Self {
        Self {
            home_override: Some(home.into()),
        }
    }
}

impl RuntimeLocator for JavaHomeLocator {
    fn runtime_home(&self) -> Option<PathBuf> {
        if let Some(home) = &self.home_override {
            return Some(home.clone());
        }
        if let Some(home) = std::env::var_os("JAVA_HOME").filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(home));
        }
        let java = which::which(interpreter_name()).ok()?;
        // Follow /usr/bin/java style links to the real installation.
        let java = std::fs::canonicalize(&java).unwrap_or(java);
        let home = java.parent()?.parent()?.to_path_buf();
        debug!(home = %home.display(), "Runtime home derived from PATH");
        Some(home)
    }
}

/// Locator returning one fixed directory.
#[derive(Debug, Clone)]
pub struct FixedHomeLocator(pub PathBuf);

impl FixedHomeLocator {
    #[must_use]
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self(home.into())
    }
}

impl RuntimeLocator for FixedHomeLocator {
    fn runtime_home(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

/// File name of the Java interpreter on this platform.
#[must_use]
pub fn interpreter_name() -> String {
    format!("java{}", std::env::consts::EXE_SUFFIX)
}

/// `<home>/java`, else `<home>/bin/java`, whichever exists first.
pub(crate) fn resolve_interpreter(home: &Path) -> Option<PathBuf> {
    let name = interpreter_name();
    [home.join(&name), home.join("bin").join(&name)]
        .into_iter()
        .find(|candidate| candidate.is_file())
}
