//! Layered configuration
//!
//! Precedence, highest first: programmatic overrides > environment
//! (`CLYZE_JAVA_HOME`, `CLYZE_DEBUG`) > `.clyze/config.toml` > built-in
//! defaults. Every key remembers which layer set it.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use clyze_encoding::{DEFAULT_CHUNK_SIZE, EncodingNormalizer};
use clyze_runner::{Echo, JavaHomeLocator, JvmLauncher, NativeRunner};

/// Environment variable naming the Java runtime home.
pub const ENV_JAVA_HOME: &str = "CLYZE_JAVA_HOME";
/// Environment variable turning on launch diagnostics.
pub const ENV_DEBUG: &str = "CLYZE_DEBUG";

const CONFIG_DIR: &str = ".clyze";
const CONFIG_FILE: &str = "config.toml";

/// Where the tagged output of child processes goes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EchoMode {
    #[default]
    Stdout,
    Stderr,
    Silent,
}

impl EchoMode {
    #[must_use]
    pub fn echo(self) -> Echo {
        match self {
            Self::Stdout => Echo::stdout(),
            Self::Stderr => Echo::stderr(),
            Self::Silent => Echo::silent(),
        }
    }
}

/// `[runtime]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub java_home: Option<PathBuf>,
    pub jvm_args: Option<Vec<String>>,
}

/// `[output]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub debug: Option<bool>,
    pub echo: Option<EchoMode>,
}

/// `[encoding]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingConfig {
    pub chunk_size: Option<usize>,
    pub sample_limit: Option<u64>,
}

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
struct TomlConfig {
    runtime: Option<RuntimeConfig>,
    output: Option<OutputConfig>,
    encoding: Option<EncodingConfig>,
}

/// Which layer a configuration value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Programmatic,
    Environment(&'static str),
    ConfigFile(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Programmatic => write!(f, "programmatic"),
            Self::Environment(var) => write!(f, "environment ({var})"),
            Self::ConfigFile(path) => write!(f, "config file ({})", path.display()),
            Self::Defaults => write!(f, "defaults"),
        }
    }
}

/// Values set in code; they win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Load this file instead of discovering one
    pub config_path: Option<PathBuf>,
    pub java_home: Option<PathBuf>,
    pub jvm_args: Option<Vec<String>>,
    pub debug: Option<bool>,
    pub echo: Option<EchoMode>,
    pub chunk_size: Option<usize>,
    pub sample_limit: Option<u64>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub output: OutputConfig,
    pub encoding: EncodingConfig,
    source_attribution: HashMap<String, ConfigSource>,
}

impl Default for Config {
    fn default() -> Self {
        let mut source_attribution = HashMap::new();
        for key in ["jvm_args", "debug", "echo", "chunk_size"] {
            source_attribution.insert(key.to_string(), ConfigSource::Defaults);
        }
        Self {
            runtime: RuntimeConfig {
                java_home: None,
                jvm_args: Some(Vec::new()),
            },
            output: OutputConfig {
                debug: Some(false),
                echo: Some(EchoMode::Stdout),
            },
            encoding: EncodingConfig {
                chunk_size: Some(DEFAULT_CHUNK_SIZE),
                sample_limit: None,
            },
            source_attribution,
        }
    }
}

impl Config {
    /// Discover and load configuration starting from the current directory.
    ///
    /// # Errors
    ///
    /// Fails if the current directory is unavailable, the config file cannot
    /// be parsed, an environment value is malformed, or validation fails.
    pub fn discover(overrides: &ConfigOverrides) -> Result<Self> {
        let start_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, overrides)
    }

    /// Discover and load configuration starting from `start_dir`.
    ///
    /// # Errors
    ///
    /// See [`discover`](Self::discover).
    pub fn discover_from(start_dir: &Path, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = Self::default();

        let config_path = match &overrides.config_path {
            Some(explicit) => Some(explicit.clone()),
            None => Self::discover_config_file_from(start_dir)?,
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            config.apply_file(file_config, &ConfigSource::ConfigFile(path.clone()));
            debug!(path = %path.display(), "Loaded config file");
        }

        config.apply_env()?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Find `.clyze/config.toml` in `start_dir` or its ancestors, stopping at
    /// a repository root. `Ok(None)` when there is none.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir;

        loop {
            let config_path = current_dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if config_path.is_file() {
                return Ok(Some(config_path));
            }

            if [".git", ".hg", ".svn"]
                .iter()
                .any(|marker| current_dir.join(marker).exists())
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent,
                None => break,
            }
        }

        Ok(None)
    }

    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))
    }

    fn apply_file(&mut self, file: TomlConfig, source: &ConfigSource) {
        if let Some(runtime) = file.runtime {
            if runtime.java_home.is_some() {
                self.runtime.java_home = runtime.java_home;
                self.attribute("java_home", source.clone());
            }
            if runtime.jvm_args.is_some() {
                self.runtime.jvm_args = runtime.jvm_args;
                self.attribute("jvm_args", source.clone());
            }
        }
        if let Some(output) = file.output {
            if output.debug.is_some() {
                self.output.debug = output.debug;
                self.attribute("debug", source.clone());
            }
            if output.echo.is_some() {
                self.output.echo = output.echo;
                self.attribute("echo", source.clone());
            }
        }
        if let Some(encoding) = file.encoding {
            if encoding.chunk_size.is_some() {
                self.encoding.chunk_size = encoding.chunk_size;
                self.attribute("chunk_size", source.clone());
            }
            if encoding.sample_limit.is_some() {
                self.encoding.sample_limit = encoding.sample_limit;
                self.attribute("sample_limit", source.clone());
            }
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(home) = std::env::var_os(ENV_JAVA_HOME).filter(|v| !v.is_empty()) {
            self.runtime.java_home = Some(PathBuf::from(home));
            self.attribute("java_home", ConfigSource::Environment(ENV_JAVA_HOME));
        }
        if let Ok(raw) = std::env::var(ENV_DEBUG) {
            let debug = parse_bool(&raw)
                .with_context(|| format!("Invalid value for {ENV_DEBUG}: '{raw}'"))?;
            self.output.debug = Some(debug);
            self.attribute("debug", ConfigSource::Environment(ENV_DEBUG));
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        let source = ConfigSource::Programmatic;
        if let Some(home) = &overrides.java_home {
            self.runtime.java_home = Some(home.clone());
            self.attribute("java_home", source.clone());
        }
        if let Some(args) = &overrides.jvm_args {
            self.runtime.jvm_args = Some(args.clone());
            self.attribute("jvm_args", source.clone());
        }
        if let Some(debug) = overrides.debug {
            self.output.debug = Some(debug);
            self.attribute("debug", source.clone());
        }
        if let Some(echo) = overrides.echo {
            self.output.echo = Some(echo);
            self.attribute("echo", source.clone());
        }
        if let Some(chunk_size) = overrides.chunk_size {
            self.encoding.chunk_size = Some(chunk_size);
            self.attribute("chunk_size", source.clone());
        }
        if let Some(limit) = overrides.sample_limit {
            self.encoding.sample_limit = Some(limit);
            self.attribute("sample_limit", source);
        }
    }

    fn attribute(&mut self, key: &str, source: ConfigSource) {
        self.source_attribution.insert(key.to_string(), source);
    }

    fn validate(&self) -> Result<()> {
        if self.encoding.chunk_size == Some(0) {
            bail!("Invalid configuration: chunk_size must be greater than 0");
        }
        if self.encoding.sample_limit == Some(0) {
            bail!("Invalid configuration: sample_limit must be greater than 0");
        }
        if let Some(home) = &self.runtime.java_home
            && home.as_os_str().is_empty()
        {
            bail!("Invalid configuration: java_home must not be empty");
        }
        Ok(())
    }

    /// The layer that set `key`, if any.
    #[must_use]
    pub fn source_of(&self, key: &str) -> Option<&ConfigSource> {
        self.source_attribution.get(key)
    }

    #[must_use]
    pub fn debug(&self) -> bool {
        self.output.debug.unwrap_or(false)
    }

    #[must_use]
    pub fn echo_mode(&self) -> EchoMode {
        self.output.echo.unwrap_or_default()
    }

    #[must_use]
    pub fn jvm_args(&self) -> &[String] {
        self.runtime.jvm_args.as_deref().unwrap_or_default()
    }

    /// A launcher honoring `java_home`, `jvm_args` and `echo`.
    #[must_use]
    pub fn launcher(&self) -> JvmLauncher<NativeRunner> {
        let locator = match &self.runtime.java_home {
            Some(home) => JavaHomeLocator::with_override(home),
            None => JavaHomeLocator::new(),
        };
        JvmLauncher::with_runner(NativeRunner::with_echo(self.echo_mode().echo()))
            .with_locator(locator)
            .with_jvm_args(self.jvm_args().iter().cloned())
    }

    /// A normalizer honoring the `[encoding]` section.
    #[must_use]
    pub fn normalizer(&self) -> EncodingNormalizer {
        EncodingNormalizer::new()
            .with_chunk_size(self.encoding.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE))
            .with_sample_limit(self.encoding.sample_limit)
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected a boolean, got '{other}'"),
    }
}
