//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. `STRATA_*` environment variables, `__` between sections
//!    (`STRATA_LOADER__MAX_RETRIES=5`)
//! 3. `.strata.toml` in the current directory
//! 4. The config file (`--config`, or the platform default)
//! 5. Built-in defaults (always present)

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use strata_adapters::ResolverStrategy;
use strata_core::application::{FetchOptions, GeneratorOptions, services::DEFAULT_MAX_PASSES};

/// File name of a project-local config.
pub const LOCAL_CONFIG_FILE: &str = ".strata.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub generate: GenerateConfig,
    pub loader: LoaderConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    /// Conflict strategy when `--strategy` is not given.
    pub strategy: ResolverStrategy,
    pub use_cache: bool,
    /// Patch cache location; the platform cache directory when unset.
    pub cache_dir: Option<PathBuf>,
    pub max_composition_passes: usize,
    /// Directories searched for templates given by name.
    pub template_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub max_retries: u32,
    pub timeout_secs: u64,
    /// e.g. `http://proxy.internal:3128`
    pub proxy_url: Option<String>,
    /// `user:password` for the proxy.
    pub proxy_auth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            strategy: ResolverStrategy::LeaveUnresolved,
            use_cache: true,
            cache_dir: None,
            max_composition_passes: DEFAULT_MAX_PASSES,
            template_paths: Vec::new(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let fetch = FetchOptions::default();
        Self {
            max_retries: fetch.max_retries,
            timeout_secs: fetch.timeout.as_secs(),
            proxy_url: None,
            proxy_auth: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            no_color: false,
            format: "human".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// `config_file` is the path the user passed via `--config`; it must
    /// exist. Without it the platform default is read if present.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.clone(), true),
            None => (Self::config_path(), false),
        };
        Self::load_from(&path, required, Path::new(LOCAL_CONFIG_FILE), "STRATA")
    }

    fn load_from(
        path: &Path,
        required: bool,
        local: &Path,
        env_prefix: &str,
    ) -> anyhow::Result<Self> {
        let defaults = Config::try_from(&Self::default()).context("Invalid built-in defaults")?;

        Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).required(required))
            .add_source(File::from(local).required(false))
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.strata.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "strata", "strata")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE))
    }

    /// Where patch diffs are cached, if anywhere.
    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.generate.cache_dir.clone().or_else(|| {
            directories::ProjectDirs::from("com", "strata", "strata")
                .map(|d| d.cache_dir().join("patches"))
        })
    }

    pub fn fetch_options(&self) -> FetchOptions {
        let proxy = self.loader.proxy_url.as_ref().map(|url| match &self.loader.proxy_auth {
            Some(auth) => with_credentials(url, auth),
            None => url.clone(),
        });
        FetchOptions {
            timeout: std::time::Duration::from_secs(self.loader.timeout_secs),
            max_retries: self.loader.max_retries,
            proxy,
        }
    }

    pub fn generator_options(&self, no_cache: bool) -> GeneratorOptions {
        GeneratorOptions {
            max_composition_passes: self.generate.max_composition_passes,
            use_cache: self.generate.use_cache && !no_cache,
            fetch: self.fetch_options(),
        }
    }
}

/// `http://host:3128` + `user:pw` → `http://user:pw@host:3128`
fn with_credentials(url: &str, auth: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => format!("{scheme}://{auth}@{rest}"),
        None => format!("{auth}@{url}"),
    }
}
