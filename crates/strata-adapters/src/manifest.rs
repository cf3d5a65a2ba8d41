//! `template.toml` manifests.
//!
//! Parses the manifest at the root of a template directory into a
//! [`TemplateConfig`]. The file trees themselves are staged by
//! [`DirectoryLayerSource`](crate::source::DirectoryLayerSource).
//!
//! # `template.toml` format
//!
//! ```toml
//! name        = "web-app"
//! description = "Node web application"    # optional
//!
//! [[questions]]
//! name    = "lang"
//! message = "Language?"
//! kind    = "select"                       # input | confirm | select | multi-select
//! choices = ["__template.typescript", "javascript"]
//! default = "javascript"
//!
//! [files]
//! merge  = ["*.json", ".gitignore"]        # merged line by line
//! delete = ["*.tmp"]                       # removed after this layer
//!
//! [[extends]]
//! label = "typescript"                     # files under extends/typescript/
//! when  = { type = "selected" }            # selected | equals | truthy | always
//!
//! [extends.files]
//! merge = ["tsconfig.json"]
//!
//! [[components]]
//! name   = "docker"                        # files under components/docker/
//! alias  = { "compose.yml" = "deploy/compose.yml" }
//! delete = ["docker/*.example"]
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;
use tracing::{debug, instrument};

use strata_core::{
    application::LoadError,
    domain::{
        ComponentConfig, Condition, DeleteRule, DomainError, ExtendTemplate, FileRules,
        LayerRules, Question, TemplateConfig,
    },
    error::StrataResult,
};

/// File name of the manifest inside a template directory.
pub const MANIFEST_FILE: &str = "template.toml";

// ── Manifest types ────────────────────────────────────────────────────────────

/// Deserialised representation of a `template.toml` file.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct TemplateManifest {
    pub name: String,
    pub description: Option<String>,
    /// Root questions, asked before any extension is activated.
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub files: FilesSection,
    /// Extension templates in declaration order.
    #[serde(default)]
    pub extends: Vec<ExtendEntry>,
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
}

/// `[files]` section.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct FilesSection {
    #[serde(default)]
    pub merge: Vec<String>,
    #[serde(default)]
    pub delete: Vec<String>,
}

impl FilesSection {
    fn into_rules(self) -> FileRules {
        FileRules {
            merge: self.merge,
            delete: self.delete.into_iter().map(DeleteRule::Pattern).collect(),
        }
    }
}

/// One entry under `[[extends]]`.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ExtendEntry {
    pub label: String,
    #[serde(default)]
    pub when: Condition,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub files: FilesSection,
}

/// One entry under `[[components]]`.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ComponentEntry {
    pub name: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Source path (file or directory) to destination path.
    #[serde(default)]
    pub alias: BTreeMap<String, String>,
    #[serde(default)]
    pub delete: Vec<String>,
}

impl TemplateManifest {
    /// Convert into a validated [`TemplateConfig`].
    ///
    /// # Errors
    ///
    /// Whatever [`TemplateConfig::validate`] reports.
    pub fn into_config(self) -> Result<TemplateConfig, DomainError> {
        let config = TemplateConfig {
            name: self.name,
            rules: LayerRules {
                questions: self.questions,
                files: self.files.into_rules(),
                cleanups: Vec::new(),
            },
            extend_templates: self
                .extends
                .into_iter()
                .map(|entry| ExtendTemplate {
                    label: entry.label,
                    when: entry.when,
                    rules: LayerRules {
                        questions: entry.questions,
                        files: entry.files.into_rules(),
                        cleanups: Vec::new(),
                    },
                })
                .collect(),
            components: self
                .components
                .into_iter()
                .map(|entry| ComponentConfig {
                    name: entry.name,
                    questions: entry.questions,
                    alias: entry.alias,
                    delete: entry.delete.into_iter().map(DeleteRule::Pattern).collect(),
                })
                .collect(),
        };
        config.validate()?;
        Ok(config)
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Reads `template.toml` manifests.
pub struct ManifestLoader;

impl ManifestLoader {
    /// Parse manifest text.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidTemplate`] for malformed TOML or unknown keys.
    pub fn parse(text: &str) -> StrataResult<TemplateManifest> {
        toml::from_str(text)
            .map_err(|e| DomainError::InvalidTemplate(format!("{MANIFEST_FILE}: {e}")).into())
    }

    /// Read the manifest of the template directory `dir`.
    ///
    /// # Errors
    ///
    /// - `LoadError::NotFound` when `dir` has no manifest
    /// - `LoadError::Other` when it cannot be read
    /// - [`DomainError::InvalidTemplate`] when it does not parse
    #[instrument(fields(dir = %dir.display()))]
    pub fn read(dir: &Path) -> StrataResult<TemplateManifest> {
        let path = dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(LoadError::NotFound {
                locator: path.display().to_string(),
            }
            .into());
        }

        let text = fs::read_to_string(&path).map_err(|e| LoadError::Other {
            locator: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let manifest = Self::parse(&text)?;
        debug!(
            name = %manifest.name,
            extends = manifest.extends.len(),
            components = manifest.components.len(),
            "Manifest parsed"
        );
        Ok(manifest)
    }

    /// Read and convert the manifest of `dir`.
    pub fn load(dir: &Path) -> StrataResult<TemplateConfig> {
        Ok(Self::read(dir)?.into_config()?)
    }
}
