//! Template lookup and answer collection shared by `generate` and `plan`.

use std::io::IsTerminal as _;
use std::path::PathBuf;

use tracing::debug;

use strata_adapters::{DirectoryLayerSource, ManifestLoader, StaticAnswers};
use strata_core::{
    application::AnswerProvider,
    domain::{Props, TemplateConfig},
    error::StrataError,
};

use crate::{
    cli::TemplateArgs,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
};

/// A template directory with its parsed manifest.
pub struct LoadedTemplate {
    pub dir: PathBuf,
    pub description: Option<String>,
    pub config: TemplateConfig,
    pub source: DirectoryLayerSource,
}

impl LoadedTemplate {
    /// Locator handed to the layer source; always the resolved directory.
    pub fn locator(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Find the template named by `args` and read its manifest.
pub fn load(args: &TemplateArgs, config: &AppConfig) -> CliResult<LoadedTemplate> {
    let source = config
        .generate
        .template_paths
        .iter()
        .fold(DirectoryLayerSource::new(), |source, dir| {
            source.with_search_path(dir)
        });

    let dir = source
        .resolve(&args.template)
        .ok_or_else(|| CliError::TemplateNotFound {
            locator: args.template.clone(),
        })?;
    debug!(dir = %dir.display(), "Template resolved");

    let manifest = ManifestLoader::read(&dir)?;
    let description = manifest.description.clone();
    let template = manifest
        .into_config()
        .map_err(|e| CliError::Core(StrataError::from(e)))?;

    Ok(LoadedTemplate {
        dir,
        description,
        config: template,
        source,
    })
}

/// Answers given up front: the answers file, then `--answer` flags.
pub fn preset_answers(args: &TemplateArgs) -> CliResult<Props> {
    let base = match &args.answers_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_cli_context(|| format!("Failed to read answers file '{}'", path.display()))?;
            StaticAnswers::from_json(&text)?
        }
        None => StaticAnswers::default(),
    };
    Ok(base.with_assignments(&args.answers)?.values().clone())
}

/// Whether prompts can be shown at all.
pub fn can_prompt(yes: bool) -> bool {
    !yes && cfg!(feature = "interactive") && std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

/// Prompt for missing answers when possible, otherwise use defaults.
pub fn answer_provider(args: &TemplateArgs) -> CliResult<Box<dyn AnswerProvider>> {
    let preset = preset_answers(args)?;
    Ok(provider(preset, can_prompt(args.yes)))
}

#[cfg(feature = "interactive")]
fn provider(preset: Props, prompt: bool) -> Box<dyn AnswerProvider> {
    if prompt {
        Box::new(crate::interactive::PromptAnswers::new(preset))
    } else {
        Box::new(StaticAnswers::new(preset))
    }
}

#[cfg(not(feature = "interactive"))]
fn provider(preset: Props, _prompt: bool) -> Box<dyn AnswerProvider> {
    Box::new(StaticAnswers::new(preset))
}
