//! `strata config`: read and write configuration values.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{
    cli::{ConfigCommands, GlobalArgs},
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Dispatch to the correct config subcommand.
pub fn execute(
    cmd: ConfigCommands,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    match cmd {
        ConfigCommands::Get { key } => {
            let value = get_config_value(&config, &key)?;
            output.print(&value)?;
        }

        ConfigCommands::Set { key, value } => {
            let path = file_path(&global);
            set_config_value(&path, &key, &value)?;
            output.success(&format!("Set {key} = {value} in {}", path.display()))?;
        }

        ConfigCommands::List => {
            output.header("Current Configuration:")?;
            let serialised = toml::to_string_pretty(&config)
                .map_err(|e| config_error("Failed to serialise config", e))?;
            output.print(&serialised)?;
        }

        ConfigCommands::Path => {
            output.print(&file_path(&global).display().to_string())?;
        }
    }

    Ok(())
}

// ── helpers ───────────────────────────────────────────────────────────────────

fn file_path(global: &GlobalArgs) -> PathBuf {
    global.config.clone().unwrap_or_else(AppConfig::config_path)
}

fn config_error(message: &str, e: impl std::error::Error + Send + Sync + 'static) -> CliError {
    CliError::ConfigError {
        message: format!("{message}: {e}"),
        source: Some(Box::new(e)),
    }
}

fn unknown_key(key: &str) -> CliError {
    CliError::ConfigError {
        message: format!("Unknown config key: '{key}'"),
        source: None,
    }
}

/// Look up a dotted key in the effective configuration.
fn get_config_value(config: &AppConfig, key: &str) -> CliResult<String> {
    let tree = serde_json::to_value(config)
        .map_err(|e| config_error("Failed to serialise config", e))?;
    let pointer = format!("/{}", key.replace('.', "/"));

    match tree.pointer(&pointer) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) => Ok(String::new()),
        Some(other) => Ok(other.to_string()),
        None => Err(unknown_key(key)),
    }
}

/// Update one key in the file at `path`, keeping everything else in it.
///
/// The edited file must still deserialise into [`AppConfig`], so unknown
/// keys and mistyped values are rejected before anything is written.
fn set_config_value(path: &Path, key: &str, raw: &str) -> CliResult<()> {
    let mut table = if path.exists() {
        let text = std::fs::read_to_string(path)
            .with_cli_context(|| format!("Failed to read config '{}'", path.display()))?;
        text.parse::<toml::Table>()
            .map_err(|e| config_error("Failed to parse config", e))?
    } else {
        toml::Table::new()
    };

    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (parents.split('.').collect::<Vec<_>>(), leaf),
        None => (Vec::new(), key),
    };

    let mut node = &mut table;
    for part in parents {
        let entry = node
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        node = match entry {
            toml::Value::Table(t) => t,
            _ => return Err(unknown_key(key)),
        };
    }
    node.insert(leaf.to_string(), parse_value(raw));

    toml::Value::Table(table.clone())
        .try_into::<AppConfig>()
        .map_err(|e| config_error(&format!("Invalid value for '{key}'"), e))?;

    let text = toml::to_string_pretty(&table)
        .map_err(|e| config_error("Failed to serialise config", e))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_cli_context(|| {
            format!("Failed to create config directory '{}'", parent.display())
        })?;
    }
    std::fs::write(path, text)
        .with_cli_context(|| format!("Failed to write config to '{}'", path.display()))
}

/// TOML literal when it parses (`true`, `3`, `["a"]`), a string otherwise.
fn parse_value(raw: &str) -> toml::Value {
    format!("v = {raw}")
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn get_known_key() {
        let cfg = AppConfig::default();
        assert_eq!(
            get_config_value(&cfg, "generate.strategy").unwrap(),
            "leave-unresolved"
        );
    }

    #[test]
    fn get_unknown_key_is_error() {
        let cfg = AppConfig::default();
        assert!(matches!(
            get_config_value(&cfg, "does.not.exist"),
            Err(CliError::ConfigError { .. })
        ));
    }

    #[test]
    fn get_no_color_default() {
        let cfg = AppConfig::default();
        assert_eq!(get_config_value(&cfg, "output.no_color").unwrap(), "false");
    }

    #[test]
    fn set_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[loader]\nmax_retries = 7\n").unwrap();

        set_config_value(&path, "generate.use_cache", "false").unwrap();

        let cfg: AppConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(!cfg.generate.use_cache);
        assert_eq!(cfg.loader.max_retries, 7);
    }

    #[test]
    fn set_accepts_bare_strings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        set_config_value(&path, "generate.strategy", "keep-current").unwrap();

        let cfg: AppConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            cfg.generate.strategy,
            strata_adapters::ResolverStrategy::KeepCurrent
        );
    }

    #[test]
    fn set_rejects_unknown_keys_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let err = set_config_value(&path, "generate.colour", "red").unwrap_err();

        assert!(matches!(err, CliError::ConfigError { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn set_rejects_mistyped_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(set_config_value(&path, "loader.max_retries", "many").is_err());
    }
}
