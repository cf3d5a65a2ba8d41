//! `strata init`: write a configuration file with every default spelled out.

use std::path::PathBuf;

use crate::{
    cli::{GlobalArgs, InitArgs},
    config::{AppConfig, LOCAL_CONFIG_FILE},
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

/// Create a default configuration file.
pub fn execute(
    args: InitArgs,
    global: GlobalArgs,
    _config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let config_path = target_path(&args, &global);

    if config_path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {}  (use --force to overwrite)",
            config_path.display(),
        ))?;
        return Ok(());
    }

    let toml = default_toml()?;

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_cli_context(|| {
            format!("Failed to create config directory '{}'", parent.display())
        })?;
    }

    std::fs::write(&config_path, &toml)
        .with_cli_context(|| format!("Failed to write config to '{}'", config_path.display()))?;

    output.success(&format!("Configuration created at {}", config_path.display()))?;
    Ok(())
}

fn target_path(args: &InitArgs, global: &GlobalArgs) -> PathBuf {
    if args.local {
        PathBuf::from(LOCAL_CONFIG_FILE)
    } else {
        global.config.clone().unwrap_or_else(AppConfig::config_path)
    }
}

fn default_toml() -> CliResult<String> {
    toml::to_string_pretty(&AppConfig::default()).map_err(|e| CliError::ConfigError {
        message: format!("Failed to serialise default config: {e}"),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_parses_back() {
        let text = default_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();

        assert_eq!(
            parsed.generate.max_composition_passes,
            AppConfig::default().generate.max_composition_passes
        );
        assert!(text.contains("[generate]"));
        assert!(text.contains("[loader]"));
    }

    #[test]
    fn local_flag_targets_working_directory() {
        let args = InitArgs {
            local: true,
            force: false,
        };
        let global = GlobalArgs {
            config: Some(PathBuf::from("/elsewhere.toml")),
            ..GlobalArgs::default()
        };

        assert_eq!(target_path(&args, &global), PathBuf::from(LOCAL_CONFIG_FILE));
    }

    #[test]
    fn explicit_config_path_wins_over_platform_default() {
        let args = InitArgs {
            local: false,
            force: false,
        };
        let global = GlobalArgs {
            config: Some(PathBuf::from("/elsewhere.toml")),
            ..GlobalArgs::default()
        };

        assert_eq!(target_path(&args, &global), PathBuf::from("/elsewhere.toml"));
    }
}
