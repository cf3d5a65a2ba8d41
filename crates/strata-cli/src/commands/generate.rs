//! `strata generate`: compose a template and write the project.

use serde_json::json;
use tracing::{info, instrument, warn};

use strata_adapters::{
    DirectoryCacheStore, LocalFilesystem, RetryingSource, StrategyResolver, read_existing_project,
};
use strata_core::application::{
    ConflictResolver, GenerateRequest, GenerationOutcome, ProjectGenerator, ResultWriter,
    WriteMode, WriteSummary,
};

use crate::{
    cli::{GenerateArgs, GlobalArgs, StrategyArg},
    commands::template,
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Generate a project from a template.
#[instrument(skip_all, fields(template = %args.template.template, dest = %args.dest.display()))]
pub fn execute(
    args: GenerateArgs,
    _global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let dest_exists = args.dest.exists();
    if dest_exists && !args.upgrade && !args.force && !args.dry_run {
        return Err(CliError::ProjectExists {
            path: args.dest.clone(),
        });
    }
    if args.upgrade && !dest_exists {
        return Err(CliError::InvalidInput {
            message: format!(
                "--upgrade needs an existing project, '{}' does not exist",
                args.dest.display()
            ),
            source: None,
        });
    }

    let loaded = template::load(&args.template, &config)?;
    let answers = template::answer_provider(&args.template)?;
    let strategy = args
        .strategy
        .unwrap_or_else(|| StrategyArg::from(config.generate.strategy));
    let resolver = conflict_resolver(strategy, args.template.yes)?;
    let interactive = strategy == StrategyArg::Prompt || template::can_prompt(args.template.yes);

    let existing = if args.upgrade {
        Some(read_existing_project(&args.dest)?)
    } else {
        None
    };

    let locator = loaded.locator();
    let options = config.generator_options(args.no_cache);
    let mut generator = ProjectGenerator::new(
        Box::new(RetryingSource::new(loaded.source)),
        answers,
        resolver,
    )
    .with_options(options.clone());

    if options.use_cache {
        match config.cache_dir() {
            Some(dir) => generator = generator.with_cache(Box::new(DirectoryCacheStore::new(dir))),
            None => warn!("No cache directory available, running without patch cache"),
        }
    }

    // Prompts and a spinner would fight over the terminal.
    let progress = (!interactive).then(|| output.progress());
    if let Some(progress) = &progress {
        generator = generator.with_observer(Box::new(progress.clone()));
    }

    let outcome = generator.generate(
        &loaded.config,
        GenerateRequest {
            locator,
            components: args.template.components.clone(),
            existing,
        },
    );
    if let Some(progress) = &progress {
        progress.finish();
    }
    let outcome = outcome?;

    for warning in outcome.warnings() {
        output.warning(&format!(
            "{} (block {}): {}",
            warning.path, warning.block_index, warning.message
        ))?;
    }

    if args.dry_run {
        report_dry_run(&outcome, &output)?;
        return conflicts_to_error(&outcome);
    }

    let mode = if dest_exists {
        WriteMode::Update
    } else {
        WriteMode::Create
    };
    let summary = ResultWriter::new(Box::new(LocalFilesystem::new())).write(
        &outcome.result,
        &args.dest,
        mode,
    )?;
    info!(files = summary.files, conflicted = summary.conflicted, "Project written");

    report_written(&outcome, &summary, &output)?;
    conflicts_to_error(&outcome)
}

fn conflict_resolver(strategy: StrategyArg, yes: bool) -> CliResult<Box<dyn ConflictResolver>> {
    if let Some(scripted) = strategy.scripted() {
        return Ok(Box::new(StrategyResolver::new(scripted)));
    }
    prompt_resolver(yes)
}

#[cfg(feature = "interactive")]
fn prompt_resolver(yes: bool) -> CliResult<Box<dyn ConflictResolver>> {
    use std::io::IsTerminal as _;

    if yes || !std::io::stdin().is_terminal() {
        return Err(CliError::InvalidInput {
            message: "--strategy prompt needs an interactive terminal".into(),
            source: None,
        });
    }
    Ok(Box::new(crate::interactive::PromptResolver))
}

#[cfg(not(feature = "interactive"))]
fn prompt_resolver(_yes: bool) -> CliResult<Box<dyn ConflictResolver>> {
    Err(CliError::FeatureNotAvailable {
        feature: "interactive",
    })
}

fn conflicts_to_error(outcome: &GenerationOutcome) -> CliResult<()> {
    if outcome.result.has_conflicts() {
        return Err(CliError::UnresolvedConflicts {
            paths: outcome.result.conflicts.clone(),
        });
    }
    Ok(())
}

fn report_dry_run(outcome: &GenerationOutcome, output: &OutputManager) -> CliResult<()> {
    output.json(&json!({
        "dry_run": true,
        "job_id": outcome.job_id,
        "layers": layer_labels(outcome),
        "files": outcome.result.files.keys().collect::<Vec<_>>(),
        "conflicts": outcome.result.conflicts,
    }))?;

    output.header("Dry run: nothing written")?;
    output.print(&format!("Layers: {}", layer_labels(outcome).join(" → ")))?;
    for (path, content) in &outcome.result.files {
        let mark = if outcome.result.conflicts.contains(path) {
            " (conflict)"
        } else {
            ""
        };
        output.print(&format!("  {path}  {} bytes{mark}", content.as_bytes().len()))?;
    }
    Ok(())
}

fn report_written(
    outcome: &GenerationOutcome,
    summary: &WriteSummary,
    output: &OutputManager,
) -> CliResult<()> {
    output.json(&json!({
        "job_id": outcome.job_id,
        "root": summary.root,
        "files": summary.files,
        "conflicts": outcome.result.conflicts,
        "layers": outcome.layers.iter().map(|l| json!({
            "label": l.label,
            "written": l.written,
            "merged": l.merged,
            "skipped": l.skipped,
            "deleted": l.deleted,
        })).collect::<Vec<_>>(),
        "resolution": {
            "presented": outcome.resolution.presented,
            "resolved": outcome.resolution.resolved,
            "ignored": outcome.resolution.ignored,
            "left_open": outcome.resolution.left_open,
        },
        "cache": { "hits": outcome.cache_hits, "misses": outcome.cache_misses },
        "fetch_ms": u64::try_from(outcome.fetch_time.as_millis()).unwrap_or(u64::MAX),
    }))?;

    output.success(&format!(
        "Wrote {} files to {}",
        summary.files,
        summary.root.display()
    ))?;
    for layer in &outcome.layers {
        output.print(&format!(
            "  {:<24} {} written, {} merged, {} skipped",
            layer.label, layer.written, layer.merged, layer.skipped
        ))?;
    }
    if outcome.resolution.presented > 0 {
        output.info(&format!(
            "{} conflict(s): {} resolved, {} ignored, {} left open",
            outcome.resolution.presented,
            outcome.resolution.resolved,
            outcome.resolution.ignored,
            outcome.resolution.left_open
        ))?;
    }
    if outcome.cache_hits + outcome.cache_misses > 0 {
        output.info(&format!(
            "Patch cache: {} hit(s), {} miss(es)",
            outcome.cache_hits, outcome.cache_misses
        ))?;
    }
    Ok(())
}

fn layer_labels(outcome: &GenerationOutcome) -> Vec<&str> {
    outcome.layers.iter().map(|l| l.label.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_adapters::ResolverStrategy;

    #[test]
    fn scripted_strategies_never_need_a_terminal() {
        for strategy in [
            StrategyArg::KeepCurrent,
            StrategyArg::KeepFormer,
            StrategyArg::IgnoreAll,
            StrategyArg::LeaveUnresolved,
        ] {
            assert!(conflict_resolver(strategy, true).is_ok());
        }
    }

    #[cfg(feature = "interactive")]
    #[test]
    fn prompt_with_yes_is_rejected() {
        let err = conflict_resolver(StrategyArg::Prompt, true).err().unwrap();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn configured_strategy_maps_to_flag() {
        assert_eq!(
            StrategyArg::from(ResolverStrategy::KeepFormer),
            StrategyArg::KeepFormer
        );
        assert_eq!(
            StrategyArg::from(ResolverStrategy::default()),
            StrategyArg::LeaveUnresolved
        );
    }
}
