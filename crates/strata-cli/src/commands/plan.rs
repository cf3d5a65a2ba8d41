//! `strata plan`: show the layer stack a set of answers would produce.

use serde_json::json;
use tracing::instrument;

use strata_core::application::TemplateComposer;

use crate::{
    cli::{GlobalArgs, PlanArgs},
    commands::template,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

/// Compose the template without fetching or writing anything.
#[instrument(skip_all, fields(template = %args.template.template))]
pub fn execute(
    args: PlanArgs,
    _global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let loaded = template::load(&args.template, &config)?;
    let answers = template::answer_provider(&args.template)?;

    let composition = TemplateComposer::new(answers.as_ref())
        .with_max_passes(config.generate.max_composition_passes)
        .compose(&loaded.config, &args.template.components)?;

    let labels = composition.labels();
    let merge = loaded.config.merge_patterns();
    let components: Vec<&str> = loaded
        .config
        .components
        .iter()
        .map(|c| c.name.as_str())
        .collect();

    output.json(&json!({
        "template": loaded.config.name,
        "description": loaded.description,
        "layers": labels,
        "passes": composition.passes,
        "answers": composition.props.props,
        "merge": merge,
        "components": components,
    }))?;

    output.header(&format!("Template: {}", loaded.config.name))?;
    if let Some(description) = &loaded.description {
        output.print(description)?;
    }
    output.print("")?;
    output.print(&format!("Layers ({} pass(es)):", composition.passes))?;
    for (i, label) in labels.iter().enumerate() {
        output.print(&format!("  {}. {label}", i + 1))?;
    }
    if !merge.is_empty() {
        output.print(&format!("Merged paths: {}", merge.join(", ")))?;
    }
    if !components.is_empty() {
        output.print("Components:")?;
        for name in &components {
            let mark = if args.template.components.iter().any(|c| c == name) {
                "*"
            } else {
                " "
            };
            output.print(&format!("  {mark} {name}"))?;
        }
    }
    if !composition.props.props.is_empty() {
        output.print("Answers:")?;
        for (key, value) in &composition.props.props {
            output.print(&format!("  {key} = {value}"))?;
        }
    }
    Ok(())
}
