//! Terminal prompts for answers and conflicts (`interactive` feature).

use dialoguer::{Confirm, Input, MultiSelect, Select, theme::ColorfulTheme};
use serde_json::Value;
use tracing::debug;

use strata_core::{
    application::{AnswerProvider, ApplicationError, ConflictResolver, ResolverError},
    domain::{ConflictSolveResult, ConflictSolverData, MergeBlock, Props, Question, QuestionKind},
    error::StrataResult,
};

/// Prompts for every question not already answered.
pub struct PromptAnswers {
    preset: Props,
}

impl PromptAnswers {
    pub fn new(preset: Props) -> Self {
        Self { preset }
    }
}

impl AnswerProvider for PromptAnswers {
    fn answer(&self, layer: &str, questions: &[Question]) -> StrataResult<Props> {
        let theme = ColorfulTheme::default();
        let mut answers = Props::new();

        for question in questions {
            if let Some(value) = self.preset.get(&question.name) {
                answers.insert(question.name.clone(), value.clone());
                continue;
            }
            let value = ask(&theme, question).map_err(|e| ApplicationError::AnswersFailed {
                layer: layer.to_string(),
                reason: e.to_string(),
            })?;
            answers.insert(question.name.clone(), value);
        }

        debug!(layer, answered = answers.len(), "Prompted answers collected");
        Ok(answers)
    }
}

fn prompt_text(question: &Question) -> &str {
    if question.message.is_empty() {
        &question.name
    } else {
        &question.message
    }
}

fn ask(theme: &ColorfulTheme, question: &Question) -> dialoguer::Result<Value> {
    let prompt = prompt_text(question);
    let default = question.default.as_ref();

    Ok(match question.kind {
        QuestionKind::Input => {
            let mut input = Input::<String>::with_theme(theme).with_prompt(prompt);
            if let Some(default) = default {
                input = input.default(value_text(default));
            }
            Value::String(input.interact_text()?)
        }
        QuestionKind::Confirm => {
            let default = default.and_then(Value::as_bool).unwrap_or(false);
            Value::Bool(
                Confirm::with_theme(theme)
                    .with_prompt(prompt)
                    .default(default)
                    .interact()?,
            )
        }
        QuestionKind::Select => {
            let start = default
                .map(value_text)
                .and_then(|d| question.choices.iter().position(|c| *c == d))
                .unwrap_or(0);
            let index = Select::with_theme(theme)
                .with_prompt(prompt)
                .items(question.choices.as_slice())
                .default(start)
                .interact()?;
            Value::String(question.choices[index].clone())
        }
        QuestionKind::MultiSelect => {
            let chosen: Vec<String> = match default {
                Some(Value::Array(items)) => items.iter().map(value_text).collect(),
                Some(other) => vec![value_text(other)],
                None => Vec::new(),
            };
            let defaults: Vec<bool> = question
                .choices
                .iter()
                .map(|c| chosen.contains(c))
                .collect();
            let picked = MultiSelect::with_theme(theme)
                .with_prompt(prompt)
                .items(question.choices.as_slice())
                .defaults(&defaults)
                .interact()?;
            Value::Array(
                picked
                    .into_iter()
                    .map(|i| Value::String(question.choices[i].clone()))
                    .collect(),
            )
        }
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Asks which side to keep for each conflict.
#[derive(Debug, Default)]
pub struct PromptResolver;

const CHOICES: [&str; 5] = [
    "Keep current (later layer)",
    "Keep former (earlier layer)",
    "Keep both, former first",
    "Ignore (keep markers)",
    "Leave unresolved",
];

impl ConflictResolver for PromptResolver {
    fn resolve(&self, data: &ConflictSolverData) -> Result<ConflictSolveResult, ResolverError> {
        let term = console::Term::stderr();
        let header = format!(
            "\n{} (conflict {} of {})\n--- former\n{}\n+++ current\n{}",
            data.path,
            data.index + 1,
            data.total,
            data.block.values.former.join("\n"),
            data.block.values.current.join("\n"),
        );
        term.write_line(&header)
            .map_err(|e| ResolverError::new(e.to_string()))?;

        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Resolve with")
            .items(CHOICES.as_slice())
            .default(0)
            .interact()
            .map_err(|e| ResolverError::new(e.to_string()))?;

        Ok(match choice {
            0 => ConflictSolveResult::keep_current(&data.block),
            1 => ConflictSolveResult::keep_former(&data.block),
            2 => ConflictSolveResult::Resolved(MergeBlock::resolved_with(
                data.block
                    .values
                    .former
                    .iter()
                    .chain(&data.block.values.current)
                    .cloned(),
            )),
            3 => ConflictSolveResult::Ignored,
            _ => ConflictSolveResult::Unresolved,
        })
    }
}
