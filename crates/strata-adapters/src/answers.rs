//! Non-interactive answer providers.

use serde_json::Value;
use tracing::debug;

use strata_core::{
    application::{AnswerProvider, ApplicationError},
    domain::{Props, Question},
    error::StrataResult,
};

/// Answers from a fixed map, falling back to each question's default.
///
/// Questions with neither an answer nor a default are left unanswered.
#[derive(Debug, Clone, Default)]
pub struct StaticAnswers {
    values: Props,
}

impl StaticAnswers {
    pub fn new(values: Props) -> Self {
        Self { values }
    }

    /// Parse a JSON object of answers.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` when `text` is not a JSON object.
    pub fn from_json(text: &str) -> StrataResult<Self> {
        let values: Props = serde_json::from_str(text)
            .map_err(|e| ApplicationError::ValidationFailed(format!("answers file: {e}")))?;
        Ok(Self::new(values))
    }

    /// Add `key=value` assignments; later ones win.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` for an assignment without `=`.
    pub fn with_assignments<I, S>(mut self, assignments: I) -> StrataResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for raw in assignments {
            let (key, value) = parse_assignment(raw.as_ref())?;
            self.values.insert(key, value);
        }
        Ok(self)
    }

    pub fn values(&self) -> &Props {
        &self.values
    }
}

impl AnswerProvider for StaticAnswers {
    fn answer(&self, layer: &str, questions: &[Question]) -> StrataResult<Props> {
        let answers: Props = questions
            .iter()
            .filter_map(|q| {
                self.values
                    .get(&q.name)
                    .or(q.default.as_ref())
                    .map(|v| (q.name.clone(), v.clone()))
            })
            .collect();
        debug!(
            layer,
            asked = questions.len(),
            answered = answers.len(),
            "Static answers applied"
        );
        Ok(answers)
    }
}

/// Answers every question with its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAnswers;

impl AnswerProvider for DefaultAnswers {
    fn answer(&self, _layer: &str, questions: &[Question]) -> StrataResult<Props> {
        Ok(questions
            .iter()
            .filter_map(|q| q.default.clone().map(|v| (q.name.clone(), v)))
            .collect())
    }
}

/// Split `key=value`. The value is read as JSON when it parses, otherwise
/// kept as a string, so `ci=true` is a bool and `name=web` a string.
///
/// # Errors
///
/// `ValidationFailed` when there is no `=` or the key is empty.
pub fn parse_assignment(raw: &str) -> StrataResult<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(ApplicationError::ValidationFailed(format!(
            "answer '{raw}' is not in key=value form"
        ))
        .into());
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(ApplicationError::ValidationFailed(format!("answer '{raw}' has no key")).into());
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
