//! Template configuration: questions, file rules, extensions and components.
//!
//! A [`TemplateConfig`] describes one template and everything that can be
//! layered on top of it:
//!
//! - **Root rules**: questions asked first, merge/delete rules, cleanups
//! - **Extension templates**: extra layers activated by a [`Condition`]
//! - **Components**: optional layers the caller selects by name
//!
//! ## Extension Markers
//!
//! An answer value of the form `__template.<label>` selects the extension
//! template with that label. [`ParsedProps`] strips those values out of the
//! answers and records the labels as pending.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{DomainError, value_objects::QuestionKind};

use super::cleanup::CleanupContext;
use super::common::{PatternSet, normalize_path};
use super::tables::MergeTable;

/// Prefix of answer values that select an extension template.
pub const TEMPLATE_MARKER_PREFIX: &str = "__template.";

/// Answers keyed by question name.
pub type Props = BTreeMap<String, Value>;

// ============================================================================
// Questions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Question {
    pub fn input(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            kind: QuestionKind::Input,
            choices: Vec::new(),
            default: None,
        }
    }

    pub fn confirm(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: QuestionKind::Confirm,
            ..Self::input(name, message)
        }
    }

    pub fn select<I, S>(name: impl Into<String>, message: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: QuestionKind::Select,
            choices: choices.into_iter().map(Into::into).collect(),
            ..Self::input(name, message)
        }
    }

    pub fn multi_select<I, S>(
        name: impl Into<String>,
        message: impl Into<String>,
        choices: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: QuestionKind::MultiSelect,
            ..Self::select(name, message, choices)
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

// ============================================================================
// Answers and extension markers
// ============================================================================

/// An extension label selected through an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLabel {
    pub label: String,
    pub question: String,
}

/// Answers with extension markers separated out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedProps {
    pub props: Props,
    pub pending_labels: Vec<PendingLabel>,
}

impl ParsedProps {
    pub fn parse(answers: &Props) -> Self {
        let mut parsed = Self::default();
        parsed.absorb(answers);
        parsed
    }

    /// Fold another batch of answers in and return that batch with its
    /// markers stripped.
    pub fn absorb(&mut self, answers: &Props) -> Props {
        let mut stripped = Props::new();

        for (question, value) in answers {
            let (kept, labels) = strip_markers(value);
            for label in labels {
                if !self.is_selected(&label) {
                    self.pending_labels.push(PendingLabel {
                        label,
                        question: question.clone(),
                    });
                }
            }
            if let Some(kept) = kept {
                stripped.insert(question.clone(), kept.clone());
                self.props.insert(question.clone(), kept);
            }
        }

        stripped
    }

    pub fn is_selected(&self, label: &str) -> bool {
        self.pending_labels.iter().any(|p| p.label == label)
    }
}

fn marker_label(value: &str) -> Option<&str> {
    value
        .strip_prefix(TEMPLATE_MARKER_PREFIX)
        .filter(|label| !label.is_empty())
}

fn strip_markers(value: &Value) -> (Option<Value>, Vec<String>) {
    match value {
        Value::String(s) => match marker_label(s) {
            Some(label) => (None, vec![label.to_string()]),
            None => (Some(value.clone()), Vec::new()),
        },
        Value::Array(items) => {
            let mut labels = Vec::new();
            let mut kept = Vec::new();
            for item in items {
                match item.as_str().and_then(marker_label) {
                    Some(label) => labels.push(label.to_string()),
                    None => kept.push(item.clone()),
                }
            }
            (Some(Value::Array(kept)), labels)
        }
        _ => (Some(value.clone()), Vec::new()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

// ============================================================================
// Conditions
// ============================================================================

/// When an extension template joins the stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Condition {
    /// Some answer carried `__template.<label>`.
    #[default]
    Selected,
    /// The answer equals `value`, or is an array containing it.
    Equals { key: String, value: Value },
    Truthy { key: String },
    Always,
}

impl Condition {
    pub fn is_met(&self, label: &str, props: &ParsedProps) -> bool {
        match self {
            Self::Selected => props.is_selected(label),
            Self::Equals { key, value } => match props.props.get(key) {
                Some(Value::Array(items)) if !value.is_array() => items.contains(value),
                Some(actual) => actual == value,
                None => false,
            },
            Self::Truthy { key } => props.props.get(key).is_some_and(is_truthy),
            Self::Always => true,
        }
    }
}

// ============================================================================
// File rules
// ============================================================================

/// Input handed to a delete handler.
pub struct DeleteContext<'a> {
    pub config: &'a TemplateConfig,
    pub props: &'a Props,
    /// Every path currently in the merge or binary table, sorted.
    pub targets: &'a [String],
}

pub type DeleteHandler = Arc<dyn Fn(&DeleteContext<'_>) -> Vec<String> + Send + Sync>;

#[derive(Clone)]
pub enum DeleteRule {
    Pattern(String),
    Handler(DeleteHandler),
}

impl DeleteRule {
    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&DeleteContext<'_>) -> Vec<String> + Send + Sync + 'static,
    {
        Self::Handler(Arc::new(f))
    }
}

impl fmt::Debug for DeleteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(p) => f.debug_tuple("Pattern").field(p).finish(),
            Self::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileRules {
    /// Globs for paths that are merged line by line instead of overwritten.
    pub merge: Vec<String>,
    pub delete: Vec<DeleteRule>,
}

// ============================================================================
// Cleanups
// ============================================================================

pub type CleanupFn = Arc<dyn Fn(&mut CleanupContext<'_>) -> MergeTable + Send + Sync>;

/// A named post-merge hook.
///
/// Runs after all layers are folded. Staged operations on the context and
/// the returned fragment are both folded back into the merge table.
#[derive(Clone)]
pub struct Cleanup {
    pub name: String,
    pub run: CleanupFn,
}

impl Cleanup {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut CleanupContext<'_>) -> MergeTable + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Arc::new(f),
        }
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup").field("name", &self.name).finish()
    }
}

/// Rules every layer kind shares.
#[derive(Debug, Clone, Default)]
pub struct LayerRules {
    pub questions: Vec<Question>,
    pub files: FileRules,
    pub cleanups: Vec<Cleanup>,
}

// ============================================================================
// Extensions and components
// ============================================================================

#[derive(Debug, Clone)]
pub struct ExtendTemplate {
    pub label: String,
    pub when: Condition,
    pub rules: LayerRules,
}

impl ExtendTemplate {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            when: Condition::Selected,
            rules: LayerRules::default(),
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.when = condition;
        self
    }

    pub fn question(mut self, question: Question) -> Self {
        self.rules.questions.push(question);
        self
    }

    pub fn merge(mut self, pattern: impl Into<String>) -> Self {
        self.rules.files.merge.push(pattern.into());
        self
    }

    pub fn delete(mut self, rule: DeleteRule) -> Self {
        self.rules.files.delete.push(rule);
        self
    }

    pub fn cleanup(mut self, cleanup: Cleanup) -> Self {
        self.rules.cleanups.push(cleanup);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComponentConfig {
    pub name: String,
    pub questions: Vec<Question>,
    /// Source path (file or directory) to destination path.
    pub alias: BTreeMap<String, String>,
    pub delete: Vec<DeleteRule>,
}

impl ComponentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn question(mut self, question: Question) -> Self {
        self.questions.push(question);
        self
    }

    pub fn alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.alias.insert(from.into(), to.into());
        self
    }

    pub fn delete(mut self, rule: DeleteRule) -> Self {
        self.delete.push(rule);
        self
    }

    pub fn rules(&self) -> LayerRules {
        LayerRules {
            questions: self.questions.clone(),
            files: FileRules {
                merge: Vec::new(),
                delete: self.delete.clone(),
            },
            cleanups: Vec::new(),
        }
    }
}

// ============================================================================
// Template
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct TemplateConfig {
    pub name: String,
    pub rules: LayerRules,
    pub extend_templates: Vec<ExtendTemplate>,
    pub components: Vec<ComponentConfig>,
}

impl TemplateConfig {
    pub fn builder(name: impl Into<String>) -> TemplateConfigBuilder {
        TemplateConfigBuilder {
            config: Self {
                name: name.into(),
                ..Self::default()
            },
        }
    }

    pub fn extension(&self, label: &str) -> Option<&ExtendTemplate> {
        self.extend_templates.iter().find(|e| e.label == label)
    }

    pub fn component(&self, name: &str) -> Option<&ComponentConfig> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Union of every merge glob declared anywhere in the template.
    pub fn merge_patterns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        std::iter::once(&self.rules)
            .chain(self.extend_templates.iter().map(|e| &e.rules))
            .flat_map(|r| r.files.merge.iter())
            .filter(|p| seen.insert(p.as_str()))
            .cloned()
            .collect()
    }

    /// Check names, globs and aliases.
    ///
    /// # Errors
    ///
    /// - `DuplicateName` for repeated extension labels or component names
    /// - `InvalidPattern` for globs that do not parse
    /// - `AbsolutePathNotAllowed` for alias paths outside the project
    /// - `AliasCollision` when two alias sources share a destination
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidTemplate(
                "Template name cannot be empty".into(),
            ));
        }

        let mut labels = HashSet::new();
        for ext in &self.extend_templates {
            if ext.label.is_empty() {
                return Err(DomainError::InvalidTemplate(
                    "Extension label cannot be empty".into(),
                ));
            }
            if !labels.insert(ext.label.as_str()) {
                return Err(DomainError::DuplicateName {
                    kind: "extension",
                    name: ext.label.clone(),
                });
            }
        }

        let mut names = HashSet::new();
        for component in &self.components {
            if !names.insert(component.name.as_str()) {
                return Err(DomainError::DuplicateName {
                    kind: "component",
                    name: component.name.clone(),
                });
            }
            validate_alias(component)?;
            validate_delete_patterns(&component.delete)?;
        }

        for rules in std::iter::once(&self.rules).chain(self.extend_templates.iter().map(|e| &e.rules)) {
            PatternSet::compile(&rules.files.merge)?;
            validate_delete_patterns(&rules.files.delete)?;
        }

        Ok(())
    }
}

fn validate_delete_patterns(rules: &[DeleteRule]) -> Result<(), DomainError> {
    let patterns = rules.iter().filter_map(|r| match r {
        DeleteRule::Pattern(p) => Some(p.as_str()),
        DeleteRule::Handler(_) => None,
    });
    PatternSet::compile(patterns).map(|_| ())
}

fn validate_alias(component: &ComponentConfig) -> Result<(), DomainError> {
    let mut targets: BTreeMap<String, &str> = BTreeMap::new();
    for (from, to) in &component.alias {
        normalize_path(from)?;
        let target = normalize_path(to)?;
        if let Some(first) = targets.insert(target.clone(), from) {
            return Err(DomainError::AliasCollision {
                owner: component.name.clone(),
                first: first.to_string(),
                second: from.clone(),
                target,
            });
        }
    }
    Ok(())
}

/// Builder for [`TemplateConfig`], validating on `build`.
pub struct TemplateConfigBuilder {
    config: TemplateConfig,
}

impl TemplateConfigBuilder {
    pub fn question(mut self, question: Question) -> Self {
        self.config.rules.questions.push(question);
        self
    }

    pub fn merge(mut self, pattern: impl Into<String>) -> Self {
        self.config.rules.files.merge.push(pattern.into());
        self
    }

    pub fn delete(mut self, rule: DeleteRule) -> Self {
        self.config.rules.files.delete.push(rule);
        self
    }

    pub fn cleanup(mut self, cleanup: Cleanup) -> Self {
        self.config.rules.cleanups.push(cleanup);
        self
    }

    pub fn extend(mut self, extension: ExtendTemplate) -> Self {
        self.config.extend_templates.push(extension);
        self
    }

    pub fn component(mut self, component: ComponentConfig) -> Self {
        self.config.components.push(component);
        self
    }

    /// # Errors
    ///
    /// Whatever [`TemplateConfig::validate`] reports.
    pub fn build(self) -> Result<TemplateConfig, DomainError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
