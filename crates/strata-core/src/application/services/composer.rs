//! Template composition: turn a config and answers into an ordered layer stack.
//!
//! Root questions are asked first. Each pass then activates every extension
//! whose condition holds against the answers gathered so far; the answers of
//! newly activated extensions feed the next pass. Composition stops at the
//! first pass that activates nothing.

use std::collections::BTreeSet;

use tracing::{debug, info, instrument};

use crate::{
    application::ports::AnswerProvider,
    domain::{
        DomainError, DomainValidator, LayerKind, LayerPlan, ParsedProps, Props, Question,
        TemplateConfig,
    },
    error::StrataResult,
};

/// Default cap on extension passes.
pub const DEFAULT_MAX_PASSES: usize = 16;

/// Result of composition.
#[derive(Debug, Clone)]
pub struct Composition {
    /// Main, then active extensions, then selected components, each in
    /// declaration order.
    pub layers: Vec<LayerPlan>,
    /// Every answer gathered, markers stripped.
    pub props: ParsedProps,
    pub passes: usize,
}

impl Composition {
    pub fn labels(&self) -> Vec<String> {
        self.layers.iter().map(LayerPlan::label).collect()
    }
}

pub struct TemplateComposer<'a> {
    answers: &'a dyn AnswerProvider,
    max_passes: usize,
}

impl<'a> TemplateComposer<'a> {
    pub fn new(answers: &'a dyn AnswerProvider) -> Self {
        Self {
            answers,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    /// Compose the layer stack.
    ///
    /// # Errors
    ///
    /// - `UnknownExtension` when an answer selects an undeclared label
    /// - `UnknownComponent` for a requested component that is not declared
    /// - `NoFixedPoint` when extensions keep activating past the pass limit
    /// - Validation errors from the template itself
    #[instrument(skip_all, fields(template = %config.name))]
    pub fn compose(
        &self,
        config: &TemplateConfig,
        components: &[String],
    ) -> StrataResult<Composition> {
        DomainValidator::validate_template(config)?;

        for name in components {
            if config.component(name).is_none() {
                return Err(DomainError::UnknownComponent { name: name.clone() }.into());
            }
        }

        let mut parsed = ParsedProps::default();
        let root_answers = self.ask("main", &config.rules.questions)?;
        let mut main = LayerPlan::new(LayerKind::Main, config.rules.clone());
        main.answers = parsed.absorb(&root_answers);

        let mut active: Vec<Option<Props>> = vec![None; config.extend_templates.len()];
        let mut passes = 0;

        loop {
            self.check_pending_labels(config, &parsed)?;

            let newly: Vec<usize> = config
                .extend_templates
                .iter()
                .enumerate()
                .filter(|(i, ext)| active[*i].is_none() && ext.when.is_met(&ext.label, &parsed))
                .map(|(i, _)| i)
                .collect();

            if newly.is_empty() {
                break;
            }

            passes += 1;
            if passes > self.max_passes {
                return Err(DomainError::NoFixedPoint {
                    passes: self.max_passes,
                }
                .into());
            }

            for i in newly {
                let ext = &config.extend_templates[i];
                debug!(label = %ext.label, pass = passes, "Extension activated");
                let answers = self.ask(&format!("extend:{}", ext.label), &ext.rules.questions)?;
                active[i] = Some(parsed.absorb(&answers));
            }
        }

        let mut layers = vec![main];
        for (ext, answers) in config.extend_templates.iter().zip(active) {
            if let Some(answers) = answers {
                let mut plan = LayerPlan::new(LayerKind::Extension(ext.label.clone()), ext.rules.clone());
                plan.answers = answers;
                layers.push(plan);
            }
        }

        let requested: BTreeSet<&str> = components.iter().map(String::as_str).collect();
        for component in &config.components {
            if !requested.contains(component.name.as_str()) {
                continue;
            }
            let answers = self.ask(&format!("component:{}", component.name), &component.questions)?;
            let mut plan = LayerPlan::new(LayerKind::Component(component.name.clone()), component.rules());
            plan.answers = parsed.absorb(&answers);
            plan.alias = component.alias.clone();
            layers.push(plan);
        }
        self.check_pending_labels(config, &parsed)?;

        DomainValidator::validate_layer_order(&layers)?;
        info!(layers = layers.len(), passes, "Template composed");

        Ok(Composition {
            layers,
            props: parsed,
            passes,
        })
    }

    fn ask(&self, layer: &str, questions: &[Question]) -> StrataResult<Props> {
        if questions.is_empty() {
            return Ok(Props::new());
        }
        self.answers.answer(layer, questions)
    }

    fn check_pending_labels(
        &self,
        config: &TemplateConfig,
        parsed: &ParsedProps,
    ) -> Result<(), DomainError> {
        match parsed
            .pending_labels
            .iter()
            .find(|p| config.extension(&p.label).is_none())
        {
            Some(unknown) => Err(DomainError::UnknownExtension {
                label: unknown.label.clone(),
                question: unknown.question.clone(),
            }),
            None => Ok(()),
        }
    }
}
