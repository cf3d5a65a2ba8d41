//! Project Generator - main application orchestrator.
//!
//! This service coordinates the entire generation workflow:
//! 1. Compose the layer stack from the template and answers
//! 2. Fetch all layers into staging
//! 3. Fold layers into the merge and binary tables
//! 4. Run the conflict protocol
//! 5. Run cleanups and re-resolve what they touched
//! 6. Materialize the final files
//!
//! It implements the driving port (incoming) and uses driven ports (outgoing).

use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    application::{
        ports::{
            AnswerProvider, CacheStore, ConflictResolver, FetchOptions, GenerationObserver,
            LayerSource,
        },
        services::{
            cleanup::run_cleanups,
            composer::{Composition, DEFAULT_MAX_PASSES, TemplateComposer},
            conflicts::{ConflictProtocol, ResolutionReport, ResolverWarning},
            materializer::materialize,
            orchestrator::{LayerReport, MergeOrchestrator},
            patch_cache::PatchCache,
        },
    },
    domain::{
        ContextStatusMap, GeneratorResult, JobState, JobStatus, Layer, LayerKind, LayerPlan,
        LayerRules, PatternSet, StagingArea, TemplateConfig,
    },
    error::StrataResult,
};

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub max_composition_passes: usize,
    /// Persist diffs through the cache store, when one is configured.
    pub use_cache: bool,
    pub fetch: FetchOptions,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            max_composition_passes: DEFAULT_MAX_PASSES,
            use_cache: true,
            fetch: FetchOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// Where the layer source finds the template.
    pub locator: String,
    pub components: Vec<String>,
    /// Files of a project being upgraded; folded in before the main layer.
    pub existing: Option<Layer>,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub job_id: String,
    pub result: GeneratorResult,
    pub layers: Vec<LayerReport>,
    pub resolution: ResolutionReport,
    pub fetch_time: Duration,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl GenerationOutcome {
    pub fn warnings(&self) -> &[ResolverWarning] {
        &self.resolution.warnings
    }
}

/// Main generation service.
pub struct ProjectGenerator {
    source: Box<dyn LayerSource>,
    answers: Box<dyn AnswerProvider>,
    resolver: Box<dyn ConflictResolver>,
    cache: Option<Box<dyn CacheStore>>,
    observers: Vec<Box<dyn GenerationObserver>>,
    options: GeneratorOptions,
}

impl ProjectGenerator {
    /// Create a new generator with the given adapters.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use strata_core::application::ProjectGenerator;
    ///
    /// let generator = ProjectGenerator::new(
    ///     source,   // impl LayerSource
    ///     answers,  // impl AnswerProvider
    ///     resolver, // impl ConflictResolver
    /// );
    /// ```
    pub fn new(
        source: Box<dyn LayerSource>,
        answers: Box<dyn AnswerProvider>,
        resolver: Box<dyn ConflictResolver>,
    ) -> Self {
        Self {
            source,
            answers,
            resolver,
            cache: None,
            observers: Vec::new(),
            options: GeneratorOptions::default(),
        }
    }

    pub fn with_cache(mut self, cache: Box<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn GenerationObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Compose only: which layers would run for these answers.
    pub fn plan(&self, config: &TemplateConfig, components: &[String]) -> StrataResult<Composition> {
        TemplateComposer::new(self.answers.as_ref())
            .with_max_passes(self.options.max_composition_passes)
            .compose(config, components)
    }

    /// Generate a project.
    ///
    /// Composition and load failures abort before any merge work. Resolver
    /// failures are collected as warnings and the affected conflicts stay
    /// open in the result.
    #[instrument(skip_all, fields(template = %config.name, locator = %request.locator))]
    pub fn generate(
        &self,
        config: &TemplateConfig,
        request: GenerateRequest,
    ) -> StrataResult<GenerationOutcome> {
        let mut job = JobState::new(Uuid::new_v4().to_string());
        self.publish(job.transition(JobStatus::Running)?);

        // 1. Compose
        let composition = self.plan(config, &request.components)?;
        self.message(&format!(
            "Composed {} layer(s): {}",
            composition.layers.len(),
            composition.labels().join(", ")
        ));

        // 2. Fetch
        let mut staging = StagingArea::new();
        let fetch_time = self
            .source
            .fetch(&request.locator, &mut staging, &self.options.fetch)?;
        debug!(files = staging.len(), ?fetch_time, "Layers staged");
        self.message(&format!("Fetched {} file(s)", staging.len()));

        let layers = composition
            .layers
            .iter()
            .map(|plan| Layer::stage(plan, &staging).map(|layer| (layer, plan)))
            .collect::<Result<Vec<_>, _>>()?;

        // 3. Fold
        let store = if self.options.use_cache {
            self.cache.as_deref()
        } else {
            None
        };
        let patterns = PatternSet::compile(config.merge_patterns())?;
        let mut orchestrator = MergeOrchestrator::new(patterns, PatchCache::new(store));
        let props = &composition.props.props;
        let mut reports = Vec::with_capacity(layers.len() + 1);

        if let Some(existing) = &request.existing {
            let plan = LayerPlan::new(LayerKind::Existing, LayerRules::default());
            reports.push(orchestrator.apply_layer(existing, &plan, config, props)?);
        }
        for (layer, plan) in &layers {
            reports.push(orchestrator.apply_layer(layer, plan, config, props)?);
        }

        // 4. Resolve
        let protocol = ConflictProtocol::new(self.resolver.as_ref());
        let mut resolution = protocol.resolve(orchestrator.merge_table_mut(), None);

        // 5. Cleanups
        let touched = run_cleanups(&mut orchestrator, &composition.layers)?;
        if !touched.is_empty() {
            debug!(paths = touched.len(), "Re-resolving paths touched by cleanups");
            resolution.absorb(protocol.resolve(orchestrator.merge_table_mut(), Some(&touched)));
        }

        // 6. Materialize
        let result = materialize(orchestrator.merge_table(), orchestrator.binary_table());
        if let Err(e) = orchestrator.cache_mut().flush() {
            warn!(error = %e, "Patch cache not saved");
        }
        let (cache_hits, cache_misses) = (orchestrator.cache().hits(), orchestrator.cache().misses());

        self.publish(job.transition(JobStatus::Finished)?);
        info!(
            files = result.files.len(),
            conflicts = result.conflicts.len(),
            "Generation finished"
        );

        Ok(GenerationOutcome {
            job_id: job.id().to_string(),
            result,
            layers: reports,
            resolution,
            fetch_time,
            cache_hits,
            cache_misses,
        })
    }

    fn publish(&self, statuses: ContextStatusMap) {
        for observer in &self.observers {
            observer.on_status_change(&statuses);
        }
    }

    fn message(&self, message: &str) {
        debug!("{message}");
        for observer in &self.observers {
            observer.on_message(message);
        }
    }
}
