// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Strata.
//!
//! Pure data and algorithms: line diffing, merge blocks, template
//! configuration and the tables a generation run works on. All I/O lives
//! behind ports defined in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **Deterministic**: Same inputs, same blocks, same order
//!
// Public API - what the world sees
pub mod diff;
pub mod entities;
pub mod error;
pub mod value_objects;

mod validation;

// Re-exports for convenience
pub use diff::{Change, ChangeKind, ConflictGroup};
pub use entities::{
    BaseView, BinaryTable, BlockStatus, BlockValues, CacheTable, Cleanup, CleanupContext,
    CleanupOp, ComponentConfig, Condition, ConflictSolveResult, ConflictSolverData, DeleteContext,
    DeleteRule, ExtendTemplate, FileContent, FileRules, FileTable, GeneratorResult, Layer,
    LayerFile, LayerKind, LayerPlan, LayerRules, MergeBlock, MergeTable, ParsedProps, PatchEntry,
    PatchTable, PatchTableItem, PendingLabel, Props, Question, StagingArea, TemplateConfig,
    common::{PatternSet, is_binary, normalize_path},
    template::TEMPLATE_MARKER_PREFIX,
};

pub use error::{DomainError, ErrorCategory};

pub use value_objects::{ContextStatusMap, JobState, JobStatus, QuestionKind};

pub use validation::DomainValidator;

#[cfg(test)]
mod tests {
    use super::*;
    use diff::{diff_lines, split_lines};
    use entities::merge_block::{build_blocks, render_text};

    // ========================================================================
    // End-to-end fold of two layers
    // ========================================================================

    #[test]
    fn two_layers_agreeing_on_a_prefix_merge_cleanly() {
        let base = split_lines("[deps]\nserde = 1\n");
        let next = split_lines("[deps]\nserde = 1\ntokio = 1\n");

        let mut changes = diff_lines(&base, &next);
        let blocks = build_blocks("Cargo.toml", &base, &next, &mut changes).unwrap();

        assert!(blocks.iter().all(|b| b.status == BlockStatus::Ok));
        assert_eq!(render_text(&blocks), "[deps]\nserde = 1\ntokio = 1\n");
    }

    #[test]
    fn layer_order_validation() {
        let main = LayerPlan::new(LayerKind::Main, LayerRules::default());
        let ext = LayerPlan::new(LayerKind::Extension("ts".into()), LayerRules::default());
        let comp = LayerPlan::new(LayerKind::Component("ci".into()), LayerRules::default());

        assert!(
            DomainValidator::validate_layer_order(&[main.clone(), ext.clone(), comp.clone()])
                .is_ok()
        );
        assert!(DomainValidator::validate_layer_order(&[main.clone(), comp, ext]).is_err());
        assert!(DomainValidator::validate_layer_order(&[]).is_err());
    }

    #[test]
    fn error_categories() {
        assert_eq!(
            DomainError::NoFixedPoint { passes: 3 }.category(),
            ErrorCategory::Composition
        );
        assert_eq!(
            DomainError::UnknownComponent { name: "x".into() }.category(),
            ErrorCategory::NotFound
        );
        assert!(!DomainError::UnknownExtension {
            label: "ts".into(),
            question: "lang".into()
        }
        .suggestions()
        .is_empty());
    }
}
