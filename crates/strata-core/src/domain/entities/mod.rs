pub mod cleanup;
pub mod common;
pub mod conflict;
pub mod layer;
pub mod merge_block;
pub mod tables;
pub mod template;

pub use crate::domain::DomainError;
pub use cleanup::{CleanupContext, CleanupOp};
pub use conflict::{ConflictSolveResult, ConflictSolverData};
pub use layer::{Layer, LayerFile, LayerKind, LayerPlan, StagingArea};
pub use merge_block::{BaseView, BlockStatus, BlockValues, MergeBlock};
pub use tables::{
    BinaryTable, CacheTable, FileContent, FileTable, GeneratorResult, MergeTable, PatchEntry,
    PatchTable, PatchTableItem,
};
pub use template::{
    Cleanup, ComponentConfig, Condition, DeleteContext, DeleteRule, ExtendTemplate, FileRules,
    LayerRules, ParsedProps, PendingLabel, Props, Question, TemplateConfig,
};
