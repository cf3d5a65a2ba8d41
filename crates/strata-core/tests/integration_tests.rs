//! End-to-end generation through the public API with hand-rolled ports.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use proptest::prelude::*;
use strata_core::{
    application::{
        AnswerProvider, ConflictProtocol, ConflictResolver, FetchOptions, GenerateRequest,
        LayerSource, LoadError, ProjectGenerator, ResolverError, services::materialize,
    },
    domain::{
        BinaryTable, BlockStatus, Cleanup, ConflictSolveResult, ConflictSolverData,
        ExtendTemplate, MergeBlock, MergeTable, Props, Question, StagingArea, TemplateConfig,
    },
    error::StrataResult,
};

struct Files(BTreeMap<&'static str, &'static str>);

impl LayerSource for Files {
    fn fetch(
        &self,
        locator: &str,
        staging: &mut StagingArea,
        _options: &FetchOptions,
    ) -> Result<Duration, LoadError> {
        for (path, content) in &self.0 {
            staging
                .write(path, content.as_bytes())
                .map_err(|e| LoadError::Other {
                    locator: locator.to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(Duration::ZERO)
    }
}

struct Fixed(Props);

impl AnswerProvider for Fixed {
    fn answer(&self, _layer: &str, questions: &[Question]) -> StrataResult<Props> {
        Ok(questions
            .iter()
            .filter_map(|q| self.0.get(&q.name).map(|v| (q.name.clone(), v.clone())))
            .collect())
    }
}

enum Strategy {
    KeepCurrent,
    Ignore,
    Leave,
    Fail,
}

impl ConflictResolver for Strategy {
    fn resolve(&self, data: &ConflictSolverData) -> Result<ConflictSolveResult, ResolverError> {
        match self {
            Self::KeepCurrent => Ok(ConflictSolveResult::keep_current(&data.block)),
            Self::Ignore => Ok(ConflictSolveResult::Ignored),
            Self::Leave => Ok(ConflictSolveResult::Unresolved),
            Self::Fail => Err(ResolverError::new("no terminal")),
        }
    }
}

fn generator(files: &[(&'static str, &'static str)], strategy: Strategy) -> ProjectGenerator {
    let answers = Props::from([(
        "lang".to_string(),
        serde_json::json!("__template.second"),
    )]);
    ProjectGenerator::new(
        Box::new(Files(files.iter().copied().collect())),
        Box::new(Fixed(answers)),
        Box::new(strategy),
    )
}

fn two_layer_config() -> TemplateConfig {
    TemplateConfig::builder("two")
        .question(Question::select("lang", "?", ["__template.second"]))
        .merge("*.json")
        .extend(ExtendTemplate::new("second"))
        .build()
        .unwrap()
}

const CONFIG_LAYERS: &[(&str, &str)] = &[
    ("template/config.json", r#"{"a":1}"#),
    ("extends/second/config.json", r#"{"a":2}"#),
];

#[test]
fn single_layer_is_copied_verbatim() {
    let config = TemplateConfig::builder("one").build().unwrap();
    let generator = generator(&[("template/README.md", "# Hello\n\nworld\n")], Strategy::Leave);

    let outcome = generator
        .generate(&config, GenerateRequest::default())
        .unwrap();

    assert_eq!(outcome.result.text("README.md"), Some("# Hello\n\nworld\n"));
    assert!(outcome.result.conflicts.is_empty());
}

#[test]
fn conflicting_merge_is_reported() {
    let generator = generator(CONFIG_LAYERS, Strategy::Leave);

    let outcome = generator
        .generate(&two_layer_config(), GenerateRequest::default())
        .unwrap();

    assert_eq!(outcome.result.conflicts, vec!["config.json"]);
    assert_eq!(
        outcome.result.text("config.json"),
        Some("<<<<<<< former\n{\"a\":1}\n=======\n{\"a\":2}\n>>>>>>> current")
    );
}

#[test]
fn resolver_choosing_current_yields_second_layer() {
    let generator = generator(CONFIG_LAYERS, Strategy::KeepCurrent);

    let outcome = generator
        .generate(&two_layer_config(), GenerateRequest::default())
        .unwrap();

    assert_eq!(outcome.result.text("config.json"), Some(r#"{"a":2}"#));
    assert!(outcome.result.conflicts.is_empty());
}

#[test]
fn resolver_failure_is_a_warning() {
    let generator = generator(CONFIG_LAYERS, Strategy::Fail);

    let outcome = generator
        .generate(&two_layer_config(), GenerateRequest::default())
        .unwrap();

    assert_eq!(outcome.warnings().len(), 1);
    assert_eq!(outcome.result.conflicts, vec!["config.json"]);
}

#[test]
fn cleanup_can_delete_generated_files() {
    let config = TemplateConfig::builder("clean")
        .cleanup(Cleanup::new("drop-temp", |ctx| {
            if ctx.exists("temp.txt") {
                ctx.delete_files(["temp.txt"]);
            }
            MergeTable::new()
        }))
        .build()
        .unwrap();
    let generator = generator(
        &[("template/temp.txt", "scratch"), ("template/keep.txt", "k")],
        Strategy::Leave,
    );

    let outcome = generator
        .generate(&config, GenerateRequest::default())
        .unwrap();

    assert!(!outcome.result.files.contains_key("temp.txt"));
    assert!(outcome.result.files.contains_key("keep.txt"));
}

#[test]
fn binary_files_are_never_merged() {
    let generator = ProjectGenerator::new(
        Box::new(Binary),
        Box::new(Fixed(Props::new())),
        Box::new(Strategy::Leave),
    );
    let config = TemplateConfig::builder("bin")
        .merge("*")
        .extend(ExtendTemplate::new("all").when(strata_core::domain::Condition::Always))
        .build()
        .unwrap();

    let outcome = generator
        .generate(&config, GenerateRequest::default())
        .unwrap();

    assert!(outcome.result.conflicts.is_empty());
    assert_eq!(
        outcome.result.files["logo.png"].as_bytes(),
        &[0x89, b'P', b'N', b'G', 0, 2]
    );
}

struct Binary;

impl LayerSource for Binary {
    fn fetch(
        &self,
        _locator: &str,
        staging: &mut StagingArea,
        _options: &FetchOptions,
    ) -> Result<Duration, LoadError> {
        let other = |e: strata_core::domain::DomainError| LoadError::Other {
            locator: "bin".into(),
            reason: e.to_string(),
        };
        staging
            .write("template/logo.png", vec![0x89, b'P', b'N', b'G', 0, 1])
            .map_err(other)?;
        staging
            .write("extends/all/logo.png", vec![0x89, b'P', b'N', b'G', 0, 2])
            .map_err(other)?;
        Ok(Duration::ZERO)
    }
}

#[test]
fn generation_is_deterministic() {
    let files: &[(&str, &str)] = &[
        ("template/b.json", "{\n  \"x\": 1\n}\n"),
        ("template/a.json", "[1]\n"),
        ("extends/second/b.json", "{\n  \"x\": 2\n}\n"),
        ("extends/second/a.json", "[1]\n[2]\n"),
    ];

    let run = || {
        generator(files, Strategy::Leave)
            .generate(&two_layer_config(), GenerateRequest::default())
            .unwrap()
    };
    let (first, second) = (run(), run());

    assert_eq!(first.result, second.result);
    assert_eq!(
        first.layers.iter().map(|l| &l.label).collect::<Vec<_>>(),
        second.layers.iter().map(|l| &l.label).collect::<Vec<_>>()
    );
    assert_eq!(first.result.text("a.json"), Some("[1]\n[2]\n"));
    assert_eq!(first.result.conflicts, vec!["b.json"]);
}

#[test]
fn merge_blocks_round_trip_through_rendering() {
    use strata_core::domain::diff::{diff_lines, split_lines};
    use strata_core::domain::entities::merge_block::{build_blocks, render_text};

    let former = split_lines("a\nb\nc\n");
    let current = split_lines("a\nB\nc\nd\n");
    let mut changes = diff_lines(&former, &current);
    let mut blocks = build_blocks("f", &former, &current, &mut changes).unwrap();

    assert_eq!(
        blocks.iter().filter(|b| b.status == BlockStatus::Conflict).count(),
        1
    );
    for block in &mut blocks {
        if block.is_conflict() {
            *block = strata_core::domain::MergeBlock::resolved_with(block.values.current.clone());
        }
    }
    assert_eq!(render_text(&blocks), "a\nB\nc\nd\n");
}

fn mixed_table() -> MergeTable {
    let mut table = MergeTable::new();
    table.insert(
        "a.json",
        vec![
            MergeBlock::conflict(vec!["1".into()], vec!["2".into()]),
            MergeBlock::unchanged(["tail"]),
        ],
    );
    table.insert(
        "b.json",
        vec![MergeBlock::conflict(vec!["x".into()], vec!["y".into()])],
    );
    table
}

#[test]
fn second_resolution_pass_changes_nothing() {
    for strategy in [Strategy::KeepCurrent, Strategy::Ignore, Strategy::Leave, Strategy::Fail] {
        let protocol = ConflictProtocol::new(&strategy);
        let mut table = mixed_table();

        let first = protocol.resolve(&mut table, None);
        assert_eq!(first.presented, 2);
        let settled = table.clone();

        let second = protocol.resolve(&mut table, None);
        assert_eq!(second.presented, 0);
        assert!(second.warnings.is_empty());
        assert_eq!(table, settled);
    }
}

fn block_of(kind: u8) -> MergeBlock {
    let conflict = || MergeBlock::conflict(vec!["f".into()], vec!["c".into()]);
    match kind {
        0 => MergeBlock::unchanged(["u"]),
        1 => conflict(),
        2 => {
            let mut block = conflict();
            block.ignored = true;
            block
        }
        3 => MergeBlock::resolved_with(["r"]),
        _ => {
            let mut block = conflict();
            block.answered = true;
            block
        }
    }
}

proptest! {
    #[test]
    fn conflicts_are_exactly_files_with_open_blocks(
        files in prop::collection::btree_map(
            "[a-e]{1,3}\\.txt",
            prop::collection::vec(0u8..5, 0..6),
            0..8,
        ),
    ) {
        let mut table = MergeTable::new();
        let mut expected = BTreeSet::new();
        for (path, kinds) in &files {
            if kinds.iter().any(|k| *k == 1 || *k == 4) {
                expected.insert(path.clone());
            }
            table.insert(path.clone(), kinds.iter().map(|k| block_of(*k)).collect());
        }

        let result = materialize(&table, &BinaryTable::new());
        let listed: BTreeSet<String> = result.conflicts.iter().cloned().collect();

        prop_assert_eq!(listed.len(), result.conflicts.len());
        prop_assert_eq!(listed, expected);
    }
}
