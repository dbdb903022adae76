//! End-to-end pipeline test: normalize a raw catalog, deduplicate it, then
//! validate a composition graph chained from the survivors.

use blockforge_compose::{CompatibilityChecker, CompatibilityStatus, GraphValidator};
use blockforge_core::{BlockRecord, Catalog, DataType, Param, SourceLocation};
use blockforge_dedup::{DedupPolicy, DeduplicationProcessor, MemoryStore};
use blockforge_normalize::{
    CanonicalVocabulary, InterfaceNormalizer, MappingConfidence, ParameterMapper,
};

/// Raw catalog as it would arrive from ingestion: inconsistent parameter
/// names, one duplicated block name with a signature conflict.
fn raw_catalog() -> Vec<BlockRecord> {
    vec![
        BlockRecord::new("hash-trim-1", "trim_whitespace")
            .with_category("string")
            .with_inputs(vec![Param::new("txt", DataType::String)])
            .with_outputs(vec![Param::new("result", DataType::String)])
            .with_trust(0.7)
            .with_source(SourceLocation::new("sources/text_cleanup.rs")),
        BlockRecord::new("hash-trim-2", "trim_whitespace")
            .with_category("string")
            .with_inputs(vec![Param::new("s", DataType::String)])
            .with_outputs(vec![Param::new("result", DataType::String)])
            .with_trust(0.9)
            .with_source(SourceLocation::new("sources/string_helpers.rs")),
        BlockRecord::new("hash-count", "count_words")
            .with_category("string")
            .with_inputs(vec![Param::new("input", DataType::String)])
            .with_outputs(vec![Param::new("n", DataType::Integer)])
            .with_trust(0.85)
            .with_source(SourceLocation::new("sources/text_stats.rs")),
        BlockRecord::new("hash-fmt", "format_count")
            .with_category("string")
            .with_inputs(vec![Param::new("num", DataType::Integer)])
            .with_outputs(vec![Param::new("result", DataType::String)])
            .with_trust(0.8)
            .with_source(SourceLocation::new("sources/formatting.rs")),
    ]
}

#[test]
fn normalize_dedup_validate_pipeline() {
    // 1. Normalize: parameter aliases collapse onto canonical names.
    let vocab = CanonicalVocabulary::default();
    let mapper = ParameterMapper::new(&vocab);
    let normalizer = InterfaceNormalizer::new(&mapper, MappingConfidence::Medium);

    let normalized = normalizer.normalize(&raw_catalog());
    assert_eq!(normalized.report.blocks_modified, 4);
    for record in &normalized.records {
        // "txt", "s", "input" all land on "text"; "num" lands on "n".
        let first = &record.inputs[0];
        assert!(first.name == "text" || first.name == "n");
        assert!(first.original_name.is_some());
    }

    // After normalization the two trim blocks have identical signatures.
    let trims: Vec<&BlockRecord> = normalized
        .records
        .iter()
        .filter(|r| r.name == "trim_whitespace")
        .collect();
    assert_eq!(trims[0].inputs[0].name, trims[1].inputs[0].name);

    // 2. Deduplicate with keep-best: the trust-0.9 trim survives.
    let store = MemoryStore::with_records(normalized.records);
    let mut processor = DeduplicationProcessor::new(store, DedupPolicy::KeepBest);
    let report = processor.run(true).unwrap();

    assert_eq!(report.original_count, 4);
    assert_eq!(report.duplicates_found, 1);
    assert_eq!(report.blocks_removed, 1);
    assert_eq!(report.final_count, 3);

    let survivors: Vec<BlockRecord> = processor.store().materialized().to_vec();
    assert!(survivors.iter().any(|r| r.id.as_str() == "hash-trim-2"));
    assert!(!survivors.iter().any(|r| r.id.as_str() == "hash-trim-1"));

    // The deduplicated set indexes cleanly: one id left per name.
    let catalog: Catalog = survivors.iter().cloned().collect();
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.ids_for_name("trim_whitespace").len(), 1);
    assert_eq!(
        catalog.records_for_name("trim_whitespace")[0].id.as_str(),
        "hash-trim-2"
    );

    // 3. Compatibility: trim -> count is a clean string feed.
    let checker = CompatibilityChecker::new();
    let trim = survivors
        .iter()
        .find(|r| r.name == "trim_whitespace")
        .unwrap();
    let count = survivors.iter().find(|r| r.name == "count_words").unwrap();
    let result = checker.check(trim, count);
    assert_eq!(result.status, CompatibilityStatus::Compatible);

    // 4. Chain the survivors and validate the graph.
    let validator = GraphValidator::new();
    let ordered = vec![
        trim.clone(),
        count.clone(),
        survivors
            .iter()
            .find(|r| r.name == "format_count")
            .unwrap()
            .clone(),
    ];
    let graph = validator.create_graph(ordered, None).unwrap();
    let report = validator.validate(&graph);

    assert!(report.is_valid, "violations: {:?}", report.violations);
    assert_eq!(report.node_count, 3);
    assert_eq!(report.edge_count, 2);
}
