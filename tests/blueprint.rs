use std::fs;
use std::path::Path;

use blockscript::catalog::load_catalog_file;
use blockscript::model::BlueprintFormat;
use blockscript::{
    BlueprintError, BudgetExceeded, CatalogMeta, CatalogStore, Limits, parse_blocks_from_response,
    parse_blocks_from_str,
};
use serde_json::{Value, json};

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{name}")).unwrap()
}

fn expand(doc: Value) -> Result<blockscript::Blueprint, BlueprintError> {
    parse_blocks_from_response(&doc, &CatalogStore::default(), &Limits::default())
}

#[test]
fn expands_compact_fixture() {
    let bp = parse_blocks_from_str(&fixture("cottage.json"), &CatalogStore::default(), &Limits::default())
        .expect("valid program");

    assert_eq!(bp.format, BlueprintFormat::Compact);
    assert_eq!(bp.len(), 36);
    assert!(!bp.truncated);

    let palette = bp.palette();
    assert_eq!(palette["minecraft:cobblestone"], 15);
    assert_eq!(palette["minecraft:stone_bricks"], 15);
    assert_eq!(palette["minecraft:oak_planks"], 5);
    assert_eq!(palette["minecraft:torch"], 1);

    let roof_z: Vec<i32> = bp
        .blocks
        .iter()
        .filter(|b| b.y == 3)
        .map(|b| b.z)
        .collect();
    assert_eq!(roof_z, vec![2; 5]);

    let bounds = bp.bounds().unwrap();
    assert_eq!(bounds.min, [0, 0, -1]);
    assert_eq!(bounds.max, [4, 3, 4]);
}

#[test]
fn expands_legacy_fixture() {
    let bp = parse_blocks_from_str(&fixture("legacy.json"), &CatalogStore::default(), &Limits::default())
        .expect("valid legacy document");

    assert_eq!(bp.format, BlueprintFormat::Legacy);
    let types: Vec<&str> = bp.blocks.iter().map(|b| b.block_type.as_str()).collect();
    assert_eq!(
        types,
        vec![
            "minecraft:stone",
            "minecraft:glass",
            "minecraft:grass_block",
            "minecraft:stone"
        ]
    );
    assert_eq!((bp.blocks[2].x, bp.blocks[3].y, bp.blocks[3].z), (2, 0, 0));
}

#[test]
fn legacy_output_is_capped() {
    let entries: Vec<Value> = (0..25)
        .map(|i| json!({"x": i, "y": 0, "z": 0, "blockType": "stone"}))
        .collect();
    let doc = json!({ "blocks": entries });

    for max in [0, 1, 10, 25, 100] {
        let bp = parse_blocks_from_response(&doc, &CatalogStore::default(), &Limits::with_max_blocks(max))
            .unwrap();
        assert_eq!(bp.len(), max.min(25));
        assert_eq!(bp.truncated, max < 25);
    }
}

#[test]
fn flat_program_yields_one_block_per_place() {
    let steps: Vec<Value> = (0..12)
        .map(|i| {
            let op = if i % 2 == 0 { "place" } else { "block" };
            json!({"op": op, "x": i, "y": 1, "z": 0, "blockType": "glass"})
        })
        .collect();

    let bp = expand(json!({ "steps": steps.clone() })).unwrap();
    assert_eq!(bp.len(), 12);

    let bp = parse_blocks_from_response(
        &json!({ "steps": steps }),
        &CatalogStore::default(),
        &Limits::with_max_blocks(5),
    )
    .unwrap();
    assert_eq!(bp.len(), 5);
}

#[test]
fn for_loops_iterate_inclusively_in_order() {
    let up = expand(json!({"steps": [
        {"op": "for", "var": "i", "from": 0, "to": 4, "steps": [
            {"op": "place", "x": "i", "y": 0, "z": 0, "blockType": "stone"}
        ]}
    ]}))
    .unwrap();
    let xs: Vec<i32> = up.blocks.iter().map(|b| b.x).collect();
    assert_eq!(xs, vec![0, 1, 2, 3, 4]);

    let down = expand(json!({"steps": [
        {"op": "for", "var": "i", "from": 4, "to": 0, "step": -1, "steps": [
            {"op": "place", "x": "i", "y": 0, "z": 0, "blockType": "stone"}
        ]}
    ]}))
    .unwrap();
    let xs: Vec<i32> = down.blocks.iter().map(|b| b.x).collect();
    assert_eq!(xs, vec![4, 3, 2, 1, 0]);
}

#[test]
fn zero_stride_is_rejected() {
    let err = expand(json!({"steps": [
        {"op": "for", "var": "i", "from": 0, "to": 4, "step": 0, "steps": [
            {"op": "place", "x": "i", "y": 0, "z": 0, "blockType": "stone"}
        ]}
    ]}))
    .unwrap_err();
    assert!(!err.is_runaway());
    assert!(err.to_string().contains("step must not be 0"));
}

#[test]
fn call_errors_name_the_culprit() {
    let err = expand(json!({"steps": [{"op": "call", "name": "tower", "args": {}}]})).unwrap_err();
    assert!(err.to_string().contains("tower"));

    let err = expand(json!({
        "defs": [{"name": "pillar", "params": ["h"], "steps": []}],
        "steps": [{"op": "call", "name": "pillar", "args": {}}]
    }))
    .unwrap_err();
    match err {
        BlueprintError::MissingParam { def, param } => {
            assert_eq!(def, "pillar");
            assert_eq!(param, "h");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn evaluation_errors_carry_path_and_text() {
    let err = expand(json!({"steps": [
        {"op": "for", "var": "i", "from": "width", "to": 3, "steps": [
            {"op": "place", "x": "i", "y": 0, "z": 0}
        ]}
    ]}))
    .unwrap_err();
    match err {
        BlueprintError::Eval { path, expr, .. } => {
            assert_eq!(path, "for.from");
            assert_eq!(expr, "width");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn division_truncates_toward_zero() {
    let bp = expand(json!({
        "defs": [{"name": "mid", "params": ["x", "z"], "steps": [
            {"op": "place", "x": "(x+z)/2", "y": "-1/2", "z": "-7/2", "blockType": "stone"}
        ]}],
        "steps": [{"op": "call", "name": "mid", "args": {"x": 5, "z": 1}}]
    }))
    .unwrap();
    let b = &bp.blocks[0];
    assert_eq!((b.x, b.y, b.z), (3, 0, -3));
}

#[test]
fn missing_shape_is_rejected() {
    let err = expand(json!({"structure": "a house"})).unwrap_err();
    assert!(matches!(err, BlueprintError::MissingShape));
    assert!(err.to_string().contains("missing"));
}

#[test]
fn compact_failure_falls_back_to_legacy_blocks() {
    let bp = parse_blocks_from_str(&fixture("mixed.json"), &CatalogStore::default(), &Limits::default())
        .expect("legacy fallback");
    assert_eq!(bp.format, BlueprintFormat::Legacy);
    assert_eq!(bp.len(), 2);
    assert!(bp.blocks.iter().all(|b| b.block_type == "minecraft:dirt"));
}

#[test]
fn compact_failure_without_blocks_propagates() {
    let err = expand(json!({"steps": [
        {"op": "place", "x": "undefined_width", "y": 0, "z": 0, "blockType": "stone"}
    ]}))
    .unwrap_err();
    assert!(matches!(err, BlueprintError::Eval { .. }));
}

#[test]
fn compact_success_ignores_legacy_blocks() {
    let bp = expand(json!({
        "steps": [{"op": "place", "x": 9, "y": 9, "z": 9, "blockType": "glass"}],
        "blocks": [{"x": 0, "y": 0, "z": 0, "blockType": "dirt"}]
    }))
    .unwrap();
    assert_eq!(bp.format, BlueprintFormat::Compact);
    assert_eq!(bp.blocks[0].x, 9);
}

fn nested(levels: usize) -> Value {
    let mut step = json!({"op": "place", "x": 0, "y": 0, "z": 0, "blockType": "stone"});
    for level in 0..levels {
        step = json!({"op": "for", "var": format!("l{level}"), "from": 0, "to": 0, "steps": [step]});
    }
    json!({ "steps": [step] })
}

#[test]
fn deep_nesting_is_a_runaway_program() {
    assert_eq!(expand(nested(20)).unwrap().len(), 1);

    let err = expand(nested(30)).unwrap_err();
    assert!(err.is_runaway());
    assert!(matches!(
        err,
        BlueprintError::Budget(BudgetExceeded::CallDepth { limit: 24, .. })
    ));
}

#[test]
fn unknown_block_type_is_reported_once() {
    let store = CatalogStore::default();
    let doc = json!({"steps": [
        {"op": "for", "var": "i", "from": 1, "to": 1000, "steps": [
            {"op": "place", "x": "i", "y": 0, "z": 0, "blockType": "foo"}
        ]}
    ]});
    let bp = parse_blocks_from_response(&doc, &store, &Limits::default()).unwrap();

    assert_eq!(bp.len(), 1000);
    assert!(bp.blocks.iter().all(|b| b.block_type == "minecraft:stone"));
    assert_eq!(store.snapshot().warned_count(), 1);
}

#[test]
fn catalog_swap_applies_to_the_next_expansion_only() {
    let store = CatalogStore::default();
    let doc = json!({"blocks": [{"x": 0, "y": 0, "z": 0, "blockType": "cherry planks"}]});

    let first = parse_blocks_from_response(&doc, &store, &Limits::default()).unwrap();
    assert_eq!(first.blocks[0].block_type, "minecraft:stone");
    assert_eq!(first.catalog, "builtin");

    let (ids, meta) = load_catalog_file(Path::new("tests/fixtures/catalog.json")).unwrap();
    assert_eq!(
        meta,
        CatalogMeta {
            version: Some("1.21.1".into()),
            source: Some("registry-dump".into()),
        }
    );
    store.set_supported_block_catalog(ids, meta);

    let second = parse_blocks_from_response(&doc, &store, &Limits::default()).unwrap();
    assert_eq!(second.blocks[0].block_type, "minecraft:cherry_planks");
    assert_eq!(second.catalog, "registry-dump@1.21.1");

    // already returned output is untouched
    assert_eq!(first.blocks[0].block_type, "minecraft:stone");

    // no stone in the new catalog: its first entry is the fallback
    let third = expand_with(&store, json!({"blocks": [{"x": 0, "y": 0, "z": 0, "blockType": "stone"}]}));
    assert_eq!(third.blocks[0].block_type, "minecraft:glass");
}

fn expand_with(store: &CatalogStore, doc: Value) -> blockscript::Blueprint {
    parse_blocks_from_response(&doc, store, &Limits::default()).unwrap()
}

#[test]
fn snapshot_outlives_a_swap() {
    let store = CatalogStore::default();
    let before = store.snapshot();
    store.set_supported_block_catalog(["minecraft:dirt"], CatalogMeta::default());

    assert!(before.contains("minecraft:stone"));
    assert!(!store.snapshot().contains("minecraft:stone"));
}
