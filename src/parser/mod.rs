use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogStore, normalize};
use crate::error::BlueprintError;
use crate::model::{Block, Blueprint, BlueprintFormat, Limits, Scope};
use crate::processor::assemble::assemble;
use crate::processor;
use crate::processor::expr::eval_coord;
use crate::processor::script_parser::{as_object, parse_placement, parse_program};

/// Which shape a document has, decided once before any parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DocumentShape<'a> {
    /// `steps` or `defs` array, no `blocks` escape hatch.
    Compact,
    /// Compact, with a legacy `blocks` array to retry on failure.
    CompactWithLegacyFallback(&'a [Value]),
    /// Flat `blocks` array only.
    Legacy(&'a [Value]),
    Unrecognized,
}

pub fn classify(doc: &Map<String, Value>) -> DocumentShape<'_> {
    let is_array = |key: &str| doc.get(key).is_some_and(Value::is_array);
    let blocks = doc.get("blocks").and_then(Value::as_array).map(Vec::as_slice);

    match (is_array("steps") || is_array("defs"), blocks) {
        (true, None) => DocumentShape::Compact,
        (true, Some(blocks)) => DocumentShape::CompactWithLegacyFallback(blocks),
        (false, Some(blocks)) => DocumentShape::Legacy(blocks),
        (false, None) => DocumentShape::Unrecognized,
    }
}

/// Expand a model response into a bounded blueprint.
///
/// The current catalog is snapshotted once, so swapping it while this runs
/// has no effect on the result.
pub fn parse_blocks_from_response(
    document: &Value,
    catalogs: &CatalogStore,
    limits: &Limits,
) -> Result<Blueprint, BlueprintError> {
    let doc = document
        .as_object()
        .ok_or_else(|| BlueprintError::structure("$", "document must be a JSON object"))?;
    let catalog = catalogs.snapshot();

    let (blocks, format) = match classify(doc) {
        DocumentShape::Compact => (parse_compact(doc, &catalog, limits)?, BlueprintFormat::Compact),
        DocumentShape::CompactWithLegacyFallback(legacy) => {
            match parse_compact(doc, &catalog, limits) {
                Ok(blocks) => (blocks, BlueprintFormat::Compact),
                Err(err) => {
                    debug!(error = %err, "compact program failed, retrying legacy `blocks`");
                    (parse_legacy(legacy, &catalog)?, BlueprintFormat::Legacy)
                }
            }
        }
        DocumentShape::Legacy(legacy) => (parse_legacy(legacy, &catalog)?, BlueprintFormat::Legacy),
        DocumentShape::Unrecognized => return Err(BlueprintError::MissingShape),
    };

    let blueprint = assemble(blocks, limits.max_blocks, format, catalog.label());
    info!(
        format = ?blueprint.format,
        blocks = blueprint.len(),
        truncated = blueprint.truncated,
        "blueprint expanded"
    );
    Ok(blueprint)
}

/// Same as `parse_blocks_from_response`, starting from raw text.
pub fn parse_blocks_from_str(
    json: &str,
    catalogs: &CatalogStore,
    limits: &Limits,
) -> Result<Blueprint, BlueprintError> {
    let document: Value = serde_json::from_str(json)?;
    parse_blocks_from_response(&document, catalogs, limits)
}

fn parse_compact(
    doc: &Map<String, Value>,
    catalog: &Catalog,
    limits: &Limits,
) -> Result<Vec<Block>, BlueprintError> {
    let program = parse_program(doc)?;
    processor::run(&program, catalog, *limits)
}

/// Legacy entries see no variables at all: every coordinate is evaluated
/// against an empty scope.
fn parse_legacy(entries: &[Value], catalog: &Catalog) -> Result<Vec<Block>, BlueprintError> {
    let scope = Scope::new();

    entries
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let path = format!("blocks[{i}]");
            let p = parse_placement(as_object(raw, &path)?, &path)?;

            Ok(Block {
                x: eval_coord(&p.x, &scope, &format!("{path}.x"))?,
                y: eval_coord(&p.y, &scope, &format!("{path}.y"))?,
                z: eval_coord(&p.z, &scope, &format!("{path}.z"))?,
                block_type: normalize(&p.block_type.to_string(), &scope, catalog),
            })
        })
        .collect()
}
