//! Final packaging step: cap the block list and wrap it as a `Blueprint`.

use tracing::debug;

use crate::model::{Block, Blueprint, BlueprintFormat};

/// Truncate `blocks` to `max_blocks` (never an error) and package them.
pub fn assemble(
    mut blocks: Vec<Block>,
    max_blocks: usize,
    format: BlueprintFormat,
    catalog: &str,
) -> Blueprint {
    let truncated = blocks.len() > max_blocks;
    if truncated {
        debug!(produced = blocks.len(), max_blocks, "truncating blueprint");
        blocks.truncate(max_blocks);
    }

    Blueprint {
        format,
        catalog: catalog.to_string(),
        truncated,
        blocks,
    }
}
