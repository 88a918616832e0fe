pub mod catalog;
pub mod cli;
pub mod error;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

pub use catalog::{Catalog, CatalogMeta, CatalogStore};
pub use error::{BlueprintError, BudgetExceeded, ParseError};
pub use model::{Block, Blueprint, Limits};
pub use parser::{parse_blocks_from_response, parse_blocks_from_str};

use anyhow::Context;
use clap::Parser;
use tracing::info;

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // 1. ── Catalog ────────────────────────────────────────────────────
    let catalogs = CatalogStore::default();
    if let Some(path) = &args.catalog {
        let (ids, meta) = catalog::load_catalog_file(path)?;
        catalogs.set_supported_block_catalog(ids, meta);
    }
    info!(catalog = %catalogs.label(), "block catalog ready");

    // 2. ── Expand ─────────────────────────────────────────────────────
    let json = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Reading {}", args.input.display()))?;
    info!(bytes = json.len(), "document loaded");

    let limits = Limits::with_max_blocks(args.max_blocks);
    let blueprint = parse_blocks_from_str(&json, &catalogs, &limits)
        .with_context(|| format!("Expanding {}", args.input.display()))?;

    if let Some(bounds) = blueprint.bounds() {
        info!(min = ?bounds.min, max = ?bounds.max, "structure bounds");
    }
    for (block_type, count) in blueprint.palette() {
        info!(block_type, count, "palette");
    }

    // 3. ── Write output ───────────────────────────────────────────────
    writer::json::emit(&blueprint, &args.output, args.pretty).with_context(|| "Writing blueprint")?;

    Ok(())
}
