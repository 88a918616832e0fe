//! Block-type catalog and the normalizer that validates against it.
//!
//! The catalog is swapped wholesale, never edited in place. Each expansion
//! takes an `Arc` snapshot up front, so a swap that lands mid-expansion is
//! simply not observed by it.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::model::{Scope, ScopeValue};
use crate::processor::lexer::is_identifier;

pub const NAMESPACE: &str = "minecraft:";
pub const DEFAULT_BLOCK: &str = "minecraft:stone";

const BUILTIN_PALETTE: &[&str] = &[
    "minecraft:stone",
    "minecraft:cobblestone",
    "minecraft:stone_bricks",
    "minecraft:bricks",
    "minecraft:oak_planks",
    "minecraft:oak_log",
    "minecraft:spruce_planks",
    "minecraft:glass",
    "minecraft:glass_pane",
    "minecraft:dirt",
    "minecraft:grass_block",
    "minecraft:sand",
    "minecraft:sandstone",
    "minecraft:white_wool",
    "minecraft:torch",
    "minecraft:air",
];

/// Where a catalog came from, used only to label diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogMeta {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl CatalogMeta {
    fn label(&self) -> String {
        match (&self.source, &self.version) {
            (Some(s), Some(v)) => format!("{s}@{v}"),
            (Some(s), None) => s.clone(),
            (None, Some(v)) => format!("catalog@{v}"),
            (None, None) => "catalog".to_string(),
        }
    }
}

/// Set of placeable block identifiers plus the memo of identifiers that
/// have already been reported as unknown.
#[derive(Debug)]
pub struct Catalog {
    ids: HashSet<String>,
    fallback: String,
    label: String,
    warned: Mutex<HashSet<String>>,
}

impl Catalog {
    pub fn builtin() -> Self {
        Self::from_ids(BUILTIN_PALETTE.iter().copied(), "builtin".to_string())
    }

    /// Build a catalog from raw identifiers. Every id is canonicalized;
    /// blanks are dropped.
    pub fn new<I, S>(ids: I, meta: &CatalogMeta) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_ids(ids, meta.label())
    }

    fn from_ids<I, S>(ids: I, label: String) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = HashSet::new();
        let mut first: Option<String> = None;
        for raw in ids {
            let id = canonicalize(raw.as_ref());
            if id == NAMESPACE {
                continue;
            }
            if first.is_none() {
                first = Some(id.clone());
            }
            set.insert(id);
        }

        let fallback = if set.contains(DEFAULT_BLOCK) {
            DEFAULT_BLOCK.to_string()
        } else {
            first.unwrap_or_else(|| DEFAULT_BLOCK.to_string())
        };

        Self {
            ids: set,
            fallback,
            label,
            warned: Mutex::new(HashSet::new()),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Identifier substituted for anything not in the catalog.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Number of distinct unknown identifiers reported so far.
    pub fn warned_count(&self) -> usize {
        self.warned.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn clear_warnings(&self) {
        self.warned.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Map an already canonical id to itself or to the fallback.
    pub fn resolve(&self, id: String) -> String {
        if self.ids.contains(&id) {
            return id;
        }
        let first_time = self
            .warned
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone());
        if first_time {
            warn!(
                block = %id,
                catalog = %self.label,
                fallback = %self.fallback,
                "unknown block type, substituting fallback"
            );
        }
        self.fallback.clone()
    }
}

/// Lowercase, trim, `_` for whitespace runs and hyphens, and make sure a
/// namespace prefix is present.
pub fn canonicalize(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let joined = lowered.split_whitespace().collect::<Vec<_>>().join("_");
    let id = joined.replace('-', "_");
    if id.contains(':') {
        id
    } else {
        format!("{NAMESPACE}{id}")
    }
}

/// Turn a raw block-type value into a catalog-valid identifier. Never fails.
///
/// A bare identifier bound in `scope` is resolved first so block types can be
/// passed around as call arguments.
pub fn normalize(raw: &str, scope: &Scope, catalog: &Catalog) -> String {
    let trimmed = raw.trim();
    let resolved = match scope.get(trimmed) {
        Some(ScopeValue::Text(s)) if is_identifier(trimmed) => canonicalize(s),
        Some(ScopeValue::Int(n)) if is_identifier(trimmed) => canonicalize(&n.to_string()),
        _ => canonicalize(raw),
    };
    catalog.resolve(resolved)
}

/// Owner of the current catalog.
///
/// Readers get an `Arc` snapshot; writers replace the whole `Arc`.
#[derive(Debug)]
pub struct CatalogStore {
    current: RwLock<Arc<Catalog>>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new(Catalog::builtin())
    }
}

impl CatalogStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    pub fn snapshot(&self) -> Arc<Catalog> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn label(&self) -> String {
        self.snapshot().label().to_string()
    }

    /// Swap in a new catalog. The warned memo starts empty again.
    pub fn set_supported_block_catalog<I, S>(&self, ids: I, meta: CatalogMeta)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.replace(Catalog::new(ids, &meta));
    }

    pub fn replace(&self, catalog: Catalog) {
        info!(
            catalog = %catalog.label(),
            blocks = catalog.len(),
            "block catalog replaced"
        );
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Arc::new(catalog);
    }

    /// Forget which unknown ids were already reported, without a swap.
    pub fn reset_warnings(&self) {
        self.snapshot().clear_warnings();
    }
}

/// On-disk catalog: a bare id list or an object with meta.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<String>),
    Full {
        #[serde(flatten)]
        meta: CatalogMeta,
        blocks: Vec<String>,
    },
}

/// Read a catalog file and return its ids and meta.
pub fn load_catalog_file(path: &Path) -> Result<(Vec<String>, CatalogMeta)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Reading catalog {}", path.display()))?;
    let file: CatalogFile = serde_json::from_str(&text)
        .with_context(|| format!("Parsing catalog {}", path.display()))?;

    Ok(match file {
        CatalogFile::List(blocks) => {
            let meta = CatalogMeta {
                version: None,
                source: Some(path.display().to_string()),
            };
            (blocks, meta)
        }
        CatalogFile::Full { mut meta, blocks } => {
            if meta.source.is_none() {
                meta.source = Some(path.display().to_string());
            }
            (blocks, meta)
        }
    })
}
