//! `CantoDict`: the caller-facing dictionary.
//!
//! Owns the store and a cached copy of the input-code table, and ties the
//! loaders, the reconciler, the search builder and the formatter together.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::cangjie::CangjieTable;
use crate::error::Result;
use crate::format::{format_result, FormatOptions};
use crate::loader::parse_dict_file;
use crate::reconcile::{reconcile, ReconcileStats};
use crate::search::{search, GroupedResult, SearchExpr, SearchOptions};
use crate::store::{DictStore, StoreMeta};

pub const DEFAULT_CANTO_FILE: &str = "cccanto-webdist.txt";
pub const DEFAULT_CEDICT_FILE: &str = "cedict_1_0_ts_utf-8_mdbg.txt";
pub const DEFAULT_CEDICT_CANTO_FILE: &str = "cccedict-canto-readings-150923.txt";
pub const DEFAULT_CANGJIE_FILE: &str = "Cangjie_Version_5_Encodings_[ibus].txt";

/// Locations of the three dictionary sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictSources {
    /// CC-Canto: Cantonese entries with jyutping and glosses.
    pub canto: PathBuf,
    /// CC-CEDICT: Mandarin entries with glosses.
    pub cedict: PathBuf,
    /// CC-CEDICT-Canto: jyutping readings for CC-CEDICT headwords.
    pub cedict_canto: PathBuf,
    /// Parse at most this many lines of each source.
    pub max_lines: Option<usize>,
}

impl DictSources {
    /// The three sources under their usual file names in `dir`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            canto: dir.join(DEFAULT_CANTO_FILE),
            cedict: dir.join(DEFAULT_CEDICT_FILE),
            cedict_canto: dir.join(DEFAULT_CEDICT_CANTO_FILE),
            max_lines: None,
        }
    }

    pub fn with_max_lines(mut self, max_lines: Option<usize>) -> Self {
        self.max_lines = max_lines;
        self
    }
}

#[derive(Debug)]
pub struct CantoDict {
    store: DictStore,
    codes: CangjieTable,
}

impl CantoDict {
    /// Open (or create) a dictionary database file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_store(DictStore::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_store(DictStore::in_memory()?)
    }

    pub fn with_store(store: DictStore) -> Result<Self> {
        let codes = store.load_input_codes()?.unwrap_or_default();
        Ok(Self { store, codes })
    }

    pub fn store(&self) -> &DictStore {
        &self.store
    }

    pub fn codes(&self) -> &CangjieTable {
        &self.codes
    }

    /// Rebuild the canonical table from the sources.
    ///
    /// Returns `None` without touching anything when a table already exists
    /// and `force` is false. All sources are read before the store is written.
    pub fn reconcile(&self, sources: &DictSources, force: bool) -> Result<Option<ReconcileStats>> {
        if !force && self.store.has_entries()? {
            info!("canonical table already present; skipping rebuild");
            return Ok(None);
        }

        let canto = parse_dict_file(&sources.canto, sources.max_lines)?;
        let cedict = parse_dict_file(&sources.cedict, sources.max_lines)?;
        let cedict_canto = parse_dict_file(&sources.cedict_canto, sources.max_lines)?;

        let merged = reconcile(&canto, &cedict, &cedict_canto);
        let meta = StoreMeta {
            stats: merged.stats,
            max_source_lines: sources.max_lines.map(|n| n as u64),
        };
        self.store.replace_entries(&merged.entries, &meta)?;
        info!(rows = merged.entries.len(), "reconciliation complete");
        Ok(Some(merged.stats))
    }

    /// Load the Cangjie table into the store. Returns false when skipped.
    pub fn load_input_codes<P: AsRef<Path>>(&mut self, path: P, force: bool) -> Result<bool> {
        if !force && self.store.has_input_codes()? {
            info!("input-code tables already present; skipping load");
            return Ok(false);
        }
        let table = CangjieTable::from_file(path)?;
        self.store.replace_input_codes(&table)?;
        self.codes = table;
        Ok(true)
    }

    pub fn search(&self, expr: &SearchExpr, options: &SearchOptions) -> Result<Vec<GroupedResult>> {
        search(&self.store, &self.codes, expr, options)
    }

    pub fn format(&self, result: &GroupedResult, options: &FormatOptions) -> Result<String> {
        format_result(result, &self.codes, options)
    }

    /// Search and render every result.
    pub fn search_formatted(
        &self,
        expr: &SearchExpr,
        search_options: &SearchOptions,
        format_options: &FormatOptions,
    ) -> Result<Vec<String>> {
        self.search(expr, search_options)?
            .iter()
            .map(|r| self.format(r, format_options))
            .collect()
    }

    /// Render an input code through the key glyphs.
    pub fn translate_codes(&self, code: &str) -> String {
        self.codes.translate(code)
    }
}
