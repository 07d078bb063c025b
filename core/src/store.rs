//! redb-backed dictionary store.
//!
//! Layout:
//! - `cc_canto`: row id (`u64`, 1-based, canonical order) → bincode [`DictEntry`]
//! - `cc_canto_trad` / `cc_canto_simp` / `cc_canto_jyutping`: value → row ids
//! - `cj_sign_mappings`: alpha key → radical glyph
//! - `cj_dict`: character → input codes
//! - `ccdict_meta`: bincode [`StoreMeta`] of the last reconciliation
//!
//! Every `replace_*` call rewrites its tables inside one write transaction, so
//! readers observe either the previous set or the complete new one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use redb::{
    Database, MultimapTableDefinition, ReadableMultimapTable, ReadableTable,
    ReadableTableMetadata, TableDefinition, TableError,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cangjie::CangjieTable;
use crate::entry::{DictEntry, DictField};
use crate::error::{DictError, Result};
use crate::reconcile::ReconcileStats;

const ENTRIES: TableDefinition<u64, &[u8]> = TableDefinition::new("cc_canto");
const TRAD_INDEX: MultimapTableDefinition<&str, u64> = MultimapTableDefinition::new("cc_canto_trad");
const SIMP_INDEX: MultimapTableDefinition<&str, u64> = MultimapTableDefinition::new("cc_canto_simp");
const JYUTPING_INDEX: MultimapTableDefinition<&str, u64> =
    MultimapTableDefinition::new("cc_canto_jyutping");
const CJ_SIGNS: TableDefinition<&str, &str> = TableDefinition::new("cj_sign_mappings");
const CJ_DICT: MultimapTableDefinition<&str, &str> = MultimapTableDefinition::new("cj_dict");
const META: TableDefinition<&str, &[u8]> = TableDefinition::new("ccdict_meta");

const META_RECONCILE: &str = "reconcile";

/// Bookkeeping written alongside the canonical table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub stats: ReconcileStats,
    /// Source line cap the table was built with, if any.
    pub max_source_lines: Option<u64>,
}

/// Row count of one store table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStat {
    pub name: &'static str,
    pub rows: u64,
}

pub struct DictStore {
    db: Database,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for DictStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictStore").field("path", &self.path).finish()
    }
}

/// Treat a table that was never created as absent rather than as a failure.
fn missing_ok<T>(opened: std::result::Result<T, TableError>) -> Result<Option<T>> {
    match opened {
        Ok(table) => Ok(Some(table)),
        Err(TableError::TableDoesNotExist(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn index_for(field: DictField) -> Option<MultimapTableDefinition<'static, &'static str, u64>> {
    match field {
        DictField::Traditional => Some(TRAD_INDEX),
        DictField::Simplified => Some(SIMP_INDEX),
        DictField::Jyutping => Some(JYUTPING_INDEX),
        _ => None,
    }
}

impl DictStore {
    /// Create or open a store file. Parent directories are created as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| DictError::io(parent, e))?;
            }
        }
        let db = Database::create(path)?;
        Ok(Self {
            db,
            path: Some(path.to_path_buf()),
        })
    }

    /// A store that lives only as long as this value.
    pub fn in_memory() -> Result<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Ok(Self { db, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Does the canonical table exist and hold rows?
    pub fn has_entries(&self) -> Result<bool> {
        Ok(self.entry_count()? > 0)
    }

    pub fn has_input_codes(&self) -> Result<bool> {
        let txn = self.db.begin_read()?;
        match missing_ok(txn.open_multimap_table(CJ_DICT))? {
            Some(table) => Ok(table.len()? > 0),
            None => Ok(false),
        }
    }

    pub fn entry_count(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        match missing_ok(txn.open_table(ENTRIES))? {
            Some(table) => Ok(table.len()?),
            None => Ok(0),
        }
    }

    /// Replace the canonical table, its indexes and the reconciliation metadata.
    pub fn replace_entries(&self, entries: &[DictEntry], meta: &StoreMeta) -> Result<()> {
        let txn = self.db.begin_write()?;
        txn.delete_table(ENTRIES)?;
        for index in [TRAD_INDEX, SIMP_INDEX, JYUTPING_INDEX] {
            txn.delete_multimap_table(index)?;
        }
        {
            let mut rows = txn.open_table(ENTRIES)?;
            let mut trad = txn.open_multimap_table(TRAD_INDEX)?;
            let mut simp = txn.open_multimap_table(SIMP_INDEX)?;
            let mut jyut = txn.open_multimap_table(JYUTPING_INDEX)?;

            for (id, entry) in (1u64..).zip(entries) {
                let bytes = bincode::serialize(entry)?;
                rows.insert(id, bytes.as_slice())?;
                trad.insert(entry.traditional.as_str(), id)?;
                simp.insert(entry.simplified.as_str(), id)?;
                if let Some(j) = entry.jyutping.as_deref() {
                    jyut.insert(j, id)?;
                }
            }

            let mut meta_table = txn.open_table(META)?;
            let encoded = bincode::serialize(meta)?;
            meta_table.insert(META_RECONCILE, encoded.as_slice())?;
        }
        txn.commit()?;
        info!(rows = entries.len(), "published canonical table and indexes");
        Ok(())
    }

    /// Replace both input-code tables.
    pub fn replace_input_codes(&self, codes: &CangjieTable) -> Result<()> {
        let txn = self.db.begin_write()?;
        txn.delete_table(CJ_SIGNS)?;
        txn.delete_multimap_table(CJ_DICT)?;
        {
            let mut signs = txn.open_table(CJ_SIGNS)?;
            for (key, glyph) in codes.signs() {
                let key = key.to_string();
                signs.insert(key.as_str(), glyph.as_str())?;
            }
            let mut dict = txn.open_multimap_table(CJ_DICT)?;
            for (character, code) in codes.code_pairs() {
                dict.insert(character, code)?;
            }
        }
        txn.commit()?;
        info!(
            keys = codes.signs().len(),
            characters = codes.character_count(),
            "published input-code tables"
        );
        Ok(())
    }

    /// All rows in id order.
    pub fn scan_entries(&self) -> Result<Vec<(u64, DictEntry)>> {
        let txn = self.db.begin_read()?;
        let Some(table) = missing_ok(txn.open_table(ENTRIES))? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for item in table.iter()? {
            let (id, bytes) = item?;
            out.push((id.value(), bincode::deserialize(bytes.value())?));
        }
        Ok(out)
    }

    /// Rows for the given ids, in the order given. Unknown ids are skipped.
    pub fn entries_by_ids(&self, ids: &[u64]) -> Result<Vec<(u64, DictEntry)>> {
        let txn = self.db.begin_read()?;
        let Some(table) = missing_ok(txn.open_table(ENTRIES))? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(bytes) = table.get(id)? {
                out.push((id, bincode::deserialize(bytes.value())?));
            }
        }
        Ok(out)
    }

    /// Row ids whose `field` equals `value`, via the secondary index.
    ///
    /// Returns `None` when the field has no index.
    pub fn lookup_ids(&self, field: DictField, value: &str) -> Result<Option<Vec<u64>>> {
        let Some(def) = index_for(field) else {
            return Ok(None);
        };
        let txn = self.db.begin_read()?;
        let Some(index) = missing_ok(txn.open_multimap_table(def))? else {
            return Ok(Some(Vec::new()));
        };
        let mut ids = Vec::new();
        for id in index.get(value)? {
            ids.push(id?.value());
        }
        Ok(Some(ids))
    }

    /// Rebuild the input-code table from storage, `None` when it was never loaded.
    pub fn load_input_codes(&self) -> Result<Option<CangjieTable>> {
        let txn = self.db.begin_read()?;
        let Some(dict) = missing_ok(txn.open_multimap_table(CJ_DICT))? else {
            return Ok(None);
        };

        let mut signs = BTreeMap::new();
        if let Some(sign_table) = missing_ok(txn.open_table(CJ_SIGNS))? {
            for item in sign_table.iter()? {
                let (key, glyph) = item?;
                let mut chars = key.value().chars();
                if let (Some(k), None) = (chars.next(), chars.next()) {
                    signs.insert(k, glyph.value().to_string());
                }
            }
        }

        let mut pairs = Vec::new();
        for item in dict.iter()? {
            let (character, codes) = item?;
            let character = character.value().to_string();
            for code in codes {
                pairs.push((character.clone(), code?.value().to_string()));
            }
        }
        Ok(Some(CangjieTable::from_parts(signs, pairs)))
    }

    /// Metadata of the last reconciliation, if any.
    pub fn reconcile_stats(&self) -> Result<Option<StoreMeta>> {
        let txn = self.db.begin_read()?;
        let Some(table) = missing_ok(txn.open_table(META))? else {
            return Ok(None);
        };
        match table.get(META_RECONCILE)? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes.value())?)),
            None => Ok(None),
        }
    }

    /// Row counts of every ccdict table; missing tables count as empty.
    pub fn table_stats(&self) -> Result<Vec<TableStat>> {
        let txn = self.db.begin_read()?;
        let mut stats = Vec::new();

        let rows = match missing_ok(txn.open_table(ENTRIES))? {
            Some(t) => t.len()?,
            None => 0,
        };
        stats.push(TableStat { name: "cc_canto", rows });

        for (name, def) in [
            ("cc_canto_trad", TRAD_INDEX),
            ("cc_canto_simp", SIMP_INDEX),
            ("cc_canto_jyutping", JYUTPING_INDEX),
        ] {
            let rows = match missing_ok(txn.open_multimap_table(def))? {
                Some(t) => t.len()?,
                None => 0,
            };
            stats.push(TableStat { name, rows });
        }

        let rows = match missing_ok(txn.open_table(CJ_SIGNS))? {
            Some(t) => t.len()?,
            None => 0,
        };
        stats.push(TableStat { name: "cj_sign_mappings", rows });

        let rows = match missing_ok(txn.open_multimap_table(CJ_DICT))? {
            Some(t) => t.len()?,
            None => 0,
        };
        stats.push(TableStat { name: "cj_dict", rows });

        let rows = match missing_ok(txn.open_table(META))? {
            Some(t) => t.len()?,
            None => 0,
        };
        stats.push(TableStat { name: "ccdict_meta", rows });

        Ok(stats)
    }
}
