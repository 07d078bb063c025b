//! ccdict-core
//!
//! Cantonese/Mandarin dictionary engine shared by the `ccdict` tools.
//!
//! Three CC-CEDICT-style sources (CC-Canto, CC-CEDICT and the CC-CEDICT-Canto
//! reading bridge) are parsed, reconciled into one canonical entry set and
//! published to a redb store together with a Cangjie input-code table. Searches
//! run against that store and come back grouped per headword and reading set.
//!
//! Public API:
//! - `CantoDict` - store owner; reconcile, load input codes, search, format
//! - `DictEntry` / `DictField` - canonical row and its column names
//! - `parse_dict_line` / `parse_dict_file` - source parsing
//! - `reconcile` - the three-source merge
//! - `CangjieTable` - character ↔ code map and key glyphs
//! - `DictStore` - redb tables and indexes
//! - `SearchExpr` / `SearchOptions` / `GroupedResult` - queries and results
//! - `FormatOptions` / `format_result` - ASCII and JSON rendering
//! - `Config` - search and display defaults, TOML-backed
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{DictError, Result};

pub mod entry;
pub use entry::{DictEntry, DictField, HeadwordKey, RowKey, SenseKey};

pub mod parser;
pub use parser::{is_comment, parse_dict_line};

pub mod loader;
pub use loader::parse_dict_file;

pub mod reconcile;
pub use reconcile::{reconcile, ReconcileStats, Reconciled};

pub mod cangjie;
pub use cangjie::CangjieTable;

pub mod store;
pub use store::{DictStore, StoreMeta, TableStat};

pub mod search;
pub use search::{GroupedResult, MatchMode, SearchExpr, SearchOptions, SearchTerm};

pub mod format;
pub use format::{default_fields, format_result, FormatOptions, OutputFormat};

pub mod dictionary;
pub use dictionary::{CantoDict, DictSources};

/// Search and display defaults.
///
/// Language-independent; the `ccdict` binary flattens this into its own
/// config and adds file locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchOptions,
    pub format: FormatOptions,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DictError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| DictError::io(path, e))
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DictError::Config(e.to_string()))
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DictError::Config(e.to_string()))
    }
}

pub mod utils {
    /// Normalize input strings (NFC) and trim whitespace.
    pub fn normalize(s: &str) -> String {
        use unicode_normalization::UnicodeNormalization;
        s.nfc().collect::<String>().trim().to_string()
    }

    /// CJK Unified Ideographs with extensions A-H, plus the compatibility blocks.
    const HAN_RANGES: [(u32, u32); 11] = [
        (0x4E00, 0x9FFF),
        (0x3400, 0x4DBF),
        (0x20000, 0x2A6DF),
        (0x2A700, 0x2B73F),
        (0x2B740, 0x2B81F),
        (0x2B820, 0x2CEAF),
        (0x2CEB0, 0x2EBEF),
        (0x30000, 0x3134F),
        (0x31350, 0x323AF),
        (0xF900, 0xFAFF),
        (0x2F800, 0x2FA1F),
    ];

    pub fn is_han(ch: char) -> bool {
        let cp = ch as u32;
        HAN_RANGES.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
    }

    /// Does the text contain at least one Han character?
    pub fn contains_han(s: &str) -> bool {
        s.chars().any(is_han)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_toml_round_trip() {
        let mut cfg = Config::default();
        cfg.search.search_field = Some(DictField::English);
        cfg.search.lazy = false;
        cfg.format.output_format = OutputFormat::Json;
        cfg.format.fields = vec![DictField::Traditional, DictField::Pinyin];
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let cfg = Config::from_toml_str("[format]\ncompact = true\n").unwrap();
        assert!(cfg.format.compact);
        assert_eq!(cfg.format.fields, default_fields());
        assert!(cfg.search.try_all_fields);
    }

    #[test]
    fn bad_field_name_in_config_is_rejected() {
        let err = Config::from_toml_str("[format]\nfields = [\"colour\"]\n").unwrap_err();
        assert!(matches!(err, DictError::Config(_)));
    }

    #[test]
    fn han_detection() {
        assert!(utils::contains_han("jyun 元"));
        assert!(utils::contains_han("\u{3400}"));
        assert!(utils::contains_han("\u{20021}"));
        assert!(!utils::contains_han("jyun4"));
        assert!(!utils::contains_han("ー"));
    }

    #[test]
    fn normalize_trims() {
        assert_eq!(utils::normalize("  艦 "), "艦");
    }
}
