use std::path::{Path, PathBuf};

use ccdict_core::dictionary::{
    DEFAULT_CANGJIE_FILE, DEFAULT_CANTO_FILE, DEFAULT_CEDICT_CANTO_FILE, DEFAULT_CEDICT_FILE,
};
use ccdict_core::{DictError, DictSources, Result};
use serde::{Deserialize, Serialize};

/// ccdict configuration: core search/display defaults plus file locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CcdictConfig {
    #[serde(flatten)]
    pub base: ccdict_core::Config,

    /// Directory holding the dictionary sources and the Cangjie table.
    pub dict_dir: PathBuf,
    pub canto_file: String,
    pub cedict_file: String,
    pub cedict_canto_file: String,
    pub cangjie_file: String,

    /// Database file; relative paths are taken as-is, not under `dict_dir`.
    pub db_path: PathBuf,

    /// Parse at most this many lines of each source (handy for quick rebuilds).
    pub max_source_lines: Option<usize>,
}

impl Default for CcdictConfig {
    fn default() -> Self {
        Self {
            base: ccdict_core::Config::default(),
            dict_dir: PathBuf::from("dict"),
            canto_file: DEFAULT_CANTO_FILE.to_string(),
            cedict_file: DEFAULT_CEDICT_FILE.to_string(),
            cedict_canto_file: DEFAULT_CEDICT_CANTO_FILE.to_string(),
            cangjie_file: DEFAULT_CANGJIE_FILE.to_string(),
            db_path: PathBuf::from("ccdict.redb"),
            max_source_lines: None,
        }
    }
}

impl CcdictConfig {
    pub fn into_base(self) -> ccdict_core::Config {
        self.base
    }

    pub fn base(&self) -> &ccdict_core::Config {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut ccdict_core::Config {
        &mut self.base
    }

    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DictError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DictError::Config(e.to_string()))
    }

    pub fn sources(&self) -> DictSources {
        DictSources {
            canto: self.dict_dir.join(&self.canto_file),
            cedict: self.dict_dir.join(&self.cedict_file),
            cedict_canto: self.dict_dir.join(&self.cedict_canto_file),
            max_lines: self.max_source_lines,
        }
    }

    pub fn cangjie_path(&self) -> PathBuf {
        self.dict_dir.join(&self.cangjie_file)
    }
}
