//! Search query builder and result aggregation.
//!
//! A query is a set of `(field, value, mode)` terms, AND-combined. A bare text
//! query is expanded into one term per candidate field and the fields are
//! tried in turn (lazily or as a union).
//!
//! Matching rows are aggregated in two stages:
//! 1. by gloss: `(traditional, english, simplified)`, plus pinyin when
//!    pinyin is not flattened, collecting the gloss's jyutping readings;
//! 2. by reading set: `(traditional, jyutping-list, simplified)`, plus
//!    pinyin when not flattened, collecting the glosses.
//!
//! Results are ordered by traditional, the JSON form of the jyutping list,
//! pinyin (non-flattened only) and simplified.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cangjie::CangjieTable;
use crate::entry::{DictEntry, DictField};
use crate::error::{DictError, Result};
use crate::store::DictStore;
use crate::utils::{contains_han, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Exact,
    /// Unanchored regular-expression search.
    Regex,
}

impl MatchMode {
    pub fn from_regex_flag(use_regex: bool) -> Self {
        if use_regex {
            MatchMode::Regex
        } else {
            MatchMode::Exact
        }
    }

    /// Regex for free-text fields, exact everywhere else.
    pub fn default_for(field: DictField) -> Self {
        Self::from_regex_flag(field.prefers_regex())
    }
}

/// One `(field, value, mode)` predicate. `mode: None` picks the field default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    pub field: DictField,
    pub value: String,
    pub mode: Option<MatchMode>,
}

impl SearchTerm {
    pub fn new<V: Into<String>>(field: DictField, value: V) -> Self {
        Self {
            field,
            value: value.into(),
            mode: None,
        }
    }

    pub fn exact<V: Into<String>>(field: DictField, value: V) -> Self {
        Self {
            mode: Some(MatchMode::Exact),
            ..Self::new(field, value)
        }
    }

    pub fn regex<V: Into<String>>(field: DictField, value: V) -> Self {
        Self {
            mode: Some(MatchMode::Regex),
            ..Self::new(field, value)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchExpr {
    /// A single value, matched against one or several candidate fields.
    Text(String),
    /// Explicit terms, all of which must match.
    Terms(Vec<SearchTerm>),
}

/// Search behaviour knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Field for a text query. `None` lets `try_all_fields` pick.
    pub search_field: Option<DictField>,
    /// Force regex (`true`) or exact (`false`) matching on every term.
    pub use_regex: Option<bool>,
    /// Try every plausible field for a text query without an explicit field.
    pub try_all_fields: bool,
    /// Stop at the first candidate field that yields results.
    pub lazy: bool,
    /// Group results across pinyin readings.
    pub flatten_pinyin: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            search_field: None,
            use_regex: None,
            try_all_fields: true,
            lazy: true,
            flatten_pinyin: true,
        }
    }
}

/// One aggregated search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedResult {
    pub traditional: String,
    pub simplified: String,
    pub pinyin: Vec<String>,
    pub jyutping: Vec<String>,
    pub english: Vec<String>,
    pub comment: Vec<String>,
    pub cjcode: Vec<String>,
}

enum Matcher {
    Exact(String),
    Regex(Regex),
}

impl Matcher {
    fn is_match(&self, subject: &str) -> bool {
        match self {
            Matcher::Exact(value) => subject == value,
            Matcher::Regex(re) => re.is_match(subject),
        }
    }
}

struct CompiledTerm {
    field: DictField,
    value: String,
    mode: MatchMode,
    matcher: Matcher,
}

impl CompiledTerm {
    fn compile(term: &SearchTerm, options: &SearchOptions) -> Result<Self> {
        let mode = options
            .use_regex
            .map(MatchMode::from_regex_flag)
            .or(term.mode)
            .unwrap_or_else(|| MatchMode::default_for(term.field));
        // Stored glosses and comments are NFC; headwords and readings are verbatim.
        let value = match term.field {
            DictField::English | DictField::Comment => normalize(&term.value),
            _ => term.value.clone(),
        };
        let matcher = match mode {
            MatchMode::Exact => Matcher::Exact(value.clone()),
            MatchMode::Regex => Matcher::Regex(Regex::new(&value).map_err(|source| {
                DictError::InvalidPattern {
                    pattern: value.clone(),
                    source,
                }
            })?),
        };
        Ok(Self {
            field: term.field,
            value,
            mode,
            matcher,
        })
    }

    fn matches(&self, entry: &DictEntry, codes: &CangjieTable) -> bool {
        match self.field {
            DictField::CjCode => codes
                .codes_for(&entry.traditional)
                .iter()
                .any(|code| self.matcher.is_match(code)),
            field => entry.field(field).is_some_and(|v| self.matcher.is_match(v)),
        }
    }
}

/// Fields tried for a text query, in order.
pub fn candidate_fields(text: &str, options: &SearchOptions) -> Vec<DictField> {
    match options.search_field {
        Some(field) => vec![field],
        None if options.try_all_fields => {
            if contains_han(text) {
                vec![DictField::Traditional, DictField::Simplified]
            } else {
                vec![DictField::Jyutping, DictField::English, DictField::CjCode]
            }
        }
        None => vec![DictField::Traditional],
    }
}

/// Run a search against the store.
pub fn search(
    store: &DictStore,
    codes: &CangjieTable,
    expr: &SearchExpr,
    options: &SearchOptions,
) -> Result<Vec<GroupedResult>> {
    match expr {
        SearchExpr::Terms(terms) => search_terms(store, codes, terms, options),
        SearchExpr::Text(text) => {
            let mut results: Vec<GroupedResult> = Vec::new();
            for field in candidate_fields(text, options) {
                let found = search_terms(store, codes, &[SearchTerm::new(field, text.clone())], options)?;
                if options.lazy && !found.is_empty() {
                    return Ok(found);
                }
                for group in found {
                    if !results.contains(&group) {
                        results.push(group);
                    }
                }
            }
            Ok(results)
        }
    }
}

fn search_terms(
    store: &DictStore,
    codes: &CangjieTable,
    terms: &[SearchTerm],
    options: &SearchOptions,
) -> Result<Vec<GroupedResult>> {
    let compiled = terms
        .iter()
        .map(|t| CompiledTerm::compile(t, options))
        .collect::<Result<Vec<_>>>()?;

    let candidates = match narrowing_ids(store, codes, &compiled)? {
        Some(ids) => {
            debug!(candidates = ids.len(), "query narrowed through index");
            store.entries_by_ids(&ids)?
        }
        None => {
            debug!("query scans the canonical table");
            store.scan_entries()?
        }
    };

    let rows: Vec<DictEntry> = candidates
        .into_iter()
        .map(|(_, entry)| entry)
        .filter(|entry| compiled.iter().all(|t| t.matches(entry, codes)))
        .collect();
    debug!(terms = compiled.len(), rows = rows.len(), "query matched rows");

    aggregate(&rows, codes, options.flatten_pinyin)
}

/// Row ids reachable through an index from the first exact indexed term.
fn narrowing_ids(
    store: &DictStore,
    codes: &CangjieTable,
    terms: &[CompiledTerm],
) -> Result<Option<Vec<u64>>> {
    for term in terms.iter().filter(|t| t.mode == MatchMode::Exact) {
        let ids = if term.field == DictField::CjCode {
            let mut ids = Vec::new();
            for character in codes.characters_for(&term.value) {
                if let Some(found) = store.lookup_ids(DictField::Traditional, character)? {
                    ids.extend(found);
                }
            }
            Some(ids)
        } else {
            store.lookup_ids(term.field, &term.value)?
        };
        if let Some(mut ids) = ids {
            ids.sort_unstable();
            ids.dedup();
            return Ok(Some(ids));
        }
    }
    Ok(None)
}

type GlossKey = (String, Option<String>, Option<String>, String);
type ReadingKey = (String, String, Option<String>, String);

#[derive(Default)]
struct GlossGroup {
    jyutping: Vec<String>,
    pinyin: Vec<String>,
    comment: Vec<String>,
}

struct ReadingGroup {
    traditional: String,
    simplified: String,
    jyutping: Vec<String>,
    pinyin: Vec<String>,
    english: Vec<String>,
    comment: Vec<String>,
}

fn push_distinct(list: &mut Vec<String>, value: Option<&String>) {
    if let Some(v) = value {
        if !list.contains(v) {
            list.push(v.clone());
        }
    }
}

/// Group matching rows into results.
pub fn aggregate(rows: &[DictEntry], codes: &CangjieTable, flatten_pinyin: bool) -> Result<Vec<GroupedResult>> {
    let mut glosses: BTreeMap<GlossKey, GlossGroup> = BTreeMap::new();
    for row in rows {
        let pinyin_key = if flatten_pinyin { None } else { row.pinyin.clone() };
        let key = (
            row.traditional.clone(),
            row.english.clone(),
            pinyin_key,
            row.simplified.clone(),
        );
        let group = glosses.entry(key).or_default();
        push_distinct(&mut group.jyutping, row.jyutping.as_ref());
        push_distinct(&mut group.pinyin, row.pinyin.as_ref());
        push_distinct(&mut group.comment, row.comment.as_ref());
    }

    let mut readings: BTreeMap<ReadingKey, ReadingGroup> = BTreeMap::new();
    for ((traditional, english, pinyin_key, simplified), mut gloss) in glosses {
        // Reading sets compare by content; arrival order differs between sources.
        gloss.jyutping.sort();
        let jyut_key = serde_json::to_string(&gloss.jyutping)?;
        let key = (traditional.clone(), jyut_key, pinyin_key, simplified.clone());
        let group = readings.entry(key).or_insert_with(|| ReadingGroup {
            traditional,
            simplified,
            jyutping: gloss.jyutping.clone(),
            pinyin: Vec::new(),
            english: Vec::new(),
            comment: Vec::new(),
        });
        for p in &gloss.pinyin {
            push_distinct(&mut group.pinyin, Some(p));
        }
        for c in &gloss.comment {
            push_distinct(&mut group.comment, Some(c));
        }
        push_distinct(&mut group.english, english.as_ref());
    }

    Ok(readings
        .into_values()
        .map(|mut group| {
            group.english.sort();
            let cjcode = codes.codes_for(&group.traditional).to_vec();
            GroupedResult {
                traditional: group.traditional,
                simplified: group.simplified,
                pinyin: group.pinyin,
                jyutping: group.jyutping,
                english: group.english,
                comment: group.comment,
                cjcode,
            }
        })
        .collect())
}
