//! Cangjie input-code table.
//!
//! The ibus-style definition file carries two tagged sections:
//!
//! ```text
//! BEGIN_CHAR_PROMPTS_DEFINITION
//! a 日
//! ...
//! END_CHAR_PROMPTS_DEFINITION
//! BEGIN_TABLE
//! hysit<TAB>艦<TAB>0
//! ...
//! END_TABLE
//! ```
//!
//! The first maps each alpha key to its radical glyph, the second maps codes
//! to characters. Everything outside those sections is ignored.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::error::{DictError, Result};

const PROMPTS_BEGIN: &str = "BEGIN_CHAR_PROMPTS_DEFINITION";
const PROMPTS_END: &str = "END_CHAR_PROMPTS_DEFINITION";
const TABLE_BEGIN: &str = "BEGIN_TABLE";
const TABLE_END: &str = "END_TABLE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Prompts,
    Table,
}

impl Section {
    fn end_tag(self) -> &'static str {
        match self {
            Section::Prompts => PROMPTS_END,
            Section::Table => TABLE_END,
        }
    }
}

/// Character → code multimap plus the key → glyph transliteration table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CangjieTable {
    signs: BTreeMap<char, String>,
    codes: BTreeMap<String, Vec<String>>,
    characters: BTreeMap<String, Vec<String>>,
}

impl CangjieTable {
    /// Build a table from already-validated parts. Codes are sorted and deduplicated.
    pub fn from_parts<I>(signs: BTreeMap<char, String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut table = Self {
            signs,
            ..Self::default()
        };
        for (character, code) in pairs {
            table.insert_code(character, code);
        }
        table.finish();
        table
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DictError::io(path, e))?;
        let table = Self::parse_with_path(BufReader::new(file), Some(path))?;
        info!(
            path = %path.display(),
            keys = table.signs.len(),
            characters = table.codes.len(),
            "loaded input-code table"
        );
        Ok(table)
    }

    /// Parse a definition file from any buffered reader.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        Self::parse_with_path(reader, None)
    }

    fn parse_with_path<R: BufRead>(reader: R, path: Option<&Path>) -> Result<Self> {
        let mut signs = BTreeMap::new();
        let mut pairs = Vec::new();
        let mut current: Option<Section> = None;
        let mut seen_prompts = false;
        let mut seen_table = false;
        let mut line_no = 0usize;

        for line in reader.lines() {
            line_no += 1;
            let line = line.map_err(|e| match path {
                Some(p) => DictError::io(p, e),
                None => DictError::io("<reader>", e),
            })?;
            let trimmed = line.trim_matches(|c: char| c == '\u{feff}' || c == '\r' || c == '\n');

            match current {
                None => match trimmed.trim() {
                    PROMPTS_BEGIN => {
                        current = Some(Section::Prompts);
                        seen_prompts = true;
                    }
                    TABLE_BEGIN => {
                        current = Some(Section::Table);
                        seen_table = true;
                    }
                    _ => {}
                },
                Some(section) => {
                    let tag = trimmed.trim();
                    if tag == section.end_tag() {
                        current = None;
                        continue;
                    }
                    if tag.starts_with("BEGIN_") {
                        return Err(format_error(
                            line_no,
                            format!("{} opened before {}", tag, section.end_tag()),
                        ));
                    }
                    if tag.is_empty() {
                        continue;
                    }
                    match section {
                        Section::Prompts => {
                            let (key, glyph) = parse_prompt_line(tag, line_no)?;
                            signs.insert(key, glyph);
                        }
                        Section::Table => pairs.push(parse_table_line(trimmed, line_no)?),
                    }
                }
            }
        }

        if let Some(section) = current {
            return Err(format_error(line_no, format!("missing {}", section.end_tag())));
        }
        if !seen_prompts {
            return Err(format_error(line_no, format!("missing {} section", PROMPTS_BEGIN)));
        }
        if !seen_table {
            return Err(format_error(line_no, format!("missing {} section", TABLE_BEGIN)));
        }

        Ok(Self::from_parts(signs, pairs))
    }

    fn insert_code(&mut self, character: String, code: String) {
        self.characters
            .entry(code.clone())
            .or_default()
            .push(character.clone());
        self.codes.entry(character).or_default().push(code);
    }

    fn finish(&mut self) {
        for list in self.codes.values_mut().chain(self.characters.values_mut()) {
            list.sort();
            list.dedup();
        }
    }

    /// Render a code through the key glyphs; unknown keys pass through unchanged.
    pub fn translate(&self, code: &str) -> String {
        code.chars()
            .map(|k| match self.signs.get(&k) {
                Some(glyph) => glyph.clone(),
                None => k.to_string(),
            })
            .collect()
    }

    /// Input codes of a character, sorted. Empty when the character has none.
    pub fn codes_for(&self, character: &str) -> &[String] {
        self.codes.get(character).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Characters typed by an input code, sorted.
    pub fn characters_for(&self, code: &str) -> &[String] {
        self.characters.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn signs(&self) -> &BTreeMap<char, String> {
        &self.signs
    }

    /// `(character, code)` pairs in character order.
    pub fn code_pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.codes
            .iter()
            .flat_map(|(ch, codes)| codes.iter().map(move |c| (ch.as_str(), c.as_str())))
    }

    pub fn character_count(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signs.is_empty() && self.codes.is_empty()
    }
}

fn parse_prompt_line(line: &str, line_no: usize) -> Result<(char, String)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 2 {
        return Err(format_error(
            line_no,
            format!("expected `key glyph`, found {} fields", fields.len()),
        ));
    }
    let mut chars = fields[0].chars();
    match (chars.next(), chars.next()) {
        (Some(key), None) => Ok((key, fields[1].to_string())),
        _ => Err(format_error(
            line_no,
            format!("key {:?} is not a single character", fields[0]),
        )),
    }
}

fn parse_table_line(line: &str, line_no: usize) -> Result<(String, String)> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 3 {
        return Err(format_error(
            line_no,
            format!("expected `code<TAB>character<TAB>weight`, found {} fields", fields.len()),
        ));
    }
    let code = fields[0].trim();
    let character = fields[1].trim();
    if code.is_empty() || character.is_empty() {
        return Err(format_error(line_no, "empty code or character".to_string()));
    }
    Ok((character.to_string(), code.to_string()))
}

fn format_error(line: usize, reason: String) -> DictError {
    DictError::InputCodeFormat { line, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "### header\nVALID_INPUT_CHARS = abc\nBEGIN_CHAR_PROMPTS_DEFINITION\nh 竹\ny 卜\ns 尸\ni 戈\nt 廿\nm 一\nEND_CHAR_PROMPTS_DEFINITION\nBEGIN_TABLE\nhysit\t艦\t0\nhysmt\t艦\t0\nhysit\t艦\t0\nhjd\t朱\t0\nEND_TABLE\n";

    #[test]
    fn parses_both_sections() {
        let table = CangjieTable::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.codes_for("艦"), ["hysit", "hysmt"]);
        assert_eq!(table.characters_for("hjd"), ["朱"]);
        assert!(table.codes_for("吼").is_empty());
        assert_eq!(table.character_count(), 2);
    }

    #[test]
    fn translate_passes_unknown_keys_through() {
        let table = CangjieTable::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.translate("hysit"), "竹卜尸戈廿");
        assert_eq!(table.translate("hjd"), "竹jd");
    }

    #[test]
    fn wrong_field_count_reports_line() {
        let bad = SAMPLE.replace("hjd\t朱\t0", "hjd\t朱");
        match CangjieTable::parse(bad.as_bytes()) {
            Err(DictError::InputCodeFormat { line, .. }) => assert_eq!(line, 15),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn multi_character_key_is_rejected() {
        let bad = SAMPLE.replace("h 竹", "hh 竹");
        assert!(matches!(
            CangjieTable::parse(bad.as_bytes()),
            Err(DictError::InputCodeFormat { line: 4, .. })
        ));
    }

    #[test]
    fn missing_end_tag_is_rejected() {
        let bad = SAMPLE.replace("END_TABLE\n", "");
        assert!(matches!(
            CangjieTable::parse(bad.as_bytes()),
            Err(DictError::InputCodeFormat { .. })
        ));
    }

    #[test]
    fn missing_section_is_rejected() {
        let only_table = "BEGIN_TABLE\nhjd\t朱\t0\nEND_TABLE\n";
        let err = CangjieTable::parse(only_table.as_bytes()).unwrap_err();
        assert!(err.to_string().contains(PROMPTS_BEGIN));
    }

    #[test]
    fn from_parts_sorts_codes() {
        let table = CangjieTable::from_parts(
            BTreeMap::new(),
            vec![
                ("艦".to_string(), "hysmt".to_string()),
                ("艦".to_string(), "hysit".to_string()),
            ],
        );
        assert_eq!(table.codes_for("艦"), ["hysit", "hysmt"]);
        assert_eq!(table.code_pairs().count(), 2);
    }
}
