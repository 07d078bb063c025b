//! Line parser for CC-CEDICT style dictionary lines.
//!
//! Every source understood by the reconciler shares one grammar:
//!
//! ```text
//! TRAD SIMP [PINYIN] {JYUTPING}? /ENG1/ENG2/.../? # COMMENT?
//! ```
//!
//! A line expands into the Cartesian product of its jyutping readings and its
//! glosses, jyutping-major, with `None` standing in for an absent group.
//! Headwords are kept exactly as written; glosses and comments are NFC-normalized.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::entry::DictEntry;
use crate::error::{DictError, Result};
use crate::utils::normalize;

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<traditional>\S+)\s+(?P<simplified>\S+)\s+\[(?P<pinyin>[^\]]*)\]\s*(?:\{(?P<jyutping>[^}]*)\})?\s*(?:/(?P<english>.*)/)?\s*(?:#\s+(?P<comment>.*))?",
    )
    .expect("dictionary line pattern is valid")
});

/// True for lines the loaders skip without parsing.
pub fn is_comment(line: &str) -> bool {
    line.starts_with('#')
}

/// Parse one dictionary line into its expanded rows.
///
/// Fails with [`DictError::Parse`] when the headwords or the pinyin bracket
/// are missing.
pub fn parse_dict_line(line: &str) -> Result<Vec<DictEntry>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let caps = LINE_RE.captures(line).ok_or_else(|| DictError::Parse {
        line: line.to_string(),
    })?;

    let traditional = caps["traditional"].to_string();
    let simplified = caps["simplified"].to_string();

    let pinyin = caps["pinyin"].trim().to_lowercase();
    let pinyin = (!pinyin.is_empty()).then_some(pinyin);

    let jyutping: Vec<Option<String>> = match caps.name("jyutping") {
        Some(m) => placeholder_if_empty(
            m.as_str()
                .split('/')
                .map(|j| j.trim().to_lowercase())
                .filter(|j| !j.is_empty())
                .collect(),
        ),
        None => vec![None],
    };

    let english: Vec<Option<String>> = match caps.name("english") {
        Some(m) => placeholder_if_empty(
            m.as_str()
                .split('/')
                .map(normalize)
                .filter(|e| !e.is_empty())
                .collect(),
        ),
        None => vec![None],
    };

    let comment = caps
        .name("comment")
        .map(|m| normalize(m.as_str()))
        .filter(|c| !c.is_empty());

    let mut entries = Vec::with_capacity(jyutping.len() * english.len());
    for jyut in &jyutping {
        for eng in &english {
            entries.push(DictEntry {
                traditional: traditional.clone(),
                simplified: simplified.clone(),
                pinyin: pinyin.clone(),
                jyutping: jyut.clone(),
                english: eng.clone(),
                comment: comment.clone(),
            });
        }
    }
    Ok(entries)
}

fn placeholder_if_empty(values: Vec<String>) -> Vec<Option<String>> {
    if values.is_empty() {
        vec![None]
    } else {
        values.into_iter().map(Some).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cedict_line_with_single_gloss() {
        let entries = parse_dict_line("% % [pa1] /percent (Tw)/").unwrap();
        assert_eq!(
            entries,
            vec![DictEntry::new("%", "%").with_pinyin("pa1").with_english("percent (Tw)")]
        );
    }

    #[test]
    fn hash_inside_gloss_is_not_a_comment() {
        let entries =
            parse_dict_line("井號 井号 [jing3 hao4] /number sign # (punctuation)/hash symbol/pound sign/")
                .unwrap();
        let glosses: Vec<_> = entries.iter().map(|e| e.english.as_deref().unwrap()).collect();
        assert_eq!(glosses, ["number sign # (punctuation)", "hash symbol", "pound sign"]);
        assert!(entries.iter().all(|e| e.comment.is_none() && e.jyutping.is_none()));
        assert!(entries.iter().all(|e| e.pinyin.as_deref() == Some("jing3 hao4")));
    }

    #[test]
    fn canto_line_expands_jyutping_major() {
        let entries =
            parse_dict_line("吼 吼 [hou3] {hau1/hau4} /to watch closely/to keep an eye on/to target/")
                .unwrap();
        assert_eq!(entries.len(), 6);
        let pairs: Vec<_> = entries
            .iter()
            .map(|e| (e.jyutping.as_deref().unwrap(), e.english.as_deref().unwrap()))
            .collect();
        assert_eq!(pairs[0], ("hau1", "to watch closely"));
        assert_eq!(pairs[2], ("hau1", "to target"));
        assert_eq!(pairs[3], ("hau4", "to watch closely"));
    }

    #[test]
    fn bridge_line_has_no_gloss() {
        let entries = parse_dict_line("艦 舰 [jian4] {LAAM6}").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].jyutping.as_deref(), Some("laam6"));
        assert_eq!(entries[0].english, None);
    }

    #[test]
    fn trailing_comment_is_kept() {
        let entries =
            parse_dict_line("一丁點 一丁点 [yi1 ding1 dian3] {jat1 ding1 dim2} /a tiny bit/ # adapted from cc-cedict")
                .unwrap();
        assert_eq!(entries[0].comment.as_deref(), Some("adapted from cc-cedict"));
        assert_eq!(entries[0].english.as_deref(), Some("a tiny bit"));
    }

    #[test]
    fn empty_pinyin_and_groups_become_none() {
        let entries = parse_dict_line("㗎 㗎 [] {} //").unwrap();
        assert_eq!(entries, vec![DictEntry::new("㗎", "㗎")]);
    }

    #[test]
    fn uppercase_pinyin_is_lowered() {
        let entries = parse_dict_line("元 元 [Yuan2] /surname Yuan/").unwrap();
        assert_eq!(entries[0].pinyin.as_deref(), Some("yuan2"));
    }

    #[test]
    fn compatibility_ideographs_are_not_rewritten() {
        let entries = parse_dict_line("\u{F90A} \u{F90A} [jin1] /gold/").unwrap();
        assert_eq!(entries[0].traditional, "\u{F90A}");
        assert_eq!(entries[0].simplified, "\u{F90A}");
    }

    #[test]
    fn glosses_are_composed() {
        let entries = parse_dict_line("咖啡館 咖啡馆 [ka1 fei1 guan3] /cafe\u{301}/").unwrap();
        assert_eq!(entries[0].english.as_deref(), Some("caf\u{E9}"));
    }

    #[test]
    fn missing_pinyin_is_a_parse_error() {
        assert!(matches!(parse_dict_line("艦 舰 /warship/"), Err(DictError::Parse { .. })));
        assert!(matches!(parse_dict_line("艦"), Err(DictError::Parse { .. })));
        assert!(matches!(parse_dict_line(""), Err(DictError::Parse { .. })));
    }

    #[test]
    fn comment_lines_are_detected() {
        assert!(is_comment("# CC-CEDICT"));
        assert!(!is_comment("井號 井号 [jing3 hao4] /number sign # (punctuation)/"));
    }
}
