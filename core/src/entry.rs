//! Dictionary entry and field types.
//!
//! `DictEntry` is the canonical row: one headword, one reading pair and at
//! most one English gloss. `DictField` names the columns of that row plus the
//! Cangjie code column contributed by the input-code table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DictError;

/// Column identifiers for dictionary rows and search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DictField {
    Traditional,
    Simplified,
    Pinyin,
    Jyutping,
    English,
    Comment,
    #[serde(rename = "cjcode")]
    CjCode,
}

impl DictField {
    pub const ALL: [DictField; 7] = [
        DictField::Traditional,
        DictField::Simplified,
        DictField::Pinyin,
        DictField::Jyutping,
        DictField::English,
        DictField::Comment,
        DictField::CjCode,
    ];

    /// Column name, also used as the table column / JSON key.
    pub fn name(self) -> &'static str {
        match self {
            DictField::Traditional => "traditional",
            DictField::Simplified => "simplified",
            DictField::Pinyin => "pinyin",
            DictField::Jyutping => "jyutping",
            DictField::English => "english",
            DictField::Comment => "comment",
            DictField::CjCode => "cjcode",
        }
    }

    /// One-line description used by the shell's field help.
    pub fn description(self) -> &'static str {
        match self {
            DictField::Traditional => "traditional Chinese",
            DictField::Simplified => "simplified Chinese",
            DictField::Pinyin => "Pinyin transcription",
            DictField::Jyutping => "Jyutping transcription",
            DictField::English => "English definition",
            DictField::Comment => "source comment",
            DictField::CjCode => "Cangjie code",
        }
    }

    /// Regex search is the natural mode for free text, exact match for everything else.
    pub fn prefers_regex(self) -> bool {
        self == DictField::English
    }
}

impl fmt::Display for DictField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DictField {
    type Err = DictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s.trim() {
            "traditional" | "trad" | "DE_FLD_TRAD" | "DF_TRAD" => DictField::Traditional,
            "simplified" | "simp" | "DE_FLD_SIMP" | "DF_SIMP" => DictField::Simplified,
            "pinyin" | "DE_FLD_PINYIN" | "DF_PINYIN" => DictField::Pinyin,
            "jyutping" | "jyut" | "DE_FLD_JYUTPING" | "DF_JYUTPING" => DictField::Jyutping,
            "english" | "eng" | "DE_FLD_ENGLISH" | "DF_ENGLISH" => DictField::English,
            "comment" | "DE_FLD_COMMENT" | "DF_COMMENT" => DictField::Comment,
            "cjcode" | "cj" | "DE_FLD_CJCODE" | "DF_CJCODE" => DictField::CjCode,
            other => return Err(DictError::UnknownField(other.to_string())),
        };
        Ok(field)
    }
}

/// One canonical dictionary row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DictEntry {
    pub traditional: String,
    pub simplified: String,
    pub pinyin: Option<String>,
    pub jyutping: Option<String>,
    pub english: Option<String>,
    pub comment: Option<String>,
}

impl DictEntry {
    pub fn new<T: Into<String>, S: Into<String>>(traditional: T, simplified: S) -> Self {
        Self {
            traditional: traditional.into(),
            simplified: simplified.into(),
            pinyin: None,
            jyutping: None,
            english: None,
            comment: None,
        }
    }

    pub fn with_pinyin<P: Into<String>>(mut self, pinyin: P) -> Self {
        self.pinyin = Some(pinyin.into());
        self
    }

    pub fn with_jyutping<J: Into<String>>(mut self, jyutping: J) -> Self {
        self.jyutping = Some(jyutping.into());
        self
    }

    pub fn with_english<E: Into<String>>(mut self, english: E) -> Self {
        self.english = Some(english.into());
        self
    }

    pub fn with_comment<C: Into<String>>(mut self, comment: C) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Value of a row column. `CjCode` is not a row column and always yields `None`.
    pub fn field(&self, field: DictField) -> Option<&str> {
        match field {
            DictField::Traditional => Some(&self.traditional),
            DictField::Simplified => Some(&self.simplified),
            DictField::Pinyin => self.pinyin.as_deref(),
            DictField::Jyutping => self.jyutping.as_deref(),
            DictField::English => self.english.as_deref(),
            DictField::Comment => self.comment.as_deref(),
            DictField::CjCode => None,
        }
    }

    /// Structural key shared by CEDICT and CEDICT-Canto rows.
    pub fn headword_key(&self) -> HeadwordKey {
        HeadwordKey {
            traditional: self.traditional.clone(),
            simplified: self.simplified.clone(),
            pinyin: self.pinyin.clone(),
        }
    }

    /// De-duplication key: one English sense of one headword reading.
    pub fn sense_key(&self) -> SenseKey {
        SenseKey {
            headword: self.headword_key(),
            english: self.english.clone(),
        }
    }

    /// Identity of a canonical row; the comment is not part of it.
    pub fn row_key(&self) -> RowKey {
        RowKey {
            sense: self.sense_key(),
            jyutping: self.jyutping.clone(),
        }
    }
}

/// `(traditional, simplified, pinyin)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadwordKey {
    pub traditional: String,
    pub simplified: String,
    pub pinyin: Option<String>,
}

/// `(traditional, simplified, pinyin, english)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SenseKey {
    pub headword: HeadwordKey,
    pub english: Option<String>,
}

/// `(traditional, simplified, pinyin, jyutping, english)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey {
    pub sense: SenseKey,
    pub jyutping: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_round_trip() {
        for field in DictField::ALL {
            assert_eq!(field.name().parse::<DictField>().unwrap(), field);
        }
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        assert_eq!("DE_FLD_TRAD".parse::<DictField>().unwrap(), DictField::Traditional);
        assert_eq!("DF_JYUTPING".parse::<DictField>().unwrap(), DictField::Jyutping);
        assert_eq!("cj".parse::<DictField>().unwrap(), DictField::CjCode);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = "__import__('os')".parse::<DictField>().unwrap_err();
        assert!(matches!(err, DictError::UnknownField(_)));
        assert!(err.is_query_error());
    }

    #[test]
    fn keys_ignore_comment() {
        let a = DictEntry::new("朱", "朱").with_pinyin("zhu1").with_english("vermilion");
        let b = a.clone().with_comment("adapted from cc-cedict");
        assert_eq!(a.row_key(), b.row_key());
        assert_eq!(a.sense_key(), b.sense_key());
    }
}
