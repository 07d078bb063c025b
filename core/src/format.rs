//! Rendering of grouped search results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cangjie::CangjieTable;
use crate::entry::DictField;
use crate::error::{DictError, Result};
use crate::search::GroupedResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Ascii,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Ascii => "ascii",
            OutputFormat::Json => "json",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = DictError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascii" | "dsof_ascii" | "dof_ascii" => Ok(OutputFormat::Ascii),
            "json" | "dsof_json" | "dof_json" => Ok(OutputFormat::Json),
            other => Err(DictError::Config(format!("unknown output format {:?}", other))),
        }
    }
}

/// Display settings for [`format_result`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    /// Fields to show, in order.
    pub fields: Vec<DictField>,
    pub output_format: OutputFormat,
    /// Put the whole result on one line.
    pub compact: bool,
    /// Prefix of every output line.
    pub indent: String,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            output_format: OutputFormat::Ascii,
            compact: false,
            indent: String::new(),
        }
    }
}

pub fn default_fields() -> Vec<DictField> {
    vec![
        DictField::Traditional,
        DictField::CjCode,
        DictField::Jyutping,
        DictField::English,
    ]
}

/// Render one result in the requested format.
pub fn format_result(result: &GroupedResult, codes: &CangjieTable, options: &FormatOptions) -> Result<String> {
    match options.output_format {
        OutputFormat::Json => format_json(result, options),
        OutputFormat::Ascii => Ok(format_ascii(result, codes, options)),
    }
}

fn format_json(result: &GroupedResult, options: &FormatOptions) -> Result<String> {
    let mut record = serde_json::Map::new();
    for &field in &options.fields {
        let value = match field {
            DictField::Traditional => result.traditional.clone(),
            DictField::Simplified => result.simplified.clone(),
            DictField::Pinyin => result.pinyin.join(","),
            DictField::Jyutping => result.jyutping.join(";"),
            DictField::English => result.english.join("; "),
            DictField::Comment => result.comment.join("; "),
            DictField::CjCode => result.cjcode.join("; "),
        };
        record.insert(field.name().to_string(), serde_json::Value::String(value));
    }
    Ok(serde_json::to_string(&serde_json::Value::Object(record))?)
}

fn format_ascii(result: &GroupedResult, codes: &CangjieTable, options: &FormatOptions) -> String {
    let compact = options.compact;
    let mut lines: Vec<String> = Vec::new();
    let mut headword: Option<usize> = None;

    for &field in &options.fields {
        match field {
            DictField::Traditional | DictField::Simplified => {
                let value = if field == DictField::Traditional {
                    &result.traditional
                } else {
                    &result.simplified
                };
                match headword {
                    Some(idx) => {
                        lines[idx].push_str(" <=> ");
                        lines[idx].push_str(value);
                    }
                    None => {
                        lines.push(value.clone());
                        headword = Some(lines.len() - 1);
                    }
                }
            }
            DictField::Jyutping => {
                let mut line = format!("[{}]", result.jyutping.join(";"));
                if options.fields.contains(&DictField::Pinyin) {
                    let pinyin: Vec<&str> = result
                        .pinyin
                        .iter()
                        .map(String::as_str)
                        .filter(|p| !p.is_empty())
                        .collect();
                    line.push_str(&format!(" ({})", pinyin.join(";")));
                }
                if !compact {
                    line.insert(0, '\t');
                }
                lines.push(line);
            }
            DictField::English => {
                if result.english.is_empty() {
                    continue;
                }
                if compact {
                    lines.push(result.english.join("; "));
                } else {
                    lines.extend(result.english.iter().map(|gloss| format!("\t{}", gloss)));
                }
            }
            DictField::Comment => {
                if !result.comment.is_empty() {
                    lines.push(result.comment.join("; "));
                }
            }
            DictField::CjCode => {
                if !result.cjcode.is_empty() {
                    let glyphs: Vec<String> = result.cjcode.iter().map(|c| codes.translate(c)).collect();
                    lines.push(format!("\t{}", glyphs.join(" ")));
                }
            }
            // Shown alongside jyutping.
            DictField::Pinyin => {}
        }
    }

    let separator = if compact {
        " ".to_string()
    } else {
        format!("\n{}", options.indent)
    };
    format!("{}{}", options.indent, lines.join(&separator))
}
