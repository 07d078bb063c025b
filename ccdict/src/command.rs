//! Search command mini-language.
//!
//! ```text
//! command   := item*
//! item      := term | fields | quoted | word
//! term      := "(" FIELD VALUE [BOOL] ")"     VALUE may be quoted with ' or "
//! fields    := "[" FIELD* "]"
//! quoted    := '"' TEXT '"'
//! ```
//!
//! Bare words are interpreted by position: a boolean sets, in order, regex
//! mode (only before any term), pinyin flattening and compact output; the
//! first other word is the search text; a field name following the text sets
//! the search field; the next word is the indent string. Only canonical
//! (`english`) and legacy (`DE_FLD_ENGLISH`, `DF_ENGLISH`) field names count
//! here, so `eng` or a leading `comment` is searched as text.

use std::str::FromStr;

use ccdict_core::{Config, DictError, DictField, FormatOptions, MatchMode, Result, SearchExpr, SearchOptions, SearchTerm};
use once_cell::sync::Lazy;
use regex::Regex;

static TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?P<field>\w+)\s+(?:'(?P<single>[^']*)'|"(?P<double>[^"]*)"|(?P<bare>\S+))(?:\s+(?P<mode>\S+))?\s*$"#)
        .expect("search term pattern is valid")
});

/// `1/t/true` and `0/f/false`, case-insensitive.
pub fn parse_bool(word: &str) -> Option<bool> {
    match word.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Term(String),
    Fields(String),
    Quoted(String),
    Word(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        match ch {
            '(' => {
                chars.next();
                let mut quote: Option<char> = None;
                let mut body = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    match (quote, c) {
                        (None, ')') => {
                            closed = true;
                            break;
                        }
                        (None, '\'' | '"') => quote = Some(c),
                        (Some(q), c) if c == q => quote = None,
                        _ => {}
                    }
                    body.push(c);
                }
                if !closed {
                    return Err(syntax(format!("unterminated search term at offset {}", start)));
                }
                tokens.push(Token::Term(body));
            }
            '[' => {
                chars.next();
                let body = take_until(&mut chars, ']')
                    .ok_or_else(|| syntax(format!("unterminated field list at offset {}", start)))?;
                tokens.push(Token::Fields(body));
            }
            '"' => {
                chars.next();
                let body = take_until(&mut chars, '"')
                    .ok_or_else(|| syntax(format!("unterminated quote at offset {}", start)))?;
                tokens.push(Token::Quoted(body));
            }
            _ => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
        }
    }
    Ok(tokens)
}

fn take_until<I>(chars: &mut std::iter::Peekable<I>, end: char) -> Option<String>
where
    I: Iterator<Item = (usize, char)>,
{
    let mut body = String::new();
    for (_, c) in chars.by_ref() {
        if c == end {
            return Some(body);
        }
        body.push(c);
    }
    None
}

/// Field named by a bare word: canonical or legacy spelling only.
fn field_keyword(word: &str) -> Option<DictField> {
    let field: DictField = word.parse().ok()?;
    let legacy = word.starts_with("DE_FLD_") || word.starts_with("DF_");
    (legacy || word == field.name()).then_some(field)
}

fn syntax(message: String) -> DictError {
    DictError::CommandSyntax(message)
}

fn parse_term(body: &str) -> Result<SearchTerm> {
    let caps = TERM_RE
        .captures(body.trim())
        .ok_or_else(|| syntax(format!("expected `(field value [use_re])`, got ({})", body.trim())))?;
    let field: DictField = caps["field"].parse()?;
    let value = caps
        .name("single")
        .or_else(|| caps.name("double"))
        .or_else(|| caps.name("bare"))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let mode = match caps.name("mode") {
        Some(m) => {
            let flag = parse_bool(m.as_str())
                .ok_or_else(|| syntax(format!("expected a boolean regex flag, got {:?}", m.as_str())))?;
            Some(MatchMode::from_regex_flag(flag))
        }
        None => None,
    };
    Ok(SearchTerm { field, value, mode })
}

/// A parsed search command. Unset parts fall back to the session settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCommand {
    pub expr: Option<SearchExpr>,
    pub search_field: Option<DictField>,
    pub use_regex: Option<bool>,
    pub flatten_pinyin: Option<bool>,
    pub fields: Option<Vec<DictField>>,
    pub compact: Option<bool>,
    pub indent: Option<String>,
}

impl SearchCommand {
    pub fn parse(input: &str) -> Result<Self> {
        let mut cmd = SearchCommand::default();
        let mut terms: Vec<SearchTerm> = Vec::new();
        let mut text: Option<String> = None;

        for token in tokenize(input)? {
            match token {
                Token::Term(body) => {
                    if text.is_some() {
                        return Err(syntax("search terms cannot follow a search text".to_string()));
                    }
                    terms.push(parse_term(&body)?);
                }
                Token::Fields(body) => {
                    let fields = body
                        .split_whitespace()
                        .map(DictField::from_str)
                        .collect::<Result<Vec<_>>>()?;
                    cmd.fields = Some(fields);
                }
                Token::Quoted(body) => {
                    if text.is_none() && terms.is_empty() {
                        if cmd.use_regex.is_none() {
                            text = Some(format!("^{}$", body));
                            cmd.use_regex = Some(true);
                        } else {
                            text = Some(body);
                        }
                    } else {
                        cmd.set_indent(body)?;
                    }
                }
                Token::Word(word) => {
                    if let Some(flag) = parse_bool(&word) {
                        if terms.is_empty() && cmd.use_regex.is_none() {
                            cmd.use_regex = Some(flag);
                        } else if cmd.flatten_pinyin.is_none() {
                            cmd.flatten_pinyin = Some(flag);
                        } else if cmd.compact.is_none() {
                            cmd.compact = Some(flag);
                        } else {
                            return Err(syntax(format!("unexpected flag {:?}", word)));
                        }
                    } else if let Some(field) =
                        field_keyword(&word).filter(|_| text.is_some() && cmd.search_field.is_none())
                    {
                        cmd.search_field = Some(field);
                    } else if text.is_none() && terms.is_empty() {
                        text = Some(word);
                    } else {
                        cmd.set_indent(word)?;
                    }
                }
            }
        }

        cmd.expr = match (text, terms.is_empty()) {
            (Some(text), _) => Some(SearchExpr::Text(text)),
            (None, false) => Some(SearchExpr::Terms(terms)),
            (None, true) => None,
        };
        Ok(cmd)
    }

    fn set_indent(&mut self, value: String) -> Result<()> {
        if self.indent.is_some() {
            return Err(syntax(format!("unexpected word {:?}", value)));
        }
        self.indent = Some(value);
        Ok(())
    }

    /// Effective search and display options: this command over `base`.
    pub fn options(&self, base: &Config) -> (SearchOptions, FormatOptions) {
        let mut search = base.search.clone();
        let mut format = base.format.clone();
        if self.search_field.is_some() {
            search.search_field = self.search_field;
        }
        if self.use_regex.is_some() {
            search.use_regex = self.use_regex;
        }
        if let Some(flatten) = self.flatten_pinyin {
            search.flatten_pinyin = flatten;
        }
        if let Some(fields) = &self.fields {
            format.fields = fields.clone();
        }
        if let Some(compact) = self.compact {
            format.compact = compact;
        }
        if let Some(indent) = &self.indent {
            format.indent = indent.clone();
        }
        (search, format)
    }
}

impl FromStr for SearchCommand {
    type Err = DictError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
