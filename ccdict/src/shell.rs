//! Interactive search shell.

use std::io::{BufRead, Write};

use anyhow::Context;
use ccdict_core::{CantoDict, Config, DictField, OutputFormat};

use crate::command::{parse_bool, SearchCommand};

pub const PROMPT: &str = "ccdict> ";

const SETTINGS: [&str; 9] = [
    "try_all_fields",
    "lazy_eval",
    "flatten_pinyin",
    "use_re",
    "search_field",
    "compact",
    "fields",
    "indent_str",
    "output_format",
];

const USAGE: &str = "\
search commands:
\tsearch_term [search_field] [use_re] [flatten_pinyin] [compact] [field list] [indent]
\t(search_field search_value [use_re]) ... [field list]
\t    search_term: text to look up; \"text\" matches the whole field
\t    field list: [field1 field2 ...] chooses the displayed fields
settings:
\tset                  list settings
\tset NAME             show one setting
\tset NAME VALUE       change a setting
help:
\t?                    this text
\t? field              list field names
\tq                    quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Search shell over a dictionary, carrying session settings between commands.
pub struct Shell {
    dict: CantoDict,
    settings: Config,
}

impl Shell {
    pub fn new(dict: CantoDict, settings: Config) -> Self {
        Self { dict, settings }
    }

    pub fn settings(&self) -> &Config {
        &self.settings
    }

    /// Read commands until `q` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> anyhow::Result<()> {
        write!(out, "{}", PROMPT)?;
        out.flush()?;
        for line in input.lines() {
            let line = line.context("reading shell input")?;
            if self.execute(&line, out)? == Flow::Quit {
                return Ok(());
            }
            write!(out, "{}", PROMPT)?;
            out.flush()?;
        }
        writeln!(out)?;
        Ok(())
    }

    /// Execute one shell line. Query mistakes are reported and the session continues.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> anyhow::Result<Flow> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match head {
            "" => {}
            "q" | "quit" | "exit" => return Ok(Flow::Quit),
            "?" | "help" => self.help(rest, out)?,
            "set" => {
                if let Err(message) = self.set(rest, out) {
                    writeln!(out, "error: {}", message)?;
                }
            }
            _ => self.search(line, out)?,
        }
        Ok(Flow::Continue)
    }

    fn help<W: Write>(&self, topic: &str, out: &mut W) -> anyhow::Result<()> {
        if topic == "field" || topic == "fields" {
            for field in DictField::ALL {
                writeln!(out, "\t{}:\t{}", field.name(), field.description())?;
            }
        } else {
            writeln!(out, "{}", USAGE)?;
        }
        Ok(())
    }

    fn search<W: Write>(&self, line: &str, out: &mut W) -> anyhow::Result<()> {
        let command = match SearchCommand::parse(line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "error: {}", e)?;
                return Ok(());
            }
        };
        let Some(expr) = &command.expr else {
            writeln!(out, "error: nothing to search for")?;
            return Ok(());
        };
        let (search, format) = command.options(&self.settings);
        match self.dict.search_formatted(expr, &search, &format) {
            Ok(rendered) if rendered.is_empty() => writeln!(out, "no results")?,
            Ok(rendered) => {
                for text in rendered {
                    writeln!(out, "{}", text)?;
                }
            }
            Err(e) if e.is_query_error() => writeln!(out, "error: {}", e)?,
            Err(e) => return Err(e).context("search failed"),
        }
        Ok(())
    }

    fn set<W: Write>(&mut self, args: &str, out: &mut W) -> Result<(), String> {
        let (name, value) = match args.split_once(char::is_whitespace) {
            Some((name, value)) => (name, Some(value.trim())),
            None => (args, None),
        };

        if name.is_empty() {
            for setting in SETTINGS {
                writeln!(out, "{} = {}", setting, self.show(setting)?).map_err(|e| e.to_string())?;
            }
            return Ok(());
        }
        let Some(value) = value else {
            writeln!(out, "{} = {}", name, self.show(name)?).map_err(|e| e.to_string())?;
            return Ok(());
        };

        let bool_value = || parse_bool(value).ok_or_else(|| format!("{:?} is not a boolean", value));
        let search = &mut self.settings.search;
        let format = &mut self.settings.format;
        match name {
            "try_all_fields" => search.try_all_fields = bool_value()?,
            "lazy_eval" => search.lazy = bool_value()?,
            "flatten_pinyin" => search.flatten_pinyin = bool_value()?,
            "use_re" => {
                search.use_regex = if value == "none" { None } else { Some(bool_value()?) };
            }
            "search_field" => {
                search.search_field = if value == "none" {
                    None
                } else {
                    Some(value.parse::<DictField>().map_err(|e| e.to_string())?)
                };
            }
            "compact" => format.compact = bool_value()?,
            "fields" => {
                format.fields = value
                    .trim_matches(|c| c == '[' || c == ']')
                    .split_whitespace()
                    .map(|f| f.parse::<DictField>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| e.to_string())?;
            }
            "indent_str" => format.indent = value.to_string(),
            "output_format" => {
                format.output_format = value.parse::<OutputFormat>().map_err(|e| e.to_string())?;
            }
            other => return Err(format!("unknown setting {:?}", other)),
        }
        Ok(())
    }

    fn show(&self, name: &str) -> Result<String, String> {
        let search = &self.settings.search;
        let format = &self.settings.format;
        let value = match name {
            "try_all_fields" => search.try_all_fields.to_string(),
            "lazy_eval" => search.lazy.to_string(),
            "flatten_pinyin" => search.flatten_pinyin.to_string(),
            "use_re" => search.use_regex.map_or("none".to_string(), |b| b.to_string()),
            "search_field" => search.search_field.map_or("none".to_string(), |f| f.to_string()),
            "compact" => format.compact.to_string(),
            "fields" => {
                let names: Vec<&str> = format.fields.iter().map(|f| f.name()).collect();
                format!("[{}]", names.join(" "))
            }
            "indent_str" => format!("{:?}", format.indent),
            "output_format" => format.output_format.to_string(),
            other => return Err(format!("unknown setting {:?}", other)),
        };
        Ok(value)
    }
}
