//! Whole-file loading of dictionary sources.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::entry::DictEntry;
use crate::error::{DictError, Result};
use crate::parser::{is_comment, parse_dict_line};

/// Load every entry of a dictionary file, in file order.
///
/// Comment and blank lines are skipped. `max_lines` caps how many of the
/// remaining source lines are parsed. Unparseable lines are skipped and
/// counted; an unreadable file is an error.
pub fn parse_dict_file<P: AsRef<Path>>(path: P, max_lines: Option<usize>) -> Result<Vec<DictEntry>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| DictError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut entries = Vec::new();
    let mut parsed_lines = 0usize;
    let mut skipped = 0usize;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| DictError::io(path, e))?;
        let line = if idx == 0 {
            line.trim_start_matches('\u{feff}')
        } else {
            line.as_str()
        };
        if line.trim().is_empty() || is_comment(line) {
            continue;
        }
        if max_lines.is_some_and(|cap| parsed_lines >= cap) {
            break;
        }
        parsed_lines += 1;

        match parse_dict_line(line) {
            Ok(mut rows) => entries.append(&mut rows),
            Err(e) => {
                skipped += 1;
                debug!(path = %path.display(), line = idx + 1, "skipping line: {}", e);
            }
        }
    }

    if entries.is_empty() {
        warn!(path = %path.display(), "dictionary source yielded no entries");
    }
    info!(
        path = %path.display(),
        lines = parsed_lines,
        entries = entries.len(),
        skipped,
        "loaded dictionary source"
    );
    Ok(entries)
}
