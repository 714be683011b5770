//! Variable assignment tracking: static pre-scan plus streamed updates.

use blinter_protocol::{DefinitionRecord, VariableIndex};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

/// `set NAME=VALUE` anywhere on a source line, word-bounded.
static FILE_SET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bset\b\s+([A-Za-z0-9_]+)\s*=\s*(.*)$").expect("set pattern"));

/// Streamed `set NAME=VALUE` or bare `setlocal` at the start of a line.
static STREAM_SET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:setlocal\b.*|set\s+([A-Za-z0-9_]+)\s*=\s*(.*))$")
        .expect("streamed set pattern")
});

/// Pre-scan a lint target for `set NAME=VALUE` assignment sites.
///
/// Purely textual — no quoting or expansion semantics. Read failures yield
/// an empty index; diagnostics still flow, just without trace enrichment.
#[must_use]
pub fn build_variable_index(path: &Path) -> VariableIndex {
    let mut index = VariableIndex::new();
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            debug!("variable pre-scan skipped for {}: {err}", path.display());
            return index;
        }
    };
    for (idx, raw) in content.split('\n').enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(caps) = FILE_SET_RE.captures(line) {
            index.record(
                &caps[1],
                DefinitionRecord {
                    file: Some(path.to_path_buf()),
                    line: Some(idx + 1),
                    value: caps[2].trim().to_string(),
                },
            );
        }
    }
    index
}

/// Track an assignment observed in streamed linter output.
///
/// Execution-time `set` lines carry no source line number; recording them
/// lets later findings in the same run resolve a trace for variables that
/// were never assigned in the static source. Returns whether a named
/// assignment was recorded (bare `setlocal` matches but records nothing).
pub fn record_streamed_definition(
    index: &mut VariableIndex,
    line: &str,
    default_file: Option<&Path>,
) -> bool {
    let Some(caps) = STREAM_SET_RE.captures(line) else {
        return false;
    };
    let Some(name) = caps.get(1) else {
        return false;
    };
    index.record(
        name.as_str(),
        DefinitionRecord {
            file: default_file.map(Path::to_path_buf),
            line: None,
            value: caps
                .get(2)
                .map(|value| value.as_str().trim().to_string())
                .unwrap_or_default(),
        },
    );
    true
}
