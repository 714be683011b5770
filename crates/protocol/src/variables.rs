use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One observed `set NAME=VALUE` assignment site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionRecord {
    /// File the assignment was seen in; `None` when the site is unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// 1-based line, `None` for assignments observed in streamed output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Assigned value, trimmed.
    pub value: String,
}

impl DefinitionRecord {
    /// Human-readable assignment site, e.g. `sample.bat line 2 = hello`.
    ///
    /// Missing sub-fields are omitted; a record with nothing to show renders
    /// as `None`.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(name) = self.file.as_deref().and_then(|f| f.file_name()) {
            parts.push(name.to_string_lossy().into_owned());
        }
        if let Some(line) = self.line {
            parts.push(format!("line {line}"));
        }
        if !self.value.is_empty() {
            parts.push(format!("= {}", self.value));
        }
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// Append-only map from upper-cased variable name to assignment history.
///
/// Built from a static pre-scan of the lint target and extended while a run
/// streams; per-name records keep encounter order and are never reordered or
/// pruned. Consumers only ever receive rendered traces, never the live map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableIndex {
    entries: BTreeMap<String, Vec<DefinitionRecord>>,
}

impl VariableIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record under the upper-cased name, preserving encounter order.
    pub fn record(&mut self, name: &str, record: DefinitionRecord) {
        self.entries
            .entry(name.to_ascii_uppercase())
            .or_default()
            .push(record);
    }

    /// Assignment history for a name (case-insensitive), if any was observed.
    #[must_use]
    pub fn records(&self, name: &str) -> Option<&[DefinitionRecord]> {
        self.entries
            .get(&name.to_ascii_uppercase())
            .map(Vec::as_slice)
    }

    /// Rendered trace lines for a name, in encounter order.
    #[must_use]
    pub fn trace(&self, name: &str) -> Option<Vec<String>> {
        let rendered: Vec<String> = self
            .records(name)?
            .iter()
            .filter_map(DefinitionRecord::render)
            .collect();
        (!rendered.is_empty()).then_some(rendered)
    }

    /// Number of tracked variable names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
