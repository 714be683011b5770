use crate::{Classification, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ISSUE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque unique issue token, allocated once at creation and never reused.
///
/// Displays as `issue-N` for logs and renderer keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(u64);

impl IssueId {
    /// Allocate the next id from the process-wide monotonic counter.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ISSUE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "issue-{}", self.0)
    }
}

/// Half-open character span `[start, end)` on a single line.
///
/// Presentation only; sorting and point queries use the line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpan {
    pub start: usize,
    pub end: usize,
}

impl ColumnSpan {
    /// Span covering the whole line regardless of its length.
    #[must_use]
    pub const fn full_line() -> Self {
        Self {
            start: 0,
            end: usize::MAX,
        }
    }
}

impl Default for ColumnSpan {
    fn default() -> Self {
        Self::full_line()
    }
}

/// One classified finding against a source file.
///
/// `classification` and `is_critical` are pure functions of
/// `(message, severity, code)` — no hidden state influences them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub severity: Severity,
    pub classification: Classification,
    pub is_critical: bool,
    /// Finding text; may embed newlines carrying multi-line detail.
    pub message: String,
    /// Short rule or error code, when the output dialect carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Normalized path of the file the finding targets.
    pub file_path: PathBuf,
    /// 1-based line number.
    pub line: usize,
    pub span: ColumnSpan,
    /// Upper-cased variable name, for undefined-variable findings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
    /// Prior assignment sites explaining an undefined-variable finding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_trace: Option<Vec<String>>,
}

impl Issue {
    /// Composite sort key: severity rank first, then line. Ties beyond that
    /// keep discovery order under a stable sort.
    #[must_use]
    pub const fn sort_key(&self) -> (u8, usize) {
        (self.severity.rank(), self.line)
    }
}
