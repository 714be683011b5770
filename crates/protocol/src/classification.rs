use serde::{Deserialize, Serialize};

/// Semantic category assigned to a finding.
///
/// Derived from the finding's message, severity and code alone — the closed
/// set renderers key icons and emphasis on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// A variable is referenced before any observed assignment.
    UndefinedVariable,
    /// Control flow that may never terminate.
    PossibleInfiniteLoop,
    /// Malformed, duplicate or empty label.
    BadLabel,
    /// Anything the linter flags as a syntax problem.
    SyntaxWarning,
    /// Use of a deprecated construct.
    Deprecated,
    /// Matched a critical keyword without a more specific category.
    Heuristic,
    /// Informational note.
    Info,
    /// Uncategorized problem.
    General,
    /// Category forwarded verbatim from the external linter.
    Linter,
}

impl Classification {
    /// Stable lowercase name for logs and renderers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UndefinedVariable => "undefined_variable",
            Self::PossibleInfiniteLoop => "possible_infinite_loop",
            Self::BadLabel => "bad_label",
            Self::SyntaxWarning => "syntax_warning",
            Self::Deprecated => "deprecated",
            Self::Heuristic => "heuristic",
            Self::Info => "info",
            Self::General => "general",
            Self::Linter => "linter",
        }
    }
}
