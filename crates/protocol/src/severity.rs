use serde::{Deserialize, Serialize};

/// Diagnostic severity.
///
/// Declaration order carries the total order `error < warning < information
/// < hint`, which the derived `Ord` preserves; [`Severity::rank`] is the
/// numeric form used as the primary sort key for published diagnostics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

impl Severity {
    /// Numeric rank used as the primary diagnostic sort key (error = 0).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Error => 0,
            Self::Warning => 1,
            Self::Information => 2,
            Self::Hint => 3,
        }
    }

    /// Map a severity token from linter output (`INFO`, `WARN`, ...).
    ///
    /// `INFO` maps to information, `WARN`/`WARNING` to warning, and every
    /// other token (`ERROR`, `FATAL`, unknown) to error.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "INFO" | "INFORMATION" => Self::Information,
            "WARN" | "WARNING" => Self::Warning,
            _ => Self::Error,
        }
    }

    /// Derive severity from a rule code prefix.
    ///
    /// Checked case-insensitively in fixed precedence: `E*` and `SEC*` are
    /// errors, `W*` warnings, `S*` information, `P*` hints, anything else
    /// information.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_ascii_uppercase();
        if code.starts_with('E') {
            Self::Error
        } else if code.starts_with("SEC") {
            Self::Error
        } else if code.starts_with('W') {
            Self::Warning
        } else if code.starts_with('S') {
            Self::Information
        } else if code.starts_with('P') {
            Self::Hint
        } else {
            Self::Information
        }
    }

    /// True for severities rendered as notes rather than problems.
    #[must_use]
    pub const fn is_informational(self) -> bool {
        matches!(self, Self::Information | Self::Hint)
    }

    /// Lowercase name as renderers print it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Information => "information",
            Self::Hint => "hint",
        }
    }
}
