use blinter_protocol::{Issue, Severity};
use serde::{Deserialize, Serialize};

/// Tally of a published diagnostic list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStats {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub information: usize,
    pub hints: usize,
    pub critical: usize,
}

impl IssueStats {
    /// Count one run's published issues.
    #[must_use]
    pub fn tally(issues: &[Issue]) -> Self {
        let mut stats = Self::default();
        for issue in issues {
            stats.total += 1;
            match issue.severity {
                Severity::Error => stats.errors += 1,
                Severity::Warning => stats.warnings += 1,
                Severity::Information => stats.information += 1,
                Severity::Hint => stats.hints += 1,
            }
            if issue.is_critical {
                stats.critical += 1;
            }
        }
        stats
    }

    /// Short human-readable summary, e.g. `3 issue(s), 1 critical`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} issue(s), {} critical", self.total, self.critical)
    }
}
