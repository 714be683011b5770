//! Streamed-line analysis: dialect matching, classification, enrichment.

use crate::parser::{self, RawFinding};
use crate::variable_index;
use blinter_protocol::{
    paths, Classification, ColumnSpan, Issue, IssueId, Severity, VariableIndex,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// `file:line: severity: message`
static PATH_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.+?):(\d+):\s*(error|warning|info)\s*:?\s*(.+)$")
        .expect("path line pattern")
});

/// `[severity] (code) -> message [on line N]` — streamed bracketed form.
static BRACKETED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*\[(info|warn|warning|error|fatal)\]\s*\(([^)]+)\)\s*->\s*(.+?)(?:\s+on\s+line\s+(\d+))?\s*$")
        .expect("bracketed pattern")
});

/// `undefined variable 'NAME'` (quotes optional) inside a finding message.
static UNDEFINED_VAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)undefined\s+variable\s+'?([A-Za-z0-9_]+)'?")
        .expect("undefined variable pattern")
});

/// Per-run inputs the classifier needs alongside each output line.
#[derive(Debug)]
pub struct AnalysisContext<'a> {
    /// Anchors relative paths named by the output.
    pub workspace_root: Option<&'a Path>,
    /// File the run targets; path fallback and streamed-definition source.
    pub default_file: Option<&'a Path>,
    /// Live index; streamed `set` lines are appended as they are seen.
    pub variables: &'a mut VariableIndex,
}

/// How a classification rule decides the critical flag.
#[derive(Debug, Clone, Copy)]
enum Criticality {
    Always,
    UnlessInformational,
}

struct KeywordRule {
    keywords: &'static [&'static str],
    classification: Classification,
    criticality: Criticality,
}

/// Messages containing any of these are flagged for emphasized rendering
/// even when no dedicated category applies.
const CRITICAL_KEYWORDS: &[&str] = &[
    "undefined variable",
    "unreachable",
    "bad label",
    "invalid label",
    "infinite loop",
    "empty label",
    "syntax error",
    "deprecated",
    "duplicate label",
];

/// Ordered rules; the first whose keyword matches the lower-cased message
/// wins. Order is part of the contract: the label family must be checked
/// before the catch-all critical keywords, `deprecated` before them too so
/// its severity-dependent criticality applies.
const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["undefined variable"],
        classification: Classification::UndefinedVariable,
        criticality: Criticality::Always,
    },
    KeywordRule {
        keywords: &["infinite loop"],
        classification: Classification::PossibleInfiniteLoop,
        criticality: Criticality::Always,
    },
    KeywordRule {
        keywords: &["bad label", "invalid label", "duplicate label", "empty label"],
        classification: Classification::BadLabel,
        criticality: Criticality::Always,
    },
    KeywordRule {
        keywords: &["syntax"],
        classification: Classification::SyntaxWarning,
        criticality: Criticality::Always,
    },
    KeywordRule {
        keywords: &["deprecated"],
        classification: Classification::Deprecated,
        criticality: Criticality::UnlessInformational,
    },
    KeywordRule {
        keywords: CRITICAL_KEYWORDS,
        classification: Classification::Heuristic,
        criticality: Criticality::Always,
    },
];

/// Classify a finding message.
///
/// Pure: identical `(message, severity)` always yields the identical
/// `(classification, critical)` pair, with no hidden state.
#[must_use]
pub fn classify(message: &str, severity: Severity) -> (Classification, bool) {
    let informational = severity.is_informational();
    let lowered = message.to_lowercase();
    if !lowered.trim().is_empty() {
        for rule in KEYWORD_RULES {
            if rule.keywords.iter().any(|keyword| lowered.contains(keyword)) {
                let critical = match rule.criticality {
                    Criticality::Always => true,
                    Criticality::UnlessInformational => !informational,
                };
                return (rule.classification, critical);
            }
        }
    }
    if informational {
        (Classification::Info, false)
    } else {
        (Classification::General, true)
    }
}

/// Resolve the file a finding targets.
///
/// An absolute path wins outright; relative text is anchored to the
/// workspace root, then the target file's directory, then the current
/// working directory. The result is lexically normalized.
#[must_use]
pub fn resolve_file(
    file_text: Option<&str>,
    workspace_root: Option<&Path>,
    default_file: Option<&Path>,
) -> PathBuf {
    if let Some(text) = file_text {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            let candidate = Path::new(trimmed);
            if candidate.is_absolute() {
                return paths::normalize(candidate);
            }
            if let Some(root) = workspace_root {
                return paths::normalize(&root.join(trimmed));
            }
            if let Some(dir) = default_file.and_then(Path::parent) {
                return paths::normalize(&dir.join(trimmed));
            }
            return paths::normalize(&working_dir().join(trimmed));
        }
    }
    default_file.map_or_else(|| paths::normalize(&working_dir()), paths::normalize)
}

fn working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_default()
}

/// Analyze one streamed output line.
///
/// Returns the classified issue when the line matches a recognized dialect,
/// `None` otherwise. Never fails: unmatched or malformed lines are skipped.
pub fn analyze_line(line: &str, ctx: &mut AnalysisContext<'_>) -> Option<Issue> {
    let line = line.trim_end_matches(['\r', '\n']);

    // Execution-time assignments are tracked before dialect matching so a
    // finding later in the same run can resolve a trace for them.
    variable_index::record_streamed_definition(ctx.variables, line, ctx.default_file);

    if let Some(caps) = parser::DETAIL_HEADER_RE.captures(line) {
        let code = caps[3].trim().to_string();
        let message = caps[2].trim().to_string();
        if message.is_empty() {
            return None;
        }
        return Some(build_issue(
            Severity::from_code(&code),
            message,
            Some(code),
            None,
            Some(parser::parse_line_number(&caps[1])),
            ctx,
        ));
    }

    if let Some(caps) = BRACKETED_RE.captures(line) {
        let message = caps[3].trim().to_string();
        if message.is_empty() {
            return None;
        }
        return Some(build_issue(
            Severity::from_token(&caps[1]),
            message,
            Some(caps[2].trim().to_string()),
            None,
            caps.get(4).map(|m| parser::parse_line_number(m.as_str())),
            ctx,
        ));
    }

    if let Some(caps) = PATH_LINE_RE.captures(line) {
        let message = caps[4].trim().to_string();
        if message.is_empty() {
            return None;
        }
        return Some(build_issue(
            Severity::from_token(&caps[3]),
            message,
            None,
            Some(caps[1].to_string()),
            Some(parser::parse_line_number(&caps[2])),
            ctx,
        ));
    }

    None
}

/// Classify and enrich a raw report finding into a stored issue.
#[must_use]
pub fn issue_from_finding(finding: RawFinding, ctx: &mut AnalysisContext<'_>) -> Issue {
    build_issue(
        finding.severity,
        finding.message,
        Some(finding.code),
        None,
        Some(finding.line),
        ctx,
    )
}

fn build_issue(
    severity: Severity,
    message: String,
    code: Option<String>,
    file_text: Option<String>,
    line: Option<usize>,
    ctx: &mut AnalysisContext<'_>,
) -> Issue {
    let (classification, is_critical) = classify(&message, severity);
    let file_path = resolve_file(file_text.as_deref(), ctx.workspace_root, ctx.default_file);
    let line = line.unwrap_or(1).max(1);

    let variable_name = UNDEFINED_VAR_RE
        .captures(&message)
        .map(|caps| caps[1].to_ascii_uppercase());
    let variable_trace = variable_name
        .as_deref()
        .and_then(|name| ctx.variables.trace(name));

    Issue {
        id: IssueId::next(),
        severity,
        classification,
        is_critical,
        message,
        code: code.filter(|c| !c.is_empty()),
        file_path,
        line,
        span: ColumnSpan::full_line(),
        variable_name,
        variable_trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blinter_protocol::DefinitionRecord;
    use pretty_assertions::assert_eq;

    fn ctx<'a>(variables: &'a mut VariableIndex, default_file: Option<&'a Path>) -> AnalysisContext<'a> {
        AnalysisContext {
            workspace_root: None,
            default_file,
            variables,
        }
    }

    #[test]
    fn classification_is_deterministic() {
        for severity in [
            Severity::Error,
            Severity::Warning,
            Severity::Information,
            Severity::Hint,
        ] {
            assert_eq!(
                classify("Undefined variable 'FOO'", severity),
                (Classification::UndefinedVariable, true)
            );
        }
    }

    #[test]
    fn classification_precedence_is_fixed() {
        assert_eq!(
            classify("possible infinite loop near :retry", Severity::Warning),
            (Classification::PossibleInfiniteLoop, true)
        );
        assert_eq!(
            classify("duplicate label :done", Severity::Warning),
            (Classification::BadLabel, true)
        );
        assert_eq!(
            classify("syntax oddity detected", Severity::Information),
            (Classification::SyntaxWarning, true)
        );
        assert_eq!(
            classify("unreachable code after goto", Severity::Warning),
            (Classification::Heuristic, true)
        );
    }

    #[test]
    fn deprecated_criticality_tracks_severity() {
        assert_eq!(
            classify("deprecated command", Severity::Warning),
            (Classification::Deprecated, true)
        );
        assert_eq!(
            classify("deprecated command", Severity::Information),
            (Classification::Deprecated, false)
        );
        assert_eq!(
            classify("deprecated command", Severity::Hint),
            (Classification::Deprecated, false)
        );
    }

    #[test]
    fn unmatched_messages_fall_back_by_severity() {
        assert_eq!(classify("something odd", Severity::Error), (Classification::General, true));
        assert_eq!(
            classify("something odd", Severity::Information),
            (Classification::Info, false)
        );
    }

    #[test]
    fn absolute_path_wins() {
        let resolved = resolve_file(
            Some("/abs/target.bat"),
            Some(Path::new("/workspace")),
            Some(Path::new("/repo/sample.bat")),
        );
        assert_eq!(resolved, PathBuf::from("/abs/target.bat"));
    }

    #[test]
    fn relative_path_joins_workspace_then_default_dir() {
        assert_eq!(
            resolve_file(
                Some("sub/child.bat"),
                Some(Path::new("/workspace")),
                Some(Path::new("/repo/sample.bat")),
            ),
            PathBuf::from("/workspace/sub/child.bat")
        );
        assert_eq!(
            resolve_file(Some("child.bat"), None, Some(Path::new("/repo/sample.bat"))),
            PathBuf::from("/repo/child.bat")
        );
    }

    #[test]
    fn missing_file_text_falls_back_to_default_file() {
        assert_eq!(
            resolve_file(None, None, Some(Path::new("/repo/./sample.bat"))),
            PathBuf::from("/repo/sample.bat")
        );
    }

    #[test]
    fn bracketed_line_defaults_to_line_one() {
        let mut variables = VariableIndex::new();
        let issue = analyze_line(
            "[ERROR] (E042) -> Missing argument",
            &mut ctx(&mut variables, Some(Path::new("/repo/sample.bat"))),
        )
        .expect("recognized");
        assert_eq!(issue.line, 1);
        assert_eq!(issue.code.as_deref(), Some("E042"));
        assert_eq!(issue.severity, Severity::Error);
    }

    #[test]
    fn bracketed_line_with_explicit_line() {
        let mut variables = VariableIndex::new();
        let issue = analyze_line(
            "[WARN] (W002) -> Something suspicious on line 5",
            &mut ctx(&mut variables, Some(Path::new("/repo/sample.bat"))),
        )
        .expect("recognized");
        assert_eq!(issue.line, 5);
        assert_eq!(issue.severity, Severity::Warning);
        assert_eq!(issue.message, "Something suspicious");
    }

    #[test]
    fn detail_header_severity_comes_from_code_only() {
        let mut variables = VariableIndex::new();
        let issue = analyze_line(
            "Line 2: Prefer CMD extension (S007)",
            &mut ctx(&mut variables, Some(Path::new("/repo/sample.bat"))),
        )
        .expect("recognized");
        assert_eq!(issue.severity, Severity::Information);
        assert_eq!(issue.classification, Classification::Info);
        assert!(!issue.is_critical);
        assert_eq!(issue.line, 2);
    }

    #[test]
    fn path_line_dialect_resolves_named_file() {
        let mut variables = VariableIndex::new();
        let issue = analyze_line(
            "helpers/util.bat:7: warning: deprecated construct",
            &mut AnalysisContext {
                workspace_root: Some(Path::new("/workspace")),
                default_file: Some(Path::new("/workspace/main.bat")),
                variables: &mut variables,
            },
        )
        .expect("recognized");
        assert_eq!(issue.file_path, PathBuf::from("/workspace/helpers/util.bat"));
        assert_eq!(issue.line, 7);
        assert_eq!(issue.classification, Classification::Deprecated);
        assert!(issue.is_critical);
    }

    #[test]
    fn unrecognized_lines_yield_nothing() {
        let mut variables = VariableIndex::new();
        assert!(analyze_line("plain progress output", &mut ctx(&mut variables, None)).is_none());
        assert!(analyze_line("", &mut ctx(&mut variables, None)).is_none());
    }

    #[test]
    fn undefined_variable_gets_name_and_trace() {
        let mut variables = VariableIndex::new();
        variables.record(
            "FOO",
            DefinitionRecord {
                file: Some(PathBuf::from("/repo/sample.bat")),
                line: Some(2),
                value: "bar".to_string(),
            },
        );
        let issue = analyze_line(
            "[ERROR] (E010) -> Undefined variable 'foo' on line 9",
            &mut ctx(&mut variables, Some(Path::new("/repo/sample.bat"))),
        )
        .expect("recognized");
        assert_eq!(issue.classification, Classification::UndefinedVariable);
        assert!(issue.is_critical);
        assert_eq!(issue.variable_name.as_deref(), Some("FOO"));
        let trace = issue.variable_trace.expect("trace");
        assert_eq!(trace, vec!["sample.bat line 2 = bar".to_string()]);
    }

    #[test]
    fn streamed_set_enables_later_trace() {
        let mut variables = VariableIndex::new();
        let default = Path::new("/repo/sample.bat");
        assert!(analyze_line("set RUNTIME_FLAG=1", &mut ctx(&mut variables, Some(default))).is_none());
        let issue = analyze_line(
            "[ERROR] (E010) -> Undefined variable 'RUNTIME_FLAG' on line 4",
            &mut ctx(&mut variables, Some(default)),
        )
        .expect("recognized");
        let trace = issue.variable_trace.expect("trace");
        assert_eq!(trace, vec!["sample.bat = 1".to_string()]);
    }

    #[test]
    fn finding_conversion_matches_streamed_classification() {
        let mut variables = VariableIndex::new();
        let finding = RawFinding {
            severity: Severity::Warning,
            code: "W030".to_string(),
            message: "Deprecated command used".to_string(),
            line: 3,
        };
        let issue = issue_from_finding(finding, &mut ctx(&mut variables, Some(Path::new("/repo/s.bat"))));
        assert_eq!(issue.classification, Classification::Deprecated);
        assert!(issue.is_critical);
        assert_eq!(issue.line, 3);
        assert_eq!(issue.code.as_deref(), Some("W030"));
    }
}
