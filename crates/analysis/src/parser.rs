//! Report parsing for the two captured-output dialects.

use blinter_protocol::Severity;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `[SEVERITY] (CODE) -> DESCRIPTION on line N`
static LEGACY_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*\[(INFO|WARN|WARNING|ERROR|FATAL)\]\s*\(([^)]+)\)\s*->\s*(.+?)\s+on line\s+(\d+)\s*$")
        .expect("legacy line pattern")
});

/// `Line N: MESSAGE (CODE)` — header of a detailed block.
pub(crate) static DETAIL_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*Line\s+(\d+):\s+(.+?)\s*\(([A-Za-z0-9_+-]+)\)\s*$")
        .expect("detail header pattern")
});

/// `- Label: value` or `- text` — one detail line under a block header.
static DETAIL_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-\s*(.*\S)\s*$").expect("detail item pattern"));

/// One raw finding decoded from report text, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFinding {
    pub severity: Severity,
    /// Rule code; never empty.
    pub code: String,
    /// Description, with any detail lines appended newline-separated.
    pub message: String,
    /// 1-based line number in the linted file.
    pub line: usize,
}

/// Parse a captured report buffer into raw findings.
///
/// Total: any input (empty, binary noise, huge) yields a possibly empty
/// vector without panicking. Unmatched lines are skipped silently. The two
/// dialects may interleave arbitrarily, so the cursor tracks position line
/// by line through the whole buffer; no state survives between calls.
#[must_use]
pub fn parse_report(text: &str) -> Vec<RawFinding> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let mut findings = Vec::new();
    let mut cursor = 0;
    while cursor < lines.len() {
        let line = lines[cursor];

        if let Some(caps) = LEGACY_LINE_RE.captures(line) {
            cursor += 1;
            let code = caps[2].trim().to_string();
            let message = caps[3].trim().to_string();
            if code.is_empty() || message.is_empty() {
                continue;
            }
            findings.push(RawFinding {
                severity: Severity::from_token(&caps[1]),
                code,
                message,
                line: parse_line_number(&caps[4]),
            });
            continue;
        }

        if let Some(caps) = DETAIL_HEADER_RE.captures(line) {
            let line_number = parse_line_number(&caps[1]);
            let code = caps[3].trim().to_string();
            let mut message = caps[2].trim().to_string();
            cursor += 1;
            // Detail lines run until a blank or non-dash line, which is left
            // for the next dialect attempt.
            while cursor < lines.len() {
                let candidate = lines[cursor];
                if candidate.trim().is_empty() {
                    break;
                }
                let Some(item) = DETAIL_ITEM_RE.captures(candidate) else {
                    break;
                };
                message.push('\n');
                message.push_str(item[1].trim());
                cursor += 1;
            }
            if !message.is_empty() {
                findings.push(RawFinding {
                    severity: Severity::from_code(&code),
                    code,
                    message,
                    line: line_number,
                });
            }
            continue;
        }

        cursor += 1;
    }
    findings
}

/// Clamp a captured line number to the 1-based contract.
pub(crate) fn parse_line_number(digits: &str) -> usize {
    digits.parse::<usize>().unwrap_or(1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn legacy_line_round_trips() {
        let findings = parse_report("[WARN] (W002) -> X on line 5");
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.severity, Severity::Warning);
        assert_eq!(finding.code, "W002");
        assert_eq!(finding.message, "X");
        assert_eq!(finding.line, 5);
    }

    #[test]
    fn legacy_severity_tokens_map() {
        let report = "[INFO] (I001) -> note on line 1\n\
                      [WARNING] (W001) -> warn on line 2\n\
                      [FATAL] (F001) -> boom on line 3";
        let severities: Vec<Severity> =
            parse_report(report).iter().map(|f| f.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Information, Severity::Warning, Severity::Error]
        );
    }

    #[test]
    fn unmatched_lines_are_skipped() {
        let report = "[INFO] (I001) -> first on line 1\n\
                      some unrelated log output\n\
                      [WARN] (W002) -> second on line 5";
        let findings = parse_report(report);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].line, 1);
        assert_eq!(findings[1].line, 5);
    }

    #[test]
    fn detailed_block_collects_labels_in_order() {
        let report = "Line 2: Errorlevel handling difference (W028)\n\
                      - Context: IF ERRORLEVEL 1\n\
                      - Expected: >= comparison\n\
                      - Actual: equality check\n\
                      \n\
                      trailing noise";
        let findings = parse_report(report);
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.code, "W028");
        assert_eq!(finding.line, 2);
        assert_eq!(finding.severity, Severity::Warning);
        let expected = "Errorlevel handling difference\n\
                        Context: IF ERRORLEVEL 1\n\
                        Expected: >= comparison\n\
                        Actual: equality check";
        assert_eq!(finding.message, expected);
    }

    #[test]
    fn detail_line_without_label_is_kept_verbatim() {
        let findings = parse_report("Line 4: UNC path detected (SEC002)\n- use pushd instead");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(
            findings[0].message,
            "UNC path detected\nuse pushd instead"
        );
    }

    #[test]
    fn detail_block_ends_at_non_dash_line_which_is_reparsed() {
        let report = "Line 1: first (S001)\n\
                      - note: a\n\
                      [ERROR] (E001) -> second on line 7";
        let findings = parse_report(report);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].code, "S001");
        assert_eq!(findings[1].code, "E001");
        assert_eq!(findings[1].line, 7);
    }

    #[test]
    fn dialects_interleave_freely() {
        let report = "[WARN] (W001) -> first on line 3\n\
                      Line 5: second (P100)\n\
                      - hint: detail\n\
                      [INFO] (I001) -> third on line 9";
        let findings = parse_report(report);
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[1].severity, Severity::Hint);
    }

    #[test]
    fn tolerates_carriage_returns() {
        let findings = parse_report("[ERROR] (E010) -> broken on line 2\r\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 2);
    }

    #[test]
    fn is_total_on_arbitrary_input() {
        for garbage in ["", "\n\n\n", "(((", "Line :", "[X] -> y", "\u{0}\u{1}\u{2}"] {
            let findings = parse_report(garbage);
            assert!(findings.iter().all(|f| f.line >= 1 && !f.code.is_empty()));
        }
    }

    #[test]
    fn zero_line_numbers_clamp_to_one() {
        let findings = parse_report("[ERROR] (E001) -> x on line 0");
        assert_eq!(findings[0].line, 1);
    }
}
