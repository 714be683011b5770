//! One lint run: stream assembly, per-line analysis, store feeding.

use crate::assembler::LineAssembler;
use crate::error::Result;
use crate::store::{DiagnosticsStore, RunTicket};
use blinter_analysis::{
    analyze_line, build_variable_index, issue_from_finding, parse_report, AnalysisContext,
};
use blinter_protocol::VariableIndex;
use std::path::{Path, PathBuf};

/// Ingestion side of one external linter invocation against one file.
///
/// Created by [`LintRun::start`], which supersedes any in-flight run for the
/// same file and pre-scans the target for variable assignment sites. The run
/// owns its variable index and chunk assembler until
/// [`finish`](Self::finish); if another run starts for the file in the
/// meantime, everything this one keeps feeding is dropped by the store's run
/// id checks.
pub struct LintRun {
    store: DiagnosticsStore,
    ticket: RunTicket,
    workspace_root: Option<PathBuf>,
    variables: VariableIndex,
    assembler: LineAssembler,
}

impl LintRun {
    /// Begin a run for `file`, optionally anchoring relative output paths to
    /// `workspace_root`.
    pub fn start(
        store: &DiagnosticsStore,
        file: impl Into<PathBuf>,
        workspace_root: Option<PathBuf>,
    ) -> Result<Self> {
        let ticket = store.start_run(&file.into())?;
        let variables = build_variable_index(&ticket.file);
        Ok(Self {
            store: store.clone(),
            ticket,
            workspace_root,
            variables,
            assembler: LineAssembler::new(),
        })
    }

    /// Target file, normalized.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.ticket.file
    }

    /// Monotonic per-file run id.
    #[must_use]
    pub const fn run_id(&self) -> u64 {
        self.ticket.run_id
    }

    /// Feed one raw stdout chunk; boundaries may fall mid-line.
    pub fn push_chunk(&mut self, chunk: &str) {
        for line in self.assembler.push_chunk(chunk) {
            self.consume_line(&line);
        }
    }

    /// Feed one already-split output line.
    pub fn push_line(&mut self, line: &str) {
        self.consume_line(line);
    }

    /// Batch path: parse a captured report — both captured-output dialects,
    /// including detailed blocks — and buffer every finding.
    pub fn ingest_report(&mut self, report: &str) {
        for finding in parse_report(report) {
            let issue = issue_from_finding(
                finding,
                &mut AnalysisContext {
                    workspace_root: self.workspace_root.as_deref(),
                    default_file: Some(&self.ticket.file),
                    variables: &mut self.variables,
                },
            );
            self.store
                .add_issue(&self.ticket.file, self.ticket.run_id, issue);
        }
    }

    /// End of stream: flush any partial final line, then finalize with the
    /// linter's exit code (`None` = spawn failure).
    pub fn finish(mut self, exit_code: Option<i32>) {
        let assembler = std::mem::take(&mut self.assembler);
        if let Some(remainder) = assembler.finish() {
            self.consume_line(&remainder);
        }
        self.store
            .finalize_run(&self.ticket.file, self.ticket.run_id, exit_code);
    }

    fn consume_line(&mut self, line: &str) {
        let mut ctx = AnalysisContext {
            workspace_root: self.workspace_root.as_deref(),
            default_file: Some(&self.ticket.file),
            variables: &mut self.variables,
        };
        if let Some(issue) = analyze_line(line, &mut ctx) {
            self.store
                .add_issue(&self.ticket.file, self.ticket.run_id, issue);
        }
    }
}
