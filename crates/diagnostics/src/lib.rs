//! # Blinter Diagnostics
//!
//! The stateful half of lint-output ingestion: per-file issue stores, run
//! lifecycle with supersession, and debounced publishing for renderers.
//!
//! ## Pipeline
//!
//! ```text
//! Process boundary (chunks, exit code)
//!     │
//!     ├──> LineAssembler (carry partial lines)
//!     │      └─> whole lines
//!     │
//!     ├──> blinter-analysis (dialects, classification, traces)
//!     │      └─> Issues
//!     │
//!     └──> DiagnosticsStore (run ids, coalescing flush)
//!            └─> sorted Issue lists + RunStatus + updates channel
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use blinter_diagnostics::{DiagnosticsStore, LintRun};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = DiagnosticsStore::with_defaults();
//!     let mut run = LintRun::start(&store, "/repo/scripts/deploy.bat", None)?;
//!     let file = run.file().to_path_buf();
//!
//!     run.push_chunk("[WARN] (W002) -> Something suspicious on line 5\n");
//!     run.finish(Some(0));
//!
//!     for issue in store.diagnostics(&file) {
//!         println!("{}: {}", issue.line, issue.message);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Debounced publishing relies on a Tokio runtime; construct and drive the
//! store from within one.

mod assembler;
mod config;
mod error;
mod run;
mod stats;
mod store;

pub use assembler::LineAssembler;
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use run::LintRun;
pub use stats::IssueStats;
pub use store::{DiagnosticsStore, DiagnosticsUpdate, RunTicket};
