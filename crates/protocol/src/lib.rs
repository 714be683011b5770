//! # Blinter Protocol
//!
//! Shared data model for the lint ingestion pipeline: severities,
//! classifications, issues, variable assignment history, and run status.
//!
//! Pure types only — no I/O, no timers, no global state beyond the issue id
//! counter. Everything an external renderer consumes is serializable.

pub mod paths;

mod classification;
mod issue;
mod severity;
mod status;
mod variables;

pub use classification::Classification;
pub use issue::{ColumnSpan, Issue, IssueId};
pub use severity::Severity;
pub use status::{RunState, RunStatus};
pub use variables::{DefinitionRecord, VariableIndex};
