//! Operation layer - the caller-facing actions.
//!
//! Each action orchestrates the lower layers (source, archive, store,
//! deps, host) for one user-visible operation and reports a structured
//! [`OpReport`] instead of a bare boolean, so callers and tests can tell
//! apart success, no-op, and the partial-failure outcomes of batch runs.

mod install;
mod refresh;
mod remove;
mod run;
mod search;
mod update;

#[cfg(test)]
pub(crate) mod testutil;

pub use install::InstallAction;
pub use refresh::RefreshAction;
pub use remove::RemoveAction;
pub use run::RunAction;
pub use search::SearchAction;
pub use update::UpdateAction;

/// Outcome class of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpStatus {
    /// The operation did everything it set out to do.
    Success,
    /// Nothing needed doing (already installed, not installed, nothing
    /// on record).
    NoOp,
    /// A batch operation finished but some items failed.
    PartialFailure,
    /// The operation could not complete.
    Failed,
}

/// Structured result of an operation: a status plus a human-readable
/// summary the CLI prints verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpReport {
    pub status: OpStatus,
    pub message: String,
}

impl OpReport {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: OpStatus::Success,
            message: message.into(),
        }
    }

    pub fn no_op(message: impl Into<String>) -> Self {
        Self {
            status: OpStatus::NoOp,
            message: message.into(),
        }
    }

    pub fn partial_failure(message: impl Into<String>) -> Self {
        Self {
            status: OpStatus::PartialFailure,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: OpStatus::Failed,
            message: message.into(),
        }
    }

    /// True for outcomes that should map to a zero exit code.
    pub fn is_ok(&self) -> bool {
        matches!(self.status, OpStatus::Success | OpStatus::NoOp)
    }
}
