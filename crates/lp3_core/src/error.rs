//! Error types for resource acquisition and guard misuse

use thiserror::Error;

/// Recoverable failures raised while acquiring a foreign resource
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The foreign factory returned a null handle
    #[error("Couldn't create {kind}: {}", describe(.diagnostic))]
    CreationFailed {
        /// Resource kind that failed, e.g. `"Window"`
        kind: &'static str,
        /// Last error reported by the foreign library, if it had one
        diagnostic: Option<String>,
    },
}

impl ResourceError {
    /// Diagnostic string reported by the foreign library
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::CreationFailed { diagnostic, .. } => diagnostic.as_deref(),
        }
    }
}

fn describe(diagnostic: &Option<String>) -> &str {
    diagnostic.as_deref().unwrap_or("no diagnostic available")
}

/// Misuse of a [`ResourceGuard`](crate::resource::ResourceGuard)
///
/// These indicate a logic bug in the calling code. They are never returned;
/// the guard logs them at `Critical` and panics where the violation happened.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStateViolation {
    /// The handle of an empty guard was requested
    #[error("{kind} guard accessed while empty")]
    AccessOnEmpty {
        /// Resource kind of the guard
        kind: &'static str,
    },

    /// An empty guard was asked to release its handle
    #[error("{kind} guard released twice")]
    DoubleRelease {
        /// Resource kind of the guard
        kind: &'static str,
    },

    /// A guard still owning a live handle was overwritten
    #[error("{kind} guard assigned while still holding a live handle")]
    AssignIntoLive {
        /// Resource kind of the guard
        kind: &'static str,
    },
}
