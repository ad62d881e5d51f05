//! Non-fatal conditions found while building or initializing a tree.
//!
//! These never abort the operation that found them. A [`StoreTree`]
//! hands each one to its [`DiagnosticSink`]; the default sink logs through
//! `tracing`.
//!
//! [`StoreTree`]: crate::StoreTree

use std::fmt;
use std::sync::{Arc, Mutex};

use arbor_node::NodeId;
use tracing::{error, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A reported condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A declared child was skipped because its parent already owns the name.
    NameCollisionOnCreate { parent: NodeId, name: String },
    /// A store's make-reactive hook failed. The remaining stores still ran.
    ReactivityActivationFailed {
        node: NodeId,
        store: &'static str,
        message: String,
    },
    /// A name occurs more than once in the tree and was registered on the
    /// root under its qualified form.
    DuplicateName { name: String, qualified: String },
    /// A store was reset before its tree finished initializing.
    ResetDuringInitialization { node: NodeId },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::ReactivityActivationFailed { .. } => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameCollisionOnCreate { parent, name } => {
                write!(f, "store {parent} already owns \"{name}\"; child skipped")
            }
            Self::ReactivityActivationFailed {
                node,
                store,
                message,
            } => write!(f, "making {store} ({node}) reactive failed: {message}"),
            Self::DuplicateName { name, qualified } => {
                write!(f, "store name \"{name}\" is duplicated; registered as \"{qualified}\"")
            }
            Self::ResetDuringInitialization { node } => {
                write!(f, "store {node} reset while hierarchy is not initialized")
            }
        }
    }
}

/// Receiver of [`Diagnostic`]s.
pub trait DiagnosticSink {
    fn report(&self, diagnostic: &Diagnostic);
}

/// Logs every diagnostic as a `tracing` event at its severity.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        match diagnostic.severity() {
            Severity::Warning => warn!(%diagnostic, "store diagnostic"),
            Severity::Error => error!(%diagnostic, "store diagnostic"),
        }
    }
}

/// Keeps diagnostics in memory. Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct CollectingSink {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn entries(&self) -> Vec<Diagnostic> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        TracingSink.report(diagnostic);
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push(diagnostic.clone());
    }
}
