// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Diagnostics channel for conversion callbacks
//!
//! Geometry conversion is best-effort: malformed entities degrade to
//! reported messages instead of aborting the run. Consumers install a
//! [`Reporter`] to receive those messages together with coarse progress
//! updates while long models convert.

use std::sync::{Arc, Mutex};

use ifc_brep_core::EntityId;

/// Message classification, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Conversion of an item failed entirely
    Error,
    /// Geometry was produced but is likely wrong or incomplete
    MajorWarning,
    /// Geometry was produced with a local defect, e.g. one abandoned face
    MinorWarning,
    /// Informational, e.g. an entity kind that is not implemented
    Info,
    /// Fraction of the model converted so far
    ProgressValue,
    /// Human readable progress description
    ProgressText,
}

/// One reported message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Entity the message is attributed to, if one is known
    pub entity: Option<EntityId>,
    /// Converter component that raised the message
    pub component: &'static str,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        entity: Option<EntityId>,
        component: &'static str,
    ) -> Self {
        Diagnostic {
            severity,
            message: message.into(),
            entity,
            component,
        }
    }
}

/// Receives diagnostics during conversion.
///
/// Implementations must be thread safe: when parallel conversion is
/// enabled, worker threads report concurrently.
pub trait Reporter: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Discards every message.
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _diagnostic: Diagnostic) {}
}

/// Buffers every message for later inspection, e.g. in tests.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    messages: Mutex<Vec<Diagnostic>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn messages(&self) -> Vec<Diagnostic> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of messages at or above the given severity.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.messages()
            .iter()
            .filter(|d| d.severity <= severity)
            .count()
    }

    pub fn has_severity(&self, severity: Severity) -> bool {
        self.messages().iter().any(|d| d.severity == severity)
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, diagnostic: Diagnostic) {
        match self.messages.lock() {
            Ok(mut guard) => guard.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}

/// Shared handle passed through the converter stack.
#[derive(Clone)]
pub struct ReporterHandle {
    inner: Arc<dyn Reporter>,
}

impl ReporterHandle {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        ReporterHandle { inner: reporter }
    }

    pub fn null() -> Self {
        ReporterHandle {
            inner: Arc::new(NullReporter),
        }
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        self.inner.report(diagnostic);
    }

    pub fn error(&self, message: impl Into<String>, entity: Option<EntityId>, component: &'static str) {
        self.report(Diagnostic::new(Severity::Error, message, entity, component));
    }

    pub fn major_warning(
        &self,
        message: impl Into<String>,
        entity: Option<EntityId>,
        component: &'static str,
    ) {
        self.report(Diagnostic::new(
            Severity::MajorWarning,
            message,
            entity,
            component,
        ));
    }

    pub fn minor_warning(
        &self,
        message: impl Into<String>,
        entity: Option<EntityId>,
        component: &'static str,
    ) {
        self.report(Diagnostic::new(
            Severity::MinorWarning,
            message,
            entity,
            component,
        ));
    }

    pub fn info(&self, message: impl Into<String>, entity: Option<EntityId>, component: &'static str) {
        self.report(Diagnostic::new(Severity::Info, message, entity, component));
    }

    /// Fraction of the model converted, in `[0, 1]`.
    pub fn progress(&self, fraction: f64, component: &'static str) {
        self.report(Diagnostic::new(
            Severity::ProgressValue,
            format!("{:.3}", fraction.clamp(0.0, 1.0)),
            None,
            component,
        ));
    }

    pub fn progress_text(&self, message: impl Into<String>, component: &'static str) {
        self.report(Diagnostic::new(
            Severity::ProgressText,
            message,
            None,
            component,
        ));
    }
}

impl std::fmt::Debug for ReporterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ReporterHandle")
    }
}
