//! Per-asset diagnostics.
//!
//! Each traversal step returns a [`StepReport`]; the driver merges them
//! into one report for the whole run. A single asset's error is recorded
//! and does not abort the walk; warnings never abort anything.

use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub path: Option<PathBuf>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}: {}", self.severity, path.display(), self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StepReport {
    diagnostics: Vec<Diagnostic>,
    pub facets_emitted: usize,
    pub renditions_emitted: usize,
}

impl StepReport {
    pub fn new() -> Self {
        StepReport::default()
    }

    pub fn warning(&mut self, message: impl Into<String>, path: Option<&Path>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
            path: path.map(Path::to_path_buf),
        });
    }

    pub fn error(&mut self, message: impl Into<String>, path: Option<&Path>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            path: path.map(Path::to_path_buf),
        });
    }

    pub fn merge(&mut self, other: StepReport) {
        self.diagnostics.extend(other.diagnostics);
        self.facets_emitted += other.facets_emitted;
        self.renditions_emitted += other.renditions_emitted;
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}
