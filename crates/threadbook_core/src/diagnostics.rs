use std::collections::BTreeMap;
use std::fmt;

use book_logging::{book_info, book_warn};

use crate::model::PostRef;

/// Non-fatal findings of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticKind {
    /// A node matched no classification rule and was dropped.
    UnrecognizedShape,
    /// A node was accepted through a rule that should rarely fire.
    UnusualShape,
    /// An image is not in the local cache; its reference was left as is.
    MissingAsset,
    /// An internal link points at a post or thread that is in no chapter.
    UnresolvedLink,
    /// An external link to a domain outside the known list.
    UnknownLink,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticKind::UnrecognizedShape => "unrecognized shape",
            DiagnosticKind::UnusualShape => "unusual shape",
            DiagnosticKind::MissingAsset => "missing asset",
            DiagnosticKind::UnresolvedLink => "unresolved link",
            DiagnosticKind::UnknownLink => "unknown link",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub post: Option<PostRef>,
    pub detail: String,
}

/// Accumulates warnings; every entry is also logged when reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, kind: DiagnosticKind, post: Option<PostRef>, detail: impl Into<String>) {
        let detail = detail.into();
        match post {
            Some(post) => book_warn!("[!] {} in {}: {}", kind, post, detail),
            None => book_warn!("[!] {}: {}", kind, detail),
        }
        self.entries.push(Diagnostic { kind, post, detail });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// Logs one info line per diagnostic kind seen.
    pub fn log_summary(&self, label: &str) {
        let mut counts: BTreeMap<DiagnosticKind, usize> = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.kind).or_default() += 1;
        }
        if counts.is_empty() {
            book_info!("{}: no diagnostics", label);
            return;
        }
        for (kind, count) in counts {
            book_info!("{}: {} x {}", label, count, kind);
        }
    }
}
