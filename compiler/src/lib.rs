//! The model resolution engine: two resolvers that turn linked sets of
//! declaration files into a validated in-memory topology.
//!
//! The graph resolver runs first; its output is read-only input to the
//! instance builder. Both are synchronous, hold no state across calls and
//! never fail for data-dependent problems: they accumulate diagnostics and
//! return a best-effort partial result. Callers must inspect the issue list
//! even when a result is returned.


mod graph;
mod imports;
mod instances;
mod overrides;

use std::{collections::HashMap, sync::Arc};

use roboconf_lang::{FileDeclaration, ResolutionIssue, Severity};
use roboconf_model::{Forest, Graph};
use url::Url;

pub use graph::resolve_graph;
pub use instances::resolve_instances;
pub use overrides::{OverrideOutcome, resolve_override};

/// Already-parsed declaration files, keyed by normalized file identity.
#[derive(Clone, Debug, Default)]
pub struct FileStore {
    files: HashMap<Url, Arc<FileDeclaration>>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: FileDeclaration) {
        let key = normalize_url(&file.source);
        self.files.insert(key, Arc::new(file));
    }

    pub fn get(&self, url: &Url) -> Option<Arc<FileDeclaration>> {
        self.files.get(&normalize_url(url)).cloned()
    }
}

/// File identity ignores fragments; everything else is significant.
pub(crate) fn normalize_url(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

/// Suffix convention for multiplicity-generated instance names.
///
/// Replicas are numbered from `start_index` in decimal; `pad_width`
/// zero-pads every index (a per-declaration pad hint takes priority).
#[derive(Clone, Copy, Debug)]
pub struct ReplicationOptions {
    pub start_index: u32,
    pub pad_width: Option<usize>,
}

impl Default for ReplicationOptions {
    fn default() -> Self {
        Self {
            start_index: 1,
            pad_width: None,
        }
    }
}

impl ReplicationOptions {
    pub(crate) fn suffix(&self, index: u32, decl_pad: Option<usize>) -> String {
        match decl_pad.or(self.pad_width) {
            Some(width) => format!("{index:0width$}"),
            None => index.to_string(),
        }
    }
}

/// Output of the graph resolver: a best-effort graph plus diagnostics.
#[derive(Clone, Debug)]
pub struct GraphResolution {
    pub graph: Graph,
    pub issues: Vec<ResolutionIssue>,
}

impl GraphResolution {
    pub fn has_errors(&self) -> bool {
        has_errors(&self.issues)
    }
}

/// Output of the instance builder: a best-effort forest plus diagnostics.
#[derive(Clone, Debug)]
pub struct InstanceResolution {
    pub forest: Forest,
    pub issues: Vec<ResolutionIssue>,
}

impl InstanceResolution {
    pub fn has_errors(&self) -> bool {
        has_errors(&self.issues)
    }
}

fn has_errors(issues: &[ResolutionIssue]) -> bool {
    issues
        .iter()
        .any(|issue| issue.severity() == Severity::Error)
}
