//! Import-closure traversal shared by both resolvers.

use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
};

use roboconf_lang::{FileDeclaration, ResolutionIssue, SourceLocation};
use url::Url;

use crate::{FileStore, normalize_url};

pub(crate) struct Closure {
    /// Traversal order: entry file first, then imports breadth-first.
    pub(crate) files: Vec<Arc<FileDeclaration>>,
    pub(crate) issues: Vec<ResolutionIssue>,
}

/// Walks the import closure of `entry` with an explicit work queue and a
/// visited set over normalized URLs, so import cycles between files
/// terminate. Unreachable targets accumulate as issues and the walk
/// continues.
pub(crate) fn collect(store: &FileStore, entry: &Url) -> Closure {
    let mut files = Vec::new();
    let mut issues = Vec::new();
    let mut visited: HashSet<Url> = HashSet::new();
    let mut queue: VecDeque<(Url, Option<SourceLocation>)> = VecDeque::new();
    queue.push_back((normalize_url(entry), None));

    while let Some((url, from)) = queue.pop_front() {
        if !visited.insert(url.clone()) {
            continue;
        }

        let Some(file) = store.get(&url) else {
            issues.push(ResolutionIssue::UnreachableFile {
                target: url.to_string(),
                location: from,
            });
            continue;
        };

        for import in &file.imports {
            let location = file.location(import.line);
            match file.source.join(&import.target) {
                Ok(target) => queue.push_back((normalize_url(&target), Some(location))),
                Err(_) => issues.push(ResolutionIssue::UnreachableFile {
                    target: import.target.clone(),
                    location: Some(location),
                }),
            }
        }

        files.push(file);
    }

    tracing::debug!(
        entry = %entry,
        files = files.len(),
        unreachable = issues.len(),
        "collected import closure"
    );

    Closure { files, issues }
}
