//! The instance hierarchy builder.

use std::collections::{BTreeMap, VecDeque};

use roboconf_lang::{
    FileDeclaration, FileKind, InstanceBlock, ResolutionIssue, SourceLocation,
};
use roboconf_model::{Forest, Graph, Instance, InstanceId};
use url::Url;

use crate::{
    FileStore, InstanceResolution, ReplicationOptions, imports,
    overrides::{OverrideOutcome, resolve_override},
};

/// One pending declaration→instance pair in the breadth-first walk.
struct Work<'a> {
    block: &'a InstanceBlock,
    file: &'a FileDeclaration,
    parent: Option<InstanceId>,
    /// Replica-resolved name (the declared name plus a count suffix).
    name: String,
    /// Replicas share one declaration; diagnostics fire on the first only.
    report: bool,
    /// The path to this instance carries at least one generated suffix.
    inferred: bool,
}

/// Builds the instance forest declared by `entry` and its imports, typed
/// against an already-resolved `graph`.
///
/// Data-dependent problems accumulate in the returned issue list; on a
/// path conflict the last-registered instance survives and the others are
/// collapsed out of the forest.
///
/// # Panics
///
/// Panics if the entry file is present in the store but is not
/// instances-kind.
pub fn resolve_instances(
    store: &FileStore,
    entry: &Url,
    graph: &Graph,
    options: &ReplicationOptions,
) -> InstanceResolution {
    if let Some(file) = store.get(entry) {
        assert!(
            file.kind == FileKind::Instances,
            "resolve_instances requires an instances-kind entry file, got {entry}"
        );
    }

    let closure = imports::collect(store, entry);
    let files = closure.files;
    let mut issues = closure.issues;

    let mut forest = Forest::default();
    // Registration order, for the last-registered-wins conflict pass.
    let mut registered: Vec<(InstanceId, SourceLocation, bool)> = Vec::new();

    let mut queue: VecDeque<Work<'_>> = VecDeque::new();
    for file in &files {
        for block in &file.instances {
            enqueue_replicas(&mut queue, block, file.as_ref(), None, true, false, options);
        }
    }

    while let Some(work) = queue.pop_front() {
        let location = work.file.location(work.block.line);

        let Some(component) = graph.find_component(&work.block.component) else {
            if work.report {
                issues.push(ResolutionIssue::InexistentComponent {
                    component: work.block.component.clone(),
                    instance: work.name.clone(),
                    location,
                });
            }
            // The whole subtree is untyped without its root; skip it.
            continue;
        };

        let mut instance = Instance::new(work.name.clone(), component);
        instance.channel = work.block.channel.clone();
        instance.parent = work.parent;
        let id = forest.push(instance);
        registered.push((id, location, work.inferred));

        // Override resolution runs per replica; the resolved values are the
        // same but the declaration only reports once.
        for decl in &work.block.overrides {
            match resolve_override(graph.component(component), &decl.name) {
                OverrideOutcome::Applied(key) => {
                    forest
                        .instance_mut(id)
                        .overrides
                        .insert(key, decl.value.clone());
                }
                OverrideOutcome::NotOverriding => {
                    if work.report {
                        issues.push(ResolutionIssue::NotOverriding {
                            key: decl.name.clone(),
                            instance: work.name.clone(),
                            location: work.file.location(decl.line),
                        });
                    }
                }
                OverrideOutcome::Ambiguous(candidates) => {
                    if work.report {
                        issues.push(ResolutionIssue::AmbiguousOverriding {
                            key: decl.name.clone(),
                            instance: work.name.clone(),
                            candidates,
                            location: work.file.location(decl.line),
                        });
                    }
                }
            }
        }

        for child in &work.block.children {
            enqueue_replicas(
                &mut queue,
                child,
                work.file,
                Some(id),
                work.report,
                work.inferred,
                options,
            );
        }
    }

    collapse_duplicates(&mut forest, &registered, &mut issues);

    forest.assert_invariants();
    tracing::debug!(
        entry = %entry,
        instances = forest.len(),
        roots = forest.roots.len(),
        issues = issues.len(),
        "resolved instance forest"
    );

    InstanceResolution { forest, issues }
}

/// Expands a declaration's `count` into indexed replicas; a declaration
/// without one (or with `count <= 1`) stays a single unsuffixed instance.
fn enqueue_replicas<'a>(
    queue: &mut VecDeque<Work<'a>>,
    block: &'a InstanceBlock,
    file: &'a FileDeclaration,
    parent: Option<InstanceId>,
    report: bool,
    inferred: bool,
    options: &ReplicationOptions,
) {
    match block.count {
        Some(count) if count.value > 1 => {
            for offset in 0..count.value {
                let index = options.start_index + offset;
                let suffix = options.suffix(index, count.pad_width);
                queue.push_back(Work {
                    block,
                    file,
                    parent,
                    name: format!("{}-{}", block.name, suffix),
                    report: report && offset == 0,
                    inferred: true,
                });
            }
        }
        _ => queue.push_back(Work {
            block,
            file,
            parent,
            name: block.name.clone(),
            report,
            inferred,
        }),
    }
}

/// Detects path collisions over the finished forest. Literal duplicates
/// report once per declaration; a collision involving a generated name
/// reports once. Either way the last-registered instance survives.
fn collapse_duplicates(
    forest: &mut Forest,
    registered: &[(InstanceId, SourceLocation, bool)],
    issues: &mut Vec<ResolutionIssue>,
) {
    // Paths are computed before any removal so collapsed parents do not
    // invalidate their descendants' entries.
    let mut by_path: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, (id, _, _)) in registered.iter().enumerate() {
        by_path.entry(forest.path(*id)).or_default().push(idx);
    }

    // BTreeMap order visits a parent's path before its children's, so a
    // conflict inside an already-removed subtree is skipped.
    for (path, entries) in &by_path {
        let alive: Vec<usize> = entries
            .iter()
            .copied()
            .filter(|&idx| forest.instances[registered[idx].0.0].is_some())
            .collect();
        if alive.len() < 2 {
            continue;
        }

        if alive.iter().any(|&idx| registered[idx].2) {
            let last = *alive.last().expect("at least two entries");
            issues.push(ResolutionIssue::ConflictingInferredInstance {
                path: path.clone(),
                location: registered[last].1.clone(),
            });
        } else {
            for &idx in &alive {
                issues.push(ResolutionIssue::AlreadyDefinedInstance {
                    path: path.clone(),
                    location: registered[idx].1.clone(),
                });
            }
        }

        // Last registered wins.
        for &idx in &alive[..alive.len() - 1] {
            forest.remove(registered[idx].0);
        }
    }
}
