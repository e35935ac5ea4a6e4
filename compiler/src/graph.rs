//! The component/facet graph resolver.

use std::collections::{BTreeMap, BTreeSet};

use roboconf_lang::{
    ComponentBlock, FacetBlock, FileKind, ResolutionIssue, Severity, SourceLocation,
    qualify_variable,
};
use roboconf_model::{Component, ComponentId, Facet, Graph};
use url::Url;

use crate::{FileStore, GraphResolution, imports};

/// Resolves the entry graph file and its transitive imports into a [`Graph`].
///
/// Data-dependent problems accumulate in the returned issue list; the graph
/// is best-effort and may be partial when errors are present.
///
/// # Panics
///
/// Panics if the entry file is present in the store but is not graph-kind;
/// handing an instances file to the graph resolver is a programmer error.
pub fn resolve_graph(store: &FileStore, entry: &Url) -> GraphResolution {
    if let Some(file) = store.get(entry) {
        assert!(
            file.kind == FileKind::Graph,
            "resolve_graph requires a graph-kind entry file, got {entry}"
        );
    }

    let closure = imports::collect(store, entry);
    let mut issues = closure.issues;

    // Multimap indexing so duplicates are detected instead of overwritten.
    let mut component_decls: BTreeMap<String, Vec<(&ComponentBlock, SourceLocation)>> =
        BTreeMap::new();
    let mut facet_decls: BTreeMap<String, Vec<(&FacetBlock, SourceLocation)>> = BTreeMap::new();
    for file in &closure.files {
        for block in &file.components {
            component_decls
                .entry(block.name.clone())
                .or_default()
                .push((block, file.location(block.line)));
        }
        for block in &file.facets {
            facet_decls
                .entry(block.name.clone())
                .or_default()
                .push((block, file.location(block.line)));
        }
    }

    if component_decls.is_empty() {
        issues.push(ResolutionIssue::NotAGraph {
            file: entry.clone(),
        });
    }

    let mut unique = true;
    for (name, decls) in &facet_decls {
        if decls.len() > 1 {
            unique = false;
            issues.push(ResolutionIssue::AlreadyDefinedFacet {
                name: name.clone(),
                locations: decls.iter().map(|(_, loc)| loc.clone()).collect(),
            });
        }
    }
    for (name, decls) in &component_decls {
        if decls.len() > 1 {
            unique = false;
            issues.push(ResolutionIssue::AlreadyDefinedComponent {
                name: name.clone(),
                locations: decls.iter().map(|(_, loc)| loc.clone()).collect(),
            });
        }
    }

    let mut graph = Graph::default();
    for (name, decls) in &facet_decls {
        graph
            .facets
            .insert(name.clone(), facet_from_block(decls[0].0));
    }

    let mut locations: BTreeMap<ComponentId, SourceLocation> = BTreeMap::new();
    let mut declared_children: BTreeMap<ComponentId, BTreeSet<String>> = BTreeMap::new();
    for decls in component_decls.values() {
        let (block, location) = &decls[0];
        let id = graph.add_component(component_from_block(block));
        locations.insert(id, location.clone());
        declared_children.insert(id, block.children.iter().cloned().collect());
    }

    // A trustworthy graph needs unique names; skip the remaining steps when
    // any uniqueness error exists.
    if !unique {
        return GraphResolution { graph, issues };
    }

    // Facet flattening.
    let declared_facets: BTreeMap<ComponentId, Vec<String>> = component_decls
        .values()
        .enumerate()
        .map(|(idx, decls)| (ComponentId(idx), decls[0].0.facets.clone()))
        .collect();
    for (&id, facets) in &declared_facets {
        let location = &locations[&id];
        let name = graph.component(id).name.clone();
        let merge = expand_facets(&graph, &name, facets, location, &mut issues);
        apply_facet_merge(&mut graph, id, merge, location, &mut issues);

        // Facets also contribute children declarations.
        let children = declared_children
            .get_mut(&id)
            .expect("declared children entry exists");
        for facet in &graph.component(id).facets {
            if let Some(facet) = graph.facets.get(facet) {
                children.extend(facet.children.iter().cloned());
            }
        }
    }

    // Child/ancestor edges: a declared child name matches a component name
    // or a facet the component adopts (a facet name acts as a type alias).
    // Edges are only resolved over an otherwise error-free graph.
    let failed = issues
        .iter()
        .any(|issue| issue.severity() == Severity::Error);
    if !failed {
        for (&id, children) in &declared_children {
            for child_name in children {
                let matches: Vec<ComponentId> = graph
                    .components_iter()
                    .filter(|(_, c)| c.name == *child_name || c.facets.contains(child_name))
                    .map(|(cid, _)| cid)
                    .collect();
                for child in matches {
                    graph.component_mut(id).children.insert(child);
                    graph.component_mut(child).ancestors.insert(id);
                }
            }
        }
    }

    graph.assert_invariants();
    tracing::debug!(
        components = graph.components.len(),
        facets = graph.facets.len(),
        roots = graph.roots().len(),
        issues = issues.len(),
        "resolved component graph"
    );

    GraphResolution { graph, issues }
}

fn component_from_block(block: &ComponentBlock) -> Component {
    let mut component = Component::new(block.name.clone());
    component.installer = block.installer.clone();
    component.alias = block.alias.clone();
    component.icon = block.icon.clone();
    for export in &block.exports {
        component.exports.insert(
            qualify_variable(&block.name, &export.name),
            export.value.clone(),
        );
    }
    for import in &block.imports {
        component
            .imports
            .insert(import.name.clone(), import.optional);
    }
    component
}

fn facet_from_block(block: &FacetBlock) -> Facet {
    let mut facet = Facet::new(block.name.clone());
    facet.extends = block.extends.iter().cloned().collect();
    for export in &block.exports {
        facet.exports.insert(
            qualify_variable(&block.name, &export.name),
            export.value.clone(),
        );
    }
    facet.installer = block.installer.clone();
    facet.icon = block.icon.clone();
    facet.children = block.children.iter().cloned().collect();
    facet
}

#[derive(Default)]
struct FacetMerge {
    facets: BTreeSet<String>,
    exports: Vec<(String, Option<String>)>,
    installers: Vec<String>,
    icons: Vec<String>,
}

/// Transitively expands the declared facets depth-first. A facet seen
/// again while its own expansion is still open closes an extends cycle,
/// wherever the walk entered it; an unknown name is a separate error.
/// Diamonds (a facet reachable twice through different chains) are fine
/// and merge once.
fn expand_facets(
    graph: &Graph,
    component: &str,
    declared: &[String],
    location: &SourceLocation,
    issues: &mut Vec<ResolutionIssue>,
) -> FacetMerge {
    let mut merge = FacetMerge::default();
    let mut expanding: BTreeSet<String> = BTreeSet::new();
    let mut done: BTreeSet<String> = BTreeSet::new();
    for name in declared {
        expand_facet(
            graph, component, name, location, &mut merge, &mut expanding, &mut done, issues,
        );
    }
    merge
}

#[allow(clippy::too_many_arguments)]
fn expand_facet(
    graph: &Graph,
    component: &str,
    name: &str,
    location: &SourceLocation,
    merge: &mut FacetMerge,
    expanding: &mut BTreeSet<String>,
    done: &mut BTreeSet<String>,
    issues: &mut Vec<ResolutionIssue>,
) {
    if done.contains(name) {
        return;
    }
    if !expanding.insert(name.to_string()) {
        issues.push(ResolutionIssue::CycleInFacets {
            facet: name.to_string(),
            component: component.to_string(),
            location: location.clone(),
        });
        return;
    }

    if let Some(facet) = graph.facets.get(name) {
        for (export, value) in &facet.exports {
            merge.exports.push((export.clone(), value.clone()));
        }
        if let Some(installer) = &facet.installer {
            merge.installers.push(installer.clone());
        }
        if let Some(icon) = &facet.icon {
            merge.icons.push(icon.clone());
        }
        for extended in &facet.extends {
            expand_facet(
                graph, component, extended, location, merge, expanding, done, issues,
            );
        }
        merge.facets.insert(name.to_string());
    } else {
        issues.push(ResolutionIssue::UnresolvedFacet {
            facet: name.to_string(),
            component: component.to_string(),
            location: location.clone(),
        });
    }

    expanding.remove(name);
    done.insert(name.to_string());
}

fn apply_facet_merge(
    graph: &mut Graph,
    id: ComponentId,
    merge: FacetMerge,
    location: &SourceLocation,
    issues: &mut Vec<ResolutionIssue>,
) {
    let name = graph.component(id).name.clone();
    let component = graph.component_mut(id);
    component.facets = merge.facets;

    // Facet exports are namespaced under the facet name, so they cannot
    // collide across facets; a component redeclaration of the same
    // qualified name keeps the component's default.
    for (export, value) in merge.exports {
        component.exports.entry(export).or_insert(value);
    }

    if component.installer.is_none() {
        let mut distinct: Vec<String> = Vec::new();
        for installer in merge.installers {
            if !distinct.contains(&installer) {
                distinct.push(installer);
            }
        }
        if distinct.len() > 1 {
            issues.push(ResolutionIssue::AmbiguousInstaller {
                component: name,
                installers: distinct.clone(),
                location: location.clone(),
            });
        }
        // First non-null wins even when ambiguity was reported.
        graph.component_mut(id).installer = distinct.into_iter().next();
    }

    let component = graph.component_mut(id);
    if component.icon.is_none() {
        component.icon = merge.icons.into_iter().next();
    }
}
