//! Emission of a resolved model back into declaration blocks.
//!
//! Re-resolving the emitted blocks yields an equivalent graph (same
//! components and edges) and forest (same paths and exports). This is also
//! the persistence format the rest of the system writes out.

use roboconf_lang::{
    ComponentBlock, ExportDecl, FacetBlock, FileDeclaration, ImportedVar, InstanceBlock,
};
use url::Url;

use crate::{Forest, Graph, Instance, InstanceId};

pub fn graph_to_blocks(graph: &Graph, source: Url) -> FileDeclaration {
    let mut file = FileDeclaration::graph(source);

    for facet in graph.facets.values() {
        let mut block = FacetBlock::new(facet.name.clone(), 0);
        block.extends = facet.extends.iter().cloned().collect();
        block.exports = facet
            .exports
            .iter()
            .map(|(name, value)| ExportDecl::new(name.clone(), value.as_deref()))
            .collect();
        block.installer = facet.installer.clone();
        block.icon = facet.icon.clone();
        block.children = facet.children.iter().cloned().collect();
        file.facets.push(block);
    }

    for component in &graph.components {
        let mut block = ComponentBlock::new(component.name.clone(), 0);
        block.installer = component.installer.clone();
        block.alias = component.alias.clone();
        block.icon = component.icon.clone();
        block.facets = component.facets.iter().cloned().collect();
        // Edges are emitted as concrete component names; facet aliases were
        // already resolved away.
        block.children = component
            .children
            .iter()
            .map(|&child| graph.component(child).name.clone())
            .collect();
        block.exports = component
            .exports
            .iter()
            .map(|(name, value)| ExportDecl::new(name.clone(), value.as_deref()))
            .collect();
        block.imports = component
            .imports
            .iter()
            .map(|(name, &optional)| ImportedVar {
                name: name.clone(),
                optional,
            })
            .collect();
        file.components.push(block);
    }

    file
}

pub fn forest_to_blocks(forest: &Forest, graph: &Graph, source: Url) -> FileDeclaration {
    let mut file = FileDeclaration::instances(source);
    file.instances = forest
        .roots
        .iter()
        .map(|&root| instance_to_block(forest, graph, root))
        .collect();
    file
}

fn instance_to_block(forest: &Forest, graph: &Graph, id: InstanceId) -> InstanceBlock {
    let instance = forest.instance(id);
    let mut block = instance_block_for(graph, instance);
    block.children = instance
        .children
        .iter()
        .map(|&child| instance_to_block(forest, graph, child))
        .collect();
    block
}

fn instance_block_for(graph: &Graph, instance: &Instance) -> InstanceBlock {
    let component = graph.component(instance.component);
    let mut block = InstanceBlock::new(component.name.clone(), instance.name.clone(), 0);
    block.channel = instance.channel.clone();
    for (name, value) in &instance.overrides {
        // Keys are fully qualified, so re-resolution applies them exactly.
        block = block.with_override(name, value, 0);
    }
    block
}
