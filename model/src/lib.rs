//! Resolved model: the component/facet graph and the instance forest.
//!
//! Components live in a name-keyed arena; children/ancestor edges are id
//! sets over that arena rather than shared references, which keeps the
//! cyclic containment graph cheap to compare and serialize. Instances use
//! the same arena shape, with `None` slots marking instances removed by
//! duplicate collapsing.

pub mod emit;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub usize);

/// A component type in the topology graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub alias: Option<String>,
    pub installer: Option<String>,
    pub icon: Option<String>,
    /// Names of the facets this component adopts (flattened, transitive).
    pub facets: BTreeSet<String>,
    /// Fully-qualified exported variable name to optional default value.
    pub exports: BTreeMap<String, Option<String>>,
    /// Fully-qualified imported variable name to its optional flag.
    pub imports: BTreeMap<String, bool>,
    pub children: BTreeSet<ComponentId>,
    pub ancestors: BTreeSet<ComponentId>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            installer: None,
            icon: None,
            facets: BTreeSet::new(),
            exports: BTreeMap::new(),
            imports: BTreeMap::new(),
            children: BTreeSet::new(),
            ancestors: BTreeSet::new(),
        }
    }
}

/// A facet kept on the graph after flattening, for re-emission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Facet {
    pub name: String,
    pub extends: BTreeSet<String>,
    /// Fully-qualified (under the facet name) exported variables.
    pub exports: BTreeMap<String, Option<String>>,
    pub installer: Option<String>,
    pub icon: Option<String>,
    pub children: BTreeSet<String>,
}

impl Facet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: BTreeSet::new(),
            exports: BTreeMap::new(),
            installer: None,
            icon: None,
            children: BTreeSet::new(),
        }
    }
}

/// The resolved component/facet graph. Built once, read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    pub components: Vec<Component>,
    pub facets: BTreeMap<String, Facet>,
}

impl Graph {
    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id.0]
    }

    pub fn component_mut(&mut self, id: ComponentId) -> &mut Component {
        &mut self.components[id.0]
    }

    pub fn add_component(&mut self, component: Component) -> ComponentId {
        let id = ComponentId(self.components.len());
        self.components.push(component);
        id
    }

    pub fn find_component(&self, name: &str) -> Option<ComponentId> {
        self.components
            .iter()
            .position(|c| c.name == name)
            .map(ComponentId)
    }

    pub fn components_iter(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components
            .iter()
            .enumerate()
            .map(|(idx, c)| (ComponentId(idx), c))
    }

    /// Components with an empty ancestor set.
    pub fn roots(&self) -> Vec<ComponentId> {
        self.components_iter()
            .filter(|(_, c)| c.ancestors.is_empty())
            .map(|(id, _)| id)
            .collect()
    }

    /// Debug-only validation of the children/ancestors invariant.
    pub fn assert_invariants(&self) {
        if !cfg!(debug_assertions) {
            return;
        }

        for (id, component) in self.components_iter() {
            for &child in &component.children {
                debug_assert!(
                    self.component(child).ancestors.contains(&id),
                    "child missing ancestor edge"
                );
            }
            for &ancestor in &component.ancestors {
                debug_assert!(
                    self.component(ancestor).children.contains(&id),
                    "ancestor missing child edge"
                );
            }
        }

        let mut names = HashSet::new();
        for component in &self.components {
            debug_assert!(
                names.insert(component.name.as_str()),
                "duplicate component name in graph"
            );
        }
    }
}

/// A concrete, named, typed node in a deployment tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instance {
    pub name: String,
    pub channel: Option<String>,
    pub component: ComponentId,
    pub parent: Option<InstanceId>,
    pub children: Vec<InstanceId>,
    /// Overridden exports, keyed by fully-qualified exported variable name.
    pub overrides: BTreeMap<String, String>,
}

impl Instance {
    pub fn new(name: impl Into<String>, component: ComponentId) -> Self {
        Self {
            name: name.into(),
            channel: None,
            component,
            parent: None,
            children: Vec::new(),
            overrides: BTreeMap::new(),
        }
    }

    /// Final exports: component exports with overrides applied on top.
    pub fn exports(&self, graph: &Graph) -> BTreeMap<String, Option<String>> {
        let mut out = graph.component(self.component).exports.clone();
        for (name, value) in &self.overrides {
            out.insert(name.clone(), Some(value.clone()));
        }
        out
    }
}

/// The instance forest produced by one resolution.
#[derive(Clone, Debug, Default)]
pub struct Forest {
    /// Slots go `None` when duplicate collapsing removes an instance.
    pub instances: Vec<Option<Instance>>,
    pub roots: Vec<InstanceId>,
}

impl Forest {
    pub fn instance(&self, id: InstanceId) -> &Instance {
        self.instances[id.0].as_ref().expect("instance should exist")
    }

    pub fn instance_mut(&mut self, id: InstanceId) -> &mut Instance {
        self.instances[id.0].as_mut().expect("instance should exist")
    }

    /// Registers an instance and wires it into its parent (or the roots).
    pub fn push(&mut self, instance: Instance) -> InstanceId {
        let id = InstanceId(self.instances.len());
        let parent = instance.parent;
        self.instances.push(Some(instance));
        match parent {
            Some(parent) => self.instance_mut(parent).children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Detaches and removes an instance and its whole subtree.
    pub fn remove(&mut self, id: InstanceId) {
        let Some(instance) = self.instances[id.0].take() else {
            return;
        };
        match instance.parent {
            Some(parent) => {
                if let Some(p) = self.instances[parent.0].as_mut() {
                    p.children.retain(|&c| c != id);
                }
            }
            None => self.roots.retain(|&r| r != id),
        }
        for child in instance.children {
            self.remove_subtree(child);
        }
    }

    fn remove_subtree(&mut self, id: InstanceId) {
        let Some(instance) = self.instances[id.0].take() else {
            return;
        };
        for child in instance.children {
            self.remove_subtree(child);
        }
    }

    pub fn instances_iter(&self) -> impl Iterator<Item = (InstanceId, &Instance)> {
        self.instances
            .iter()
            .enumerate()
            .filter_map(|(idx, i)| i.as_ref().map(|i| (InstanceId(idx), i)))
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.instances.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.iter().all(Option::is_none)
    }

    /// Slash-joined names from root to `id`.
    pub fn path(&self, id: InstanceId) -> String {
        let mut segments = Vec::new();
        let mut cur = Some(id);
        while let Some(id) = cur {
            let instance = self.instance(id);
            segments.push(instance.name.as_str());
            cur = instance.parent;
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    /// Debug-only validation of tree shape.
    pub fn assert_invariants(&self) {
        if !cfg!(debug_assertions) {
            return;
        }

        for &root in &self.roots {
            debug_assert!(self.instance(root).parent.is_none(), "root has a parent");
        }

        for (id, instance) in self.instances_iter() {
            if let Some(parent) = instance.parent {
                debug_assert!(
                    self.instance(parent).children.contains(&id),
                    "parent missing child edge"
                );
            } else {
                debug_assert!(self.roots.contains(&id), "orphan instance not in roots");
            }

            let mut seen = HashSet::new();
            for &child in &instance.children {
                debug_assert!(seen.insert(child), "duplicate child edge");
                debug_assert_eq!(
                    self.instance(child).parent,
                    Some(id),
                    "child parent pointer mismatch"
                );
            }
        }
    }
}
