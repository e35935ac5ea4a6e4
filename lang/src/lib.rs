//! Declaration block model for the Roboconf DSLs.
//!
//! The lexer/parser lives elsewhere; this crate defines what it produces:
//! position-tracked, typed blocks per file kind. Reserved instance keys
//! (`name`, `channel`, `count`) are fields of [`InstanceBlock`]; everything
//! else an instance declares lands in the override fallback bucket.

mod diagnostics;
mod names;

use url::Url;

pub use diagnostics::{ErrorCode, ResolutionIssue, Severity, SourceLocation};
pub use names::{qualify_variable, split_variable};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Graph,
    Instances,
}

/// One parsed declaration file: its identity, kind, imports and blocks.
#[derive(Clone, Debug)]
pub struct FileDeclaration {
    pub source: Url,
    pub kind: FileKind,
    pub imports: Vec<ImportBlock>,
    pub components: Vec<ComponentBlock>,
    pub facets: Vec<FacetBlock>,
    pub instances: Vec<InstanceBlock>,
}

impl FileDeclaration {
    pub fn graph(source: Url) -> Self {
        Self {
            source,
            kind: FileKind::Graph,
            imports: Vec::new(),
            components: Vec::new(),
            facets: Vec::new(),
            instances: Vec::new(),
        }
    }

    pub fn instances(source: Url) -> Self {
        Self {
            source,
            kind: FileKind::Instances,
            imports: Vec::new(),
            components: Vec::new(),
            facets: Vec::new(),
            instances: Vec::new(),
        }
    }

    pub fn location(&self, line: u32) -> SourceLocation {
        SourceLocation::new(self.source.clone(), line)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportBlock {
    /// Relative or absolute URL text, resolved against the declaring file.
    pub target: String,
    pub line: u32,
}

/// An exported variable as declared: a local name and an optional default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportDecl {
    pub name: String,
    pub value: Option<String>,
}

impl ExportDecl {
    pub fn new(name: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            name: name.into(),
            value: value.map(str::to_string),
        }
    }
}

/// An imported variable reference, always fully qualified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedVar {
    pub name: String,
    pub optional: bool,
}

#[derive(Clone, Debug)]
pub struct ComponentBlock {
    pub name: String,
    pub line: u32,
    pub installer: Option<String>,
    pub alias: Option<String>,
    pub icon: Option<String>,
    pub facets: Vec<String>,
    pub children: Vec<String>,
    pub exports: Vec<ExportDecl>,
    pub imports: Vec<ImportedVar>,
}

impl ComponentBlock {
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        Self {
            name: name.into(),
            line,
            installer: None,
            alias: None,
            icon: None,
            facets: Vec::new(),
            children: Vec::new(),
            exports: Vec::new(),
            imports: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FacetBlock {
    pub name: String,
    pub line: u32,
    pub extends: Vec<String>,
    pub exports: Vec<ExportDecl>,
    /// Hints merged into adopting components.
    pub installer: Option<String>,
    pub icon: Option<String>,
    pub children: Vec<String>,
}

impl FacetBlock {
    pub fn new(name: impl Into<String>, line: u32) -> Self {
        Self {
            name: name.into(),
            line,
            extends: Vec::new(),
            exports: Vec::new(),
            installer: None,
            icon: None,
            children: Vec::new(),
        }
    }
}

/// The `count` reserved key, with its optional zero-padding hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Count {
    pub value: u32,
    pub pad_width: Option<usize>,
}

impl Count {
    pub fn new(value: u32) -> Self {
        Self {
            value,
            pad_width: None,
        }
    }

    pub fn padded(value: u32, pad_width: usize) -> Self {
        Self {
            value,
            pad_width: Some(pad_width),
        }
    }
}

/// A non-reserved instance property: an export-override candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverrideDecl {
    pub name: String,
    pub value: String,
    pub line: u32,
}

#[derive(Clone, Debug)]
pub struct InstanceBlock {
    pub component: String,
    pub name: String,
    pub line: u32,
    pub channel: Option<String>,
    pub count: Option<Count>,
    /// Declaration order is preserved; later overrides of the same resolved
    /// key win.
    pub overrides: Vec<OverrideDecl>,
    pub children: Vec<InstanceBlock>,
}

impl InstanceBlock {
    pub fn new(component: impl Into<String>, name: impl Into<String>, line: u32) -> Self {
        Self {
            component: component.into(),
            name: name.into(),
            line,
            channel: None,
            count: None,
            overrides: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_override(mut self, name: &str, value: &str, line: u32) -> Self {
        self.overrides.push(OverrideDecl {
            name: name.to_string(),
            value: value.to_string(),
            line,
        });
        self
    }

    pub fn with_child(mut self, child: InstanceBlock) -> Self {
        self.children.push(child);
        self
    }
}
