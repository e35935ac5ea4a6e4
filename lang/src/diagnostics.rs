use std::fmt;

use miette::Diagnostic;
use thiserror::Error;
use url::Url;

/// Where a declaration came from: file identity plus a 1-based line.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLocation {
    pub file: Url,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: Url, line: u32) -> Self {
        Self { file, line }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// Stable wire codes, kept identical across releases so tooling can match on
/// them without parsing message text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    NotAGraph,
    UnreachableFile,
    UnresolvedFacet,
    CycleInFacets,
    AlreadyDefinedFacet,
    AlreadyDefinedComponent,
    AlreadyDefinedInstance,
    NotOverriding,
    AmbiguousOverriding,
    ConflictingInferredInstance,
    AmbiguousInstaller,
    InexistentComponent,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotAGraph => "CO_NOT_A_GRAPH",
            ErrorCode::UnreachableFile => "CO_UNREACHABLE_FILE",
            ErrorCode::UnresolvedFacet => "CO_UNRESOLVED_FACET",
            ErrorCode::CycleInFacets => "CO_CYCLE_IN_FACETS",
            ErrorCode::AlreadyDefinedFacet => "CO_ALREADY_DEFINED_FACET",
            ErrorCode::AlreadyDefinedComponent => "CO_ALREADY_DEFINED_COMPONENT",
            ErrorCode::AlreadyDefinedInstance => "CO_ALREADY_DEFINED_INSTANCE",
            ErrorCode::NotOverriding => "CO_NOT_OVERRIDING",
            ErrorCode::AmbiguousOverriding => "CO_AMBIGUOUS_OVERRIDING",
            ErrorCode::ConflictingInferredInstance => "CO_CONFLICTING_INFERRED_INSTANCE",
            ErrorCode::AmbiguousInstaller => "CO_AMBIGUOUS_INSTALLER",
            ErrorCode::InexistentComponent => "CO_INEXISTENT_COMPONENT",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            ErrorCode::NotOverriding => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn join_locations(locations: &[SourceLocation]) -> String {
    locations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_names(names: &[String]) -> String {
    names.join(", ")
}

/// One diagnosable problem found during resolution.
///
/// Issues accumulate; a single pass reports every problem it can see rather
/// than stopping at the first one.
#[derive(Clone, Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum ResolutionIssue {
    #[error("`{file}` does not declare any component")]
    #[diagnostic(code(graph::not_a_graph))]
    NotAGraph { file: Url },

    #[error("imported file `{target}` could not be reached")]
    #[diagnostic(code(graph::unreachable_file))]
    UnreachableFile {
        target: String,
        location: Option<SourceLocation>,
    },

    #[error("component `{component}` declares unknown facet `{facet}`")]
    #[diagnostic(code(graph::unresolved_facet))]
    UnresolvedFacet {
        facet: String,
        component: String,
        location: SourceLocation,
    },

    #[error("facet `{facet}` extends itself (via component `{component}`)")]
    #[diagnostic(code(graph::cycle_in_facets))]
    CycleInFacets {
        facet: String,
        component: String,
        location: SourceLocation,
    },

    #[error("facet `{name}` is declared more than once: {}", join_locations(.locations))]
    #[diagnostic(code(graph::already_defined_facet))]
    AlreadyDefinedFacet {
        name: String,
        locations: Vec<SourceLocation>,
    },

    #[error("component `{name}` is declared more than once: {}", join_locations(.locations))]
    #[diagnostic(code(graph::already_defined_component))]
    AlreadyDefinedComponent {
        name: String,
        locations: Vec<SourceLocation>,
    },

    #[error("component `{component}` inherits several installers: {}", join_names(.installers))]
    #[diagnostic(code(graph::ambiguous_installer))]
    AmbiguousInstaller {
        component: String,
        installers: Vec<String>,
        location: SourceLocation,
    },

    #[error("instance `{instance}` references unknown component `{component}`")]
    #[diagnostic(code(instances::inexistent_component))]
    InexistentComponent {
        component: String,
        instance: String,
        location: SourceLocation,
    },

    #[error("`{key}` does not override any exported variable of `{instance}`")]
    #[diagnostic(code(instances::not_overriding), severity(Warning))]
    NotOverriding {
        key: String,
        instance: String,
        location: SourceLocation,
    },

    #[error("`{key}` on `{instance}` is ambiguous, candidates: {}", join_names(.candidates))]
    #[diagnostic(code(instances::ambiguous_overriding))]
    AmbiguousOverriding {
        key: String,
        instance: String,
        candidates: Vec<String>,
        location: SourceLocation,
    },

    #[error("instance path `{path}` is declared more than once")]
    #[diagnostic(code(instances::already_defined_instance))]
    AlreadyDefinedInstance {
        path: String,
        location: SourceLocation,
    },

    #[error("generated instance path `{path}` collides with another instance")]
    #[diagnostic(code(instances::conflicting_inferred_instance))]
    ConflictingInferredInstance {
        path: String,
        location: SourceLocation,
    },
}

impl ResolutionIssue {
    pub fn code(&self) -> ErrorCode {
        match self {
            ResolutionIssue::NotAGraph { .. } => ErrorCode::NotAGraph,
            ResolutionIssue::UnreachableFile { .. } => ErrorCode::UnreachableFile,
            ResolutionIssue::UnresolvedFacet { .. } => ErrorCode::UnresolvedFacet,
            ResolutionIssue::CycleInFacets { .. } => ErrorCode::CycleInFacets,
            ResolutionIssue::AlreadyDefinedFacet { .. } => ErrorCode::AlreadyDefinedFacet,
            ResolutionIssue::AlreadyDefinedComponent { .. } => ErrorCode::AlreadyDefinedComponent,
            ResolutionIssue::AmbiguousInstaller { .. } => ErrorCode::AmbiguousInstaller,
            ResolutionIssue::InexistentComponent { .. } => ErrorCode::InexistentComponent,
            ResolutionIssue::NotOverriding { .. } => ErrorCode::NotOverriding,
            ResolutionIssue::AmbiguousOverriding { .. } => ErrorCode::AmbiguousOverriding,
            ResolutionIssue::AlreadyDefinedInstance { .. } => ErrorCode::AlreadyDefinedInstance,
            ResolutionIssue::ConflictingInferredInstance { .. } => {
                ErrorCode::ConflictingInferredInstance
            }
        }
    }

    pub fn severity(&self) -> Severity {
        self.code().severity()
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            ResolutionIssue::NotAGraph { .. } => None,
            ResolutionIssue::UnreachableFile { location, .. } => location.as_ref(),
            ResolutionIssue::UnresolvedFacet { location, .. }
            | ResolutionIssue::CycleInFacets { location, .. }
            | ResolutionIssue::AmbiguousInstaller { location, .. }
            | ResolutionIssue::InexistentComponent { location, .. }
            | ResolutionIssue::NotOverriding { location, .. }
            | ResolutionIssue::AmbiguousOverriding { location, .. }
            | ResolutionIssue::AlreadyDefinedInstance { location, .. }
            | ResolutionIssue::ConflictingInferredInstance { location, .. } => Some(location),
            ResolutionIssue::AlreadyDefinedFacet { locations, .. }
            | ResolutionIssue::AlreadyDefinedComponent { locations, .. } => locations.first(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: u32) -> SourceLocation {
        SourceLocation::new(Url::parse("file:///app.graph").unwrap(), line)
    }

    #[test]
    fn codes_render_stable_strings() {
        assert_eq!(ErrorCode::NotAGraph.as_str(), "CO_NOT_A_GRAPH");
        assert_eq!(
            ErrorCode::ConflictingInferredInstance.as_str(),
            "CO_CONFLICTING_INFERRED_INSTANCE"
        );
        assert_eq!(ErrorCode::NotOverriding.to_string(), "CO_NOT_OVERRIDING");
    }

    #[test]
    fn only_not_overriding_is_a_warning() {
        assert_eq!(ErrorCode::NotOverriding.severity(), Severity::Warning);
        assert_eq!(ErrorCode::AmbiguousOverriding.severity(), Severity::Error);
        assert_eq!(ErrorCode::UnreachableFile.severity(), Severity::Error);
    }

    #[test]
    fn duplicate_component_lists_every_location() {
        let issue = ResolutionIssue::AlreadyDefinedComponent {
            name: "VM".to_string(),
            locations: vec![loc(3), loc(17)],
        };
        let text = issue.to_string();
        assert!(text.contains("file:///app.graph:3"));
        assert!(text.contains("file:///app.graph:17"));
        assert_eq!(issue.location(), Some(&loc(3)));
    }
}
