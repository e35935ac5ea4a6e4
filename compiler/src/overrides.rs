//! Export-override resolution for instance declarations.

use roboconf_lang::split_variable;
use roboconf_model::Component;

/// What an override key resolved to against a component's export table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverrideOutcome {
    /// Exactly one exported variable matches; holds the qualified name.
    Applied(String),
    /// No exported variable matches the key.
    NotOverriding,
    /// Several exported variables share the key's simple name.
    Ambiguous(Vec<String>),
}

/// Resolves an override key against a component's exports.
///
/// An exact (fully-qualified) match always wins. A simple (dot-free) key
/// is matched against the simple part of every export; zero matches is a
/// no-op warning, several is an ambiguity. A qualified key that matched
/// nothing exactly names a foreign variable and never falls back to
/// suffix matching.
pub fn resolve_override(component: &Component, key: &str) -> OverrideOutcome {
    if component.exports.contains_key(key) {
        return OverrideOutcome::Applied(key.to_string());
    }
    if key.contains('.') {
        return OverrideOutcome::NotOverriding;
    }

    let candidates: Vec<String> = component
        .exports
        .keys()
        .filter(|export| split_variable(export).1 == key)
        .cloned()
        .collect();

    match candidates.len() {
        0 => OverrideOutcome::NotOverriding,
        1 => OverrideOutcome::Applied(candidates.into_iter().next().expect("one candidate")),
        _ => OverrideOutcome::Ambiguous(candidates),
    }
}
