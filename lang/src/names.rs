/// Split a qualified variable name at its first `.` into `(prefix, local)`.
///
/// `Tomcat.ip` splits into `("Tomcat", "ip")`. A name without a dot has no
/// prefix and is returned whole as the local part.
pub fn split_variable(name: &str) -> (Option<&str>, &str) {
    match name.split_once('.') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Qualify a variable name declared by `owner` (a component or facet).
///
/// Names that already carry a prefix are kept as-is, so a component can
/// redeclare a facet variable with a new default value.
pub fn qualify_variable(owner: &str, name: &str) -> String {
    if name.contains('.') {
        name.to_string()
    } else {
        format!("{owner}.{name}")
    }
}
