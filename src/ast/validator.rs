use crate::error::Violation;
use crate::functions::UserFunctions;
use crate::Variables;

/// True when `name` matches `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Checks caller-supplied names and functions, independent of any expression.
///
/// Violations are ordered variables first, then functions, each sorted by name.
pub fn check_bindings(variables: &Variables, user_functions: &UserFunctions) -> Vec<Violation> {
    let mut violations = Vec::new();

    let mut variable_names: Vec<&String> = variables.keys().collect();
    variable_names.sort();
    violations.extend(
        variable_names
            .into_iter()
            .filter(|name| !is_identifier(name))
            .map(|name| Violation::InvalidVariableName(name.clone())),
    );

    let mut functions: Vec<_> = user_functions.iter().collect();
    functions.sort_by(|a, b| a.0.cmp(b.0));
    for (name, function) in functions {
        if !is_identifier(name) {
            violations.push(Violation::InvalidFunctionName(name.clone()));
        }
        if let Some(reason) = function.invocation_problem() {
            violations.push(Violation::NotInvocable {
                name: name.clone(),
                reason,
            });
        }
    }

    violations
}
