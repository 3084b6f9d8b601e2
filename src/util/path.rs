//! Path helpers

/// Expand environment variables in a path string.
///
/// Supports:
/// - `$VAR` syntax
/// - `${VAR}` syntax
/// - `~` for home directory
///
/// Falls back to the input unchanged when a variable is undefined.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_plain_path_when_expanding_then_unchanged() {
        assert_eq!(expand_env_vars("/var/lib/evtree"), "/var/lib/evtree");
    }

    #[test]
    fn given_undefined_variable_when_expanding_then_input_returned() {
        let input = "$EVTREE_SURELY_UNDEFINED_VAR/data";
        assert_eq!(expand_env_vars(input), input);
    }
}
