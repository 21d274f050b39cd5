use std::env;
use std::str::FromStr;
use tracing::warn;

/// Retrieves an environment variable and parses it, falling back to `default`
/// when the variable is unset or cannot be parsed.
///
/// # Arguments
/// - `var`: The name of the environment variable.
/// - `default`: The value to use when the variable is missing or malformed.
///
/// # Returns
/// - The parsed value or `default`.
pub fn get_env_var_or<T>(var: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring malformed {}={:?}, using default {}", var, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

/// Retrieves a string environment variable, falling back to `default` when it
/// is unset or empty.
pub fn get_env_string_or(var: &str, default: &str) -> String {
    env::var(var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_var_uses_default() {
        assert_eq!(get_env_var_or("WIKIBRIEF_TEST_UNSET_VAR", 42usize), 42);
        assert_eq!(
            get_env_string_or("WIKIBRIEF_TEST_UNSET_STRING", "models"),
            "models"
        );
    }

    #[test]
    fn test_malformed_var_uses_default() {
        env::set_var("WIKIBRIEF_TEST_MALFORMED", "not-a-number");
        assert_eq!(get_env_var_or("WIKIBRIEF_TEST_MALFORMED", 1.5f64), 1.5);
        env::set_var("WIKIBRIEF_TEST_PARSED", " 7 ");
        assert_eq!(get_env_var_or("WIKIBRIEF_TEST_PARSED", 0u32), 7);
    }
}
