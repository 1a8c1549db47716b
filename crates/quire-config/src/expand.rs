//! Environment variable expansion for configuration strings.
//!
//! Supports:
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use crate::ConfigError;

/// Expand `${VAR}` references in the value of config field `field`.
///
/// Bare `$VAR` is left alone. Values without `${` are returned as is.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    match shellexpand::env_with_context(value, lookup) {
        Ok(expanded) => Ok(expanded.into_owned()),
        Err(err) => Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", err.cause),
        }),
    }
}

/// Unset variables fail with their name unless a `:-default` is given.
fn lookup(name: &str) -> Result<Option<String>, String> {
    std::env::var(name).map(Some).map_err(|_| name.to_owned())
}
