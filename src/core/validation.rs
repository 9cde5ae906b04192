//! Input validation for envsec operations.
//!
//! Validates secret names, values, and `NAME=VALUE` arguments before any
//! store is touched. Shared by every backend.

use std::collections::BTreeMap;
use std::path::Path;

use crate::core::constants::{NAME_PATTERN, PARAMETER_VALUE_MAX_LEN, RESERVED_PREFIX};
use crate::error::{Result, ValidationError};

/// Validate a secret name.
///
/// Names must match `^[a-zA-Z_][a-zA-Z0-9_]*` and must not start with the
/// reserved `jetpack_` prefix in any letter case.
///
/// # Errors
///
/// Returns `ValidationError` if the name is invalid.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName.into());
    }

    let reserved = name
        .get(..RESERVED_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(RESERVED_PREFIX));
    if reserved {
        return Err(ValidationError::ReservedPrefix(name.to_string()).into());
    }

    let mut chars = name.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
            pattern: NAME_PATTERN,
        }
        .into());
    }

    Ok(())
}

/// Validate every name, failing on the first invalid one.
pub fn validate_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<()> {
    names.into_iter().try_for_each(validate_name)
}

/// Validate that a value fits in a single parameter.
///
/// # Errors
///
/// Returns `ValidationError::ValueTooLarge` above 4096 bytes.
pub fn validate_value_size(name: &str, value: &str) -> Result<()> {
    if value.len() > PARAMETER_VALUE_MAX_LEN {
        return Err(ValidationError::ValueTooLarge {
            name: name.to_string(),
            size: value.len(),
            max: PARAMETER_VALUE_MAX_LEN,
        }
        .into());
    }
    Ok(())
}

/// Check that every argument has the `NAME=VALUE` shape.
pub fn validate_set_args(args: &[String]) -> Result<()> {
    for arg in args {
        match arg.split_once('=') {
            Some((name, _)) if !name.is_empty() => {}
            _ => return Err(ValidationError::MalformedSetArg(arg.clone()).into()),
        }
    }
    Ok(())
}

/// Parse `NAME=VALUE` arguments into a map.
///
/// A value of `@path` is replaced by the contents of that file; `\@` keeps
/// a literal leading `@`. Later arguments win on duplicate names.
///
/// # Errors
///
/// Returns `ValidationError` for malformed arguments or missing files.
pub fn parse_set_args(args: &[String]) -> Result<BTreeMap<String, String>> {
    validate_set_args(args)?;

    let mut values = BTreeMap::new();
    for arg in args {
        let (name, raw) = arg
            .split_once('=')
            .ok_or_else(|| ValidationError::MalformedSetArg(arg.clone()))?;

        let value = if let Some(escaped) = raw.strip_prefix("\\@") {
            format!("@{}", escaped)
        } else if let Some(file) = raw.strip_prefix('@') {
            if !Path::new(file).is_file() {
                return Err(ValidationError::MissingValueFile {
                    name: name.to_string(),
                    file: file.to_string(),
                }
                .into());
            }
            std::fs::read_to_string(file)?
        } else {
            raw.to_string()
        };

        values.insert(name.to_string(), value);
    }
    Ok(values)
}
