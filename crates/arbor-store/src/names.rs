//! Store name validation and qualified names.
//!
//! Declared child names double as lookup keys, and dotted paths such as
//! `"D.S"` are split on the configured separator. A name therefore must:
//! - Be non-empty
//! - Not contain whitespace
//! - Not contain the path separator

use crate::error::{StoreError, StoreResult};

/// Validate a declared child name against the tree's path separator.
///
/// # Examples
///
/// ```
/// use arbor_store::names::validate_store_name;
///
/// assert!(validate_store_name("todos", '.').is_ok());
/// assert!(validate_store_name("", '.').is_err());
/// assert!(validate_store_name("a.b", '.').is_err());
/// ```
pub fn validate_store_name(name: &str, separator: char) -> StoreResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "store name must not be empty".into()));
    }
    if let Some(ch) = name.chars().find(|c| c.is_whitespace()) {
        return Err(invalid(name, format!("contains whitespace: {ch:?}")));
    }
    if name.contains(separator) {
        return Err(invalid(name, format!("contains the path separator {separator:?}")));
    }
    Ok(())
}

/// Join path segments into a qualified name.
pub fn qualify<S: AsRef<str>>(segments: &[S], separator: char) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        out.push_str(segment.as_ref());
    }
    out
}

fn invalid(name: &str, reason: String) -> StoreError {
    StoreError::InvalidName {
        name: name.to_string(),
        reason,
    }
}
